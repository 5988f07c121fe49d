/// Tracks the state of one origin during a scrape
///
/// This structure holds what the fetcher needs to honor the pacing rule
/// (never two requests to the same origin without a scheduled delay in
/// between) plus counters reported in the run statistics.
#[derive(Debug, Clone, Default)]
pub struct OriginState {
    /// Number of requests issued to this origin
    pub request_count: u32,

    /// A request was issued since the last scheduled delay
    pub awaiting_delay: bool,

    /// Number of anti-bot pages served by this origin
    pub blocked_count: u32,
}

impl OriginState {
    /// Creates a new OriginState with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a scheduled delay must run before the next request
    pub fn needs_delay(&self) -> bool {
        self.awaiting_delay
    }

    /// Records that a request was issued to this origin
    pub fn record_request(&mut self) {
        self.request_count += 1;
        self.awaiting_delay = true;
    }

    /// Records that a scheduled delay has elapsed for this origin
    pub fn record_delay(&mut self) {
        self.awaiting_delay = false;
    }

    /// Records that this origin served an anti-bot page
    pub fn record_block(&mut self) {
        self.blocked_count += 1;
    }
}
