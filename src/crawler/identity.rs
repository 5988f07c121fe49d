//! Client identity rotation
//!
//! Every attempt presents itself as a regular desktop browser. The user agent
//! is drawn uniformly, with replacement, from a fixed pool; the remaining
//! headers are the static set a browser sends on a top-level navigation.

use crate::crawler::random::SharedRng;
use rand::seq::IndexedRandom;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION,
    UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};

/// Browser signatures the rotator chooses from
pub const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

const ACCEPT_VALUE: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.5";
const ACCEPT_ENCODING_VALUE: &str = "gzip, deflate";

/// One client identity: the user agent plus the full header bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    user_agent: &'static str,
}

impl Identity {
    /// The user agent string of this identity
    pub fn user_agent(&self) -> &'static str {
        self.user_agent
    }

    /// Builds the request headers for this identity
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(self.user_agent));
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static(ACCEPT_ENCODING_VALUE));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        headers
    }
}

/// Produces a fresh identity per request attempt
#[derive(Debug, Clone)]
pub struct IdentityRotator {
    pool: &'static [&'static str],
    rng: SharedRng,
}

impl IdentityRotator {
    /// Creates a rotator over the built-in browser pool
    pub fn new(rng: SharedRng) -> Self {
        Self {
            pool: &USER_AGENTS,
            rng,
        }
    }

    /// The user agents this rotator draws from
    pub fn pool(&self) -> &'static [&'static str] {
        self.pool
    }

    /// Draws the identity for the next attempt
    ///
    /// Each call is an independent uniform draw; consecutive attempts may
    /// repeat the same user agent.
    pub fn next_identity(&self) -> Identity {
        let mut rng = self.rng.lock();
        let user_agent = self.pool.choose(&mut *rng).copied().unwrap_or(USER_AGENTS[0]);
        Identity { user_agent }
    }
}
