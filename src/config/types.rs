use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Catalog-Scout
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub catalog: CatalogConfig,
    pub output: OutputConfig,
}

/// Request pacing and retry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Lower bound of the randomized delay between requests (seconds)
    #[serde(rename = "delay-min-secs")]
    pub delay_min_secs: f64,

    /// Upper bound of the randomized delay between requests (seconds)
    #[serde(rename = "delay-max-secs")]
    pub delay_max_secs: f64,

    /// Attempt budget for one logical fetch
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Timeout applied to every single request (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Stop a fetch early after this many block pages in a row
    #[serde(rename = "max-consecutive-blocks")]
    pub max_consecutive_blocks: Option<u32>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            delay_min_secs: 1.0,
            delay_max_secs: 3.0,
            max_retries: 3,
            request_timeout_secs: 10,
            max_consecutive_blocks: None,
        }
    }
}

impl FetchConfig {
    /// Returns the `(min, max)` delay range in seconds
    pub fn delay_range(&self) -> (f64, f64) {
        (self.delay_min_secs, self.delay_max_secs)
    }

    /// Returns the per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Target catalog configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Site root used to build search URLs and resolve relative item links
    #[serde(rename = "base-url")]
    pub base_url: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.amazon.com".to_string(),
        }
    }
}

/// Export format of the scraped records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// File extension used for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory where export files are written
    pub directory: String,

    /// Formats to export after a run
    pub formats: Vec<ExportFormat>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
            formats: vec![ExportFormat::Csv, ExportFormat::Json],
        }
    }
}
