//! Configuration module for Catalog-Scout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; a missing section falls back to the defaults
//! (1 to 3 second delays, 3 attempts, 10 second timeout).
//!
//! # Example
//!
//! ```no_run
//! use catalog_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scout.toml")).unwrap();
//! println!("Attempts per URL: {}", config.fetch.max_retries);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CatalogConfig, Config, ExportFormat, FetchConfig, OutputConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};

pub use validation::{validate, validate_fetch_config, MAX_DELAY_SECS};
