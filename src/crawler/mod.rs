//! Crawler module for resilient page fetching and run coordination
//!
//! This module contains the fetching side of the scraper, including:
//! - Browser identity rotation
//! - Randomized backoff between requests
//! - HTTP fetching with retry logic and block detection
//! - Search listing parsing and pagination
//! - Overall run coordination

mod coordinator;
mod fetcher;
mod identity;
mod parser;
mod random;
mod scheduler;
mod walker;

pub use coordinator::{ScrapeReport, Scraper};
pub use fetcher::{
    build_http_client, detect_block, FetchError, FetchResult, FetchStatus, Fetcher, BLOCK_MARKERS,
};
pub use identity::{Identity, IdentityRotator, USER_AGENTS};
pub use parser::{parse_listing, ListingPage};
pub use random::SharedRng;
pub use scheduler::BackoffScheduler;
pub use walker::ListingWalker;
