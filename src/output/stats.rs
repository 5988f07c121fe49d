//! Statistics of a scraping run
//!
//! This module provides the counters collected while a run progresses and
//! their display at the end of the run.

use crate::crawler::{FetchResult, FetchStatus};
use crate::extract::{Field, ProductRecord, RecordKey};
use std::collections::BTreeMap;

/// Scraping run statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Number of product URLs a fetch was started for
    pub urls_attempted: u64,

    /// Number of records assembled
    pub records_assembled: u64,

    /// Fetches that spent their whole attempt budget
    pub fetches_exhausted: u64,

    /// Fetches abandoned after repeated block pages
    pub fetches_blocked: u64,

    /// Request attempts across all fetches
    pub total_attempts: u64,

    /// Number of records carrying each field
    pub field_hits: BTreeMap<Field, u64>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one product fetch
    pub fn record_fetch(&mut self, fetch: &FetchResult) {
        self.urls_attempted += 1;
        self.total_attempts += u64::from(fetch.attempts_used());

        match fetch.status() {
            FetchStatus::Exhausted => self.fetches_exhausted += 1,
            FetchStatus::Blocked => self.fetches_blocked += 1,
            FetchStatus::Success | FetchStatus::Cancelled => {}
        }
    }

    /// Records an assembled product record and the fields it carries
    pub fn record_product(&mut self, record: &ProductRecord) {
        self.records_assembled += 1;

        for field in Field::ALL {
            if record.has(record_key(field)) {
                *self.field_hits.entry(field).or_insert(0) += 1;
            }
        }
    }

    /// Number of records carrying `field`
    pub fn hits(&self, field: Field) -> u64 {
        self.field_hits.get(&field).copied().unwrap_or(0)
    }

    /// Fetches that ended without a page
    pub fn fetch_failures(&self) -> u64 {
        self.fetches_exhausted + self.fetches_blocked
    }

    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.urls_attempted == 0 {
            return 0.0;
        }
        (self.records_assembled as f64 / self.urls_attempted as f64) * 100.0
    }
}

fn record_key(field: Field) -> RecordKey {
    match field {
        Field::Title => RecordKey::Title,
        Field::Price => RecordKey::Price,
        Field::Rating => RecordKey::Rating,
        Field::RatingCount => RecordKey::RatingCount,
        Field::Availability => RecordKey::Availability,
        Field::Images => RecordKey::Images,
        Field::Features => RecordKey::Features,
        Field::Description => RecordKey::Description,
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Run Statistics ===\n");

    println!("Overview:");
    println!("  Product URLs attempted: {}", stats.urls_attempted);
    println!("  Records assembled: {}", stats.records_assembled);
    println!("  Request attempts: {}", stats.total_attempts);
    println!();

    if stats.fetch_failures() > 0 {
        println!("Fetch Failures:");
        println!("  Exhausted: {}", stats.fetches_exhausted);
        println!("  Blocked: {}", stats.fetches_blocked);
        println!();
    }

    if stats.records_assembled > 0 {
        println!("Field Coverage:");
        for field in Field::ALL {
            let hits = stats.hits(field);
            let percentage = (hits as f64 / stats.records_assembled as f64) * 100.0;
            println!("  {}: {} ({:.1}%)", field.key(), hits, percentage);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} products scraped)",
        stats.success_rate(),
        stats.records_assembled,
        stats.urls_attempted
    );
}
