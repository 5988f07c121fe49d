//! Record assembly
//!
//! Turns the body of a successful fetch into a [`ProductRecord`]: the page is
//! parsed once, every field rule runs against that single document, and the
//! item identifier is taken from the page URL.

use crate::crawler::FetchResult;
use crate::extract::fields::extract_fields;
use crate::extract::record::ProductRecord;
use crate::url::extract_identifier;
use chrono::Utc;
use scraper::Html;

/// Builds product records from fetched pages
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordAssembler;

impl RecordAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Assembles the record of a fetched product page
    ///
    /// # Returns
    ///
    /// * `Some(ProductRecord)` - The fetch succeeded
    /// * `None` - The fetch failed, so there is nothing to assemble
    pub fn assemble(&self, url: &str, fetch: &FetchResult) -> Option<ProductRecord> {
        let body = fetch.body()?;
        Some(self.assemble_document(url, body))
    }

    /// Assembles a record from raw page markup
    pub fn assemble_document(&self, url: &str, body: &str) -> ProductRecord {
        let document = Html::parse_document(body);
        let fields = extract_fields(&document, body);
        let record = ProductRecord::new(extract_identifier(url), url, Utc::now(), fields);

        tracing::info!(
            url,
            asin = record.identifier().unwrap_or("-"),
            "Successfully scraped product: {}",
            record.title().unwrap_or("Unknown")
        );

        record
    }
}
