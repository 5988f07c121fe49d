//! Tabular (CSV) export
//!
//! One row per record, one column per key present in any record of the batch.
//! Multi-valued fields are flattened into a single cell.

use crate::config::ExportFormat;
use crate::extract::{ProductRecord, RecordKey};
use crate::output::traits::{OutputResult, RecordExporter};
use chrono::SecondsFormat;
use csv::WriterBuilder;
use std::io::Write;

/// Joins the image URLs of a record in one cell
pub const IMAGE_SEPARATOR: &str = ", ";

/// Joins the feature bullets of a record in one cell
pub const FEATURE_SEPARATOR: &str = " | ";

/// Writes records as comma-separated values with a header row
///
/// Cells are quoted only when they contain the delimiter, a quote or a line
/// break.
#[derive(Debug, Clone, Copy)]
pub struct CsvExporter {
    delimiter: u8,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvExporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordExporter for CsvExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn write_records(&self, records: &[ProductRecord], out: &mut dyn Write) -> OutputResult<()> {
        let columns = header_keys(records);
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(out);

        writer.write_record(columns.iter().map(|key| key.name()))?;
        for record in records {
            writer.write_record(columns.iter().map(|key| cell(record, *key)))?;
        }

        writer.flush()?;
        Ok(())
    }

    fn exports_empty(&self) -> bool {
        false
    }
}

/// Union of the keys present across `records`, in canonical order
pub fn header_keys(records: &[ProductRecord]) -> Vec<RecordKey> {
    RecordKey::ALL
        .into_iter()
        .filter(|key| records.iter().any(|record| record.has(*key)))
        .collect()
}

/// Flattens one field of a record into a cell; absent fields are empty
pub fn cell(record: &ProductRecord, key: RecordKey) -> String {
    let text = |value: Option<&str>| value.unwrap_or_default().to_string();

    match key {
        RecordKey::Asin => text(record.identifier()),
        RecordKey::Url => record.source_url().to_string(),
        RecordKey::Title => text(record.title()),
        RecordKey::Price => text(record.price()),
        RecordKey::Rating => text(record.rating()),
        RecordKey::RatingCount => text(record.rating_count()),
        RecordKey::Availability => text(record.availability()),
        RecordKey::Images => record
            .images()
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(IMAGE_SEPARATOR),
        RecordKey::Features => record.features().join(FEATURE_SEPARATOR),
        RecordKey::Description => text(record.description()),
        RecordKey::ScrapedAt => record
            .fetched_at()
            .to_rfc3339_opts(SecondsFormat::AutoSi, true),
    }
}
