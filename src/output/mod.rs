//! Output module for exporting scraped records
//!
//! This module handles:
//! - Exporting records as CSV and JSON files
//! - Recording and displaying run statistics

mod json;
pub mod stats;
mod tabular;
mod traits;

pub use json::JsonExporter;
pub use stats::{print_statistics, RunStatistics};
pub use tabular::{header_keys, CsvExporter, FEATURE_SEPARATOR, IMAGE_SEPARATOR};
pub use traits::{OutputError, OutputResult, RecordExporter};

use crate::config::ExportFormat;
use crate::extract::ProductRecord;
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Returns the exporter for a format
pub fn exporter_for(format: ExportFormat) -> Box<dyn RecordExporter> {
    match format {
        ExportFormat::Csv => Box::new(CsvExporter::new()),
        ExportFormat::Json => Box::new(JsonExporter::new()),
    }
}

/// Default export file name, e.g. `catalog_products_20240501_123000.csv`
pub fn default_file_name(format: ExportFormat, at: DateTime<Local>) -> String {
    format!(
        "catalog_products_{}.{}",
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Writes `records` to `path` in the exporter's format
///
/// # Returns
///
/// * `Ok(true)` - The file was written
/// * `Ok(false)` - Nothing to export in this format; no file was created
/// * `Err(OutputError)` - The file could not be written
pub fn export_to_path(
    exporter: &dyn RecordExporter,
    records: &[ProductRecord],
    path: &Path,
) -> OutputResult<bool> {
    if records.is_empty() && !exporter.exports_empty() {
        tracing::warn!(
            format = exporter.format().extension(),
            "No data to export to {}",
            path.display()
        );
        return Ok(false);
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    exporter.write_records(records, &mut writer)?;
    writer.flush()?;

    tracing::info!(
        records = records.len(),
        "Data exported to {}",
        path.display()
    );
    Ok(true)
}

/// Exports `records` once per format into `directory`
///
/// The directory is created if needed. All formats share one timestamp.
///
/// # Returns
///
/// The paths of the files that were written
pub fn export_records(
    records: &[ProductRecord],
    directory: &Path,
    formats: &[ExportFormat],
) -> OutputResult<Vec<PathBuf>> {
    std::fs::create_dir_all(directory)?;

    let now = Local::now();
    let mut written = Vec::new();

    for format in formats {
        let path = directory.join(default_file_name(*format, now));
        if export_to_path(exporter_for(*format).as_ref(), records, &path)? {
            written.push(path);
        }
    }

    Ok(written)
}
