//! Exporter traits and types
//!
//! This module defines the trait interface for record exporters and the
//! errors they report.

use crate::config::ExportFormat;
use crate::extract::ProductRecord;
use std::io::Write;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for record exporters
///
/// An exporter turns a batch of records into one serialized document. It
/// does not decide where that document goes; see [`crate::output::export_records`].
pub trait RecordExporter {
    /// The format this exporter produces
    fn format(&self) -> ExportFormat;

    /// Serializes `records` into `out`
    ///
    /// # Arguments
    ///
    /// * `records` - The records to export, in order
    /// * `out` - Destination of the serialized document
    fn write_records(&self, records: &[ProductRecord], out: &mut dyn Write) -> OutputResult<()>;

    /// Whether an empty batch still produces a document
    fn exports_empty(&self) -> bool {
        true
    }
}
