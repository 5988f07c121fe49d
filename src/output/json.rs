use crate::config::ExportFormat;
use crate::extract::ProductRecord;
use crate::output::traits::{OutputResult, RecordExporter};
use std::io::Write;

/// Writes records as a pretty-printed JSON array
///
/// Absent fields are omitted from each object; non-ASCII text is written as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter;

impl JsonExporter {
    pub fn new() -> Self {
        Self
    }
}

impl RecordExporter for JsonExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn write_records(&self, records: &[ProductRecord], out: &mut dyn Write) -> OutputResult<()> {
        serde_json::to_writer_pretty(&mut *out, records)?;
        writeln!(out)?;
        Ok(())
    }
}
