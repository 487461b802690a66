//! JSON export

use propdesk_core::Record;
use std::io::Write;

use crate::exporter::{ExportError, ExportPhase, ExportProgress, ExportProgressFn, ExportReport};

/// Writes records as a JSON array of objects, fields in payload order
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter {
    pub pretty: bool,
}

impl JsonExporter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn write_to<W: Write>(
        &self,
        items: &[Record],
        writer: &mut W,
        on_progress: &ExportProgressFn<'_>,
    ) -> Result<ExportReport, ExportError> {
        let total_rows = items.len();
        on_progress(ExportProgress {
            phase: ExportPhase::Starting,
            rows_exported: 0,
            total_rows,
            message: format!("Exporting {} rows as JSON", total_rows),
        });

        let rows: Vec<serde_json::Value> = items.iter().map(Record::to_json).collect();
        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &rows)?;
        } else {
            serde_json::to_writer(&mut *writer, &rows)?;
        }
        writer.flush()?;

        on_progress(ExportProgress {
            phase: ExportPhase::Complete,
            rows_exported: total_rows,
            total_rows,
            message: format!("Exported {} rows", total_rows),
        });

        Ok(ExportReport {
            path: None,
            rows_written: total_rows,
            failures: Vec::new(),
        })
    }
}
