//! Record export
//!
//! The bulk export action hands the selected records to a [`RecordExporter`]
//! and only sees success, failure and progress. This crate provides the
//! trait plus CSV and JSON writers and a [`FileExporter`] that routes by
//! format and writes into an output directory.

mod csv_export;
mod exporter;
mod file_export;
mod json_export;

pub use csv_export::{CsvExporter, CsvOptions, FieldDelimiter, RecordDelimiter, TextQualifier};
pub use exporter::{
    ExportError, ExportFormat, ExportPhase, ExportProgress, ExportProgressFn, ExportReport,
    RecordExporter, RowFailure, column_order,
};
pub use file_export::FileExporter;
pub use json_export::JsonExporter;
