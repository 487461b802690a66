//! Export trait and shared types

use async_trait::async_trait;
use indexmap::IndexSet;
use propdesk_core::{Record, RecordId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors during export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid export filename: {0}")]
    InvalidFilename(String),

    #[error("Export failed: {0}")]
    Failed(String),
}

/// Output format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    Starting,
    Writing,
    Complete,
}

/// Export progress information
#[derive(Debug, Clone, PartialEq)]
pub struct ExportProgress {
    pub phase: ExportPhase,
    pub rows_exported: usize,
    pub total_rows: usize,
    pub message: String,
}

impl ExportProgress {
    /// Share of rows written, 0..=100
    pub fn percent(&self) -> u8 {
        if self.total_rows == 0 {
            return if self.phase == ExportPhase::Complete { 100 } else { 0 };
        }
        ((self.rows_exported.min(self.total_rows) * 100) / self.total_rows) as u8
    }
}

/// Progress sink handed to exporters
pub type ExportProgressFn<'a> = dyn Fn(ExportProgress) + Send + Sync + 'a;

/// A record that could not be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    pub id: RecordId,
    pub message: String,
}

/// Result of an export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportReport {
    /// Where the output went, when it was written to a file
    pub path: Option<PathBuf>,
    pub rows_written: usize,
    pub failures: Vec<RowFailure>,
}

impl ExportReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty() && self.rows_written > 0
    }
}

/// Serializes records somewhere (a file, a download, a clipboard)
#[async_trait]
pub trait RecordExporter: Send + Sync {
    /// Export `items`. `filename` of `None` lets the exporter choose one.
    async fn export(
        &self,
        items: &[Record],
        filename: Option<&str>,
        format: ExportFormat,
        on_progress: &ExportProgressFn<'_>,
    ) -> Result<ExportReport, ExportError>;
}

/// Union of all field names, in order of first appearance
pub fn column_order(items: &[Record]) -> Vec<String> {
    let mut columns: IndexSet<&str> = IndexSet::new();
    for record in items {
        columns.extend(record.field_names());
    }
    columns.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_column_order_union() {
        let items = vec![
            Record::new(1).with_field("id", 1i64).with_field("name", "a"),
            Record::new(2)
                .with_field("id", 2i64)
                .with_field("city", "Bern")
                .with_field("name", "b"),
        ];
        assert_eq!(column_order(&items), vec!["id", "name", "city"]);
    }

    #[test]
    fn test_progress_percent() {
        let progress = ExportProgress {
            phase: ExportPhase::Writing,
            rows_exported: 50,
            total_rows: 200,
            message: String::new(),
        };
        assert_eq!(progress.percent(), 25);

        let empty_done = ExportProgress {
            phase: ExportPhase::Complete,
            rows_exported: 0,
            total_rows: 0,
            message: String::new(),
        };
        assert_eq!(empty_done.percent(), 100);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ExportFormat::parse("CSV"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::parse("xlsx"), None);
        assert_eq!(ExportFormat::Json.to_string(), "json");
    }
}
