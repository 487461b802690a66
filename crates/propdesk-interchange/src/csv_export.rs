//! CSV export

use propdesk_core::Record;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::exporter::{
    ExportError, ExportPhase, ExportProgress, ExportProgressFn, ExportReport, RowFailure,
    column_order,
};

/// Rows between progress reports
const PROGRESS_EVERY_ROWS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FieldDelimiter {
    #[default]
    Comma,
    Tab,
    Semicolon,
    Pipe,
}

impl FieldDelimiter {
    pub fn as_char(&self) -> char {
        match self {
            FieldDelimiter::Comma => ',',
            FieldDelimiter::Tab => '\t',
            FieldDelimiter::Semicolon => ';',
            FieldDelimiter::Pipe => '|',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecordDelimiter {
    #[default]
    CrLf,
    Lf,
}

impl RecordDelimiter {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordDelimiter::CrLf => "\r\n",
            RecordDelimiter::Lf => "\n",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextQualifier {
    #[default]
    DoubleQuote,
    None,
}

impl TextQualifier {
    pub fn as_char(&self) -> Option<char> {
        match self {
            TextQualifier::DoubleQuote => Some('"'),
            TextQualifier::None => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    pub field_delimiter: FieldDelimiter,
    pub record_delimiter: RecordDelimiter,
    pub text_qualifier: TextQualifier,
    pub include_headers: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            field_delimiter: FieldDelimiter::default(),
            record_delimiter: RecordDelimiter::default(),
            text_qualifier: TextQualifier::default(),
            include_headers: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CsvExporter {
    options: CsvOptions,
}

impl CsvExporter {
    pub fn new(options: CsvOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    /// Write records as CSV. Columns are the union of all field names.
    ///
    /// Without a text qualifier a value containing a delimiter cannot be
    /// represented; such rows are skipped and reported as failures.
    pub fn write_to<W: Write>(
        &self,
        items: &[Record],
        writer: &mut W,
        on_progress: &ExportProgressFn<'_>,
    ) -> Result<ExportReport, ExportError> {
        let columns = column_order(items);
        let field_delim = self.options.field_delimiter.as_char().to_string();
        let record_delim = self.options.record_delimiter.as_str();
        let qualifier = self.options.text_qualifier.as_char();
        let total_rows = items.len();

        on_progress(ExportProgress {
            phase: ExportPhase::Starting,
            rows_exported: 0,
            total_rows,
            message: format!("Exporting {} rows as CSV", total_rows),
        });

        if self.options.include_headers {
            let header_line = columns
                .iter()
                .map(|c| qualify_value(c, qualifier))
                .collect::<Vec<_>>()
                .join(&field_delim);
            writer.write_all(header_line.as_bytes())?;
            writer.write_all(record_delim.as_bytes())?;
        }

        let mut report = ExportReport::default();
        for (row_idx, record) in items.iter().enumerate() {
            let cells: Vec<String> = columns
                .iter()
                .map(|c| {
                    record
                        .get(c)
                        .and_then(|v| v.display_text())
                        .unwrap_or_default()
                })
                .collect();

            let unrepresentable = qualifier.is_none()
                && cells.iter().any(|cell| {
                    cell.contains(field_delim.as_str()) || cell.contains('\n') || cell.contains('\r')
                });

            if unrepresentable {
                tracing::warn!(id = %record.id, "skipping row with unquotable value");
                report.failures.push(RowFailure {
                    id: record.id.clone(),
                    message: "value contains a delimiter and no text qualifier is set".to_string(),
                });
            } else {
                let row_line = cells
                    .iter()
                    .map(|cell| {
                        if cell.is_empty() {
                            String::new()
                        } else {
                            qualify_value(cell, qualifier)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(&field_delim);
                writer.write_all(row_line.as_bytes())?;
                writer.write_all(record_delim.as_bytes())?;
                report.rows_written += 1;
            }

            if (row_idx + 1) % PROGRESS_EVERY_ROWS == 0 {
                on_progress(ExportProgress {
                    phase: ExportPhase::Writing,
                    rows_exported: row_idx + 1,
                    total_rows,
                    message: format!("Exported {}/{} rows", row_idx + 1, total_rows),
                });
            }
        }

        writer.flush()?;

        on_progress(ExportProgress {
            phase: ExportPhase::Complete,
            rows_exported: total_rows,
            total_rows,
            message: format!("Exported {} rows", report.rows_written),
        });

        Ok(report)
    }
}

fn qualify_value(value: &str, qualifier: Option<char>) -> String {
    match qualifier {
        Some(q) => {
            // Escape the qualifier character if it appears in the value
            let escaped = value.replace(q, &format!("{}{}", q, q));
            format!("{}{}{}", q, escaped, q)
        }
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use propdesk_core::Value;
    use std::sync::Mutex;

    fn invoices() -> Vec<Record> {
        vec![
            Record::new(1)
                .with_field("number", "INV-1")
                .with_field("tenant", "Müller, Anna")
                .with_field("amount", Value::Decimal("1200.50".into())),
            Record::new(2)
                .with_field("number", "INV-2")
                .with_field("tenant", "Say \"hi\" GmbH"),
        ]
    }

    fn write(exporter: &CsvExporter, items: &[Record]) -> (String, ExportReport) {
        let mut out = Vec::new();
        let report = exporter.write_to(items, &mut out, &|_| {}).unwrap();
        (String::from_utf8(out).unwrap(), report)
    }

    #[test]
    fn test_field_delimiter() {
        assert_eq!(FieldDelimiter::Comma.as_char(), ',');
        assert_eq!(FieldDelimiter::Tab.as_char(), '\t');
        assert_eq!(FieldDelimiter::Semicolon.as_char(), ';');
    }

    #[test]
    fn test_qualified_output() {
        let exporter = CsvExporter::new(CsvOptions {
            record_delimiter: RecordDelimiter::Lf,
            ..CsvOptions::default()
        });
        let (csv, report) = write(&exporter, &invoices());
        assert_eq!(
            csv,
            "\"number\",\"tenant\",\"amount\"\n\
             \"INV-1\",\"Müller, Anna\",\"1200.50\"\n\
             \"INV-2\",\"Say \"\"hi\"\" GmbH\",\n"
        );
        assert_eq!(report.rows_written, 2);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_unqualified_skips_unrepresentable_rows() {
        let exporter = CsvExporter::new(CsvOptions {
            text_qualifier: TextQualifier::None,
            record_delimiter: RecordDelimiter::Lf,
            include_headers: false,
            ..CsvOptions::default()
        });
        let (csv, report) = write(&exporter, &invoices());
        assert_eq!(csv, "INV-2,Say \"hi\" GmbH,\n");
        assert_eq!(report.rows_written, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id.as_str(), "1");
        assert!(report.is_partial());
    }

    #[test]
    fn test_progress_reported() {
        let items: Vec<Record> = (0..250i64).map(|i| Record::new(i).with_field("n", i)).collect();
        let seen = Mutex::new(Vec::new());
        let exporter = CsvExporter::default();
        exporter
            .write_to(&items, &mut Vec::new(), &|p: ExportProgress| {
                seen.lock().unwrap().push((p.phase, p.rows_exported))
            })
            .unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(
            seen,
            vec![
                (ExportPhase::Starting, 0),
                (ExportPhase::Writing, 100),
                (ExportPhase::Writing, 200),
                (ExportPhase::Complete, 250),
            ]
        );
    }
}
