//! Export to files on disk

use async_trait::async_trait;
use chrono::Utc;
use propdesk_core::Record;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::csv_export::{CsvExporter, CsvOptions};
use crate::exporter::{ExportError, ExportFormat, ExportProgressFn, ExportReport, RecordExporter};
use crate::json_export::JsonExporter;

/// Writes exports into one output directory
#[derive(Debug, Clone)]
pub struct FileExporter {
    output_dir: PathBuf,
    csv: CsvExporter,
    json: JsonExporter,
}

impl FileExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            csv: CsvExporter::default(),
            json: JsonExporter::new(true),
        }
    }

    pub fn with_csv_options(mut self, options: CsvOptions) -> Self {
        self.csv = CsvExporter::new(options);
        self
    }

    pub fn with_pretty_json(mut self, pretty: bool) -> Self {
        self.json = JsonExporter::new(pretty);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Resolve the target path. Directory components are stripped from the
    /// requested name and the format's extension is appended when missing.
    pub fn target_path(
        &self,
        filename: Option<&str>,
        format: ExportFormat,
    ) -> Result<PathBuf, ExportError> {
        let extension = format.extension();
        let name = match filename {
            Some(requested) => {
                let base = Path::new(requested.trim())
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(sanitize_filename)
                    .filter(|n| !n.is_empty() && n.chars().any(|c| c != '.'))
                    .ok_or_else(|| ExportError::InvalidFilename(requested.to_string()))?;
                let has_extension = Path::new(&base)
                    .extension()
                    .is_some_and(|e| e.eq_ignore_ascii_case(extension));
                if has_extension {
                    base
                } else {
                    format!("{}.{}", base, extension)
                }
            }
            None => format!("export-{}.{}", Utc::now().format("%Y%m%d-%H%M%S"), extension),
        };
        Ok(self.output_dir.join(name))
    }
}

/// Replace characters that are not portable in file names
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[async_trait]
impl RecordExporter for FileExporter {
    async fn export(
        &self,
        items: &[Record],
        filename: Option<&str>,
        format: ExportFormat,
        on_progress: &ExportProgressFn<'_>,
    ) -> Result<ExportReport, ExportError> {
        let path = self.target_path(filename, format)?;
        std::fs::create_dir_all(&self.output_dir)?;

        let file = std::fs::File::create(&path)?;
        let mut writer = BufWriter::new(file);
        let mut report = match format {
            ExportFormat::Csv => self.csv.write_to(items, &mut writer, on_progress)?,
            ExportFormat::Json => self.json.write_to(items, &mut writer, on_progress)?,
        };

        tracing::info!(
            path = %path.display(),
            rows = report.rows_written,
            failures = report.failures.len(),
            "export written"
        );
        report.path = Some(path);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_export::RecordDelimiter;
    use pretty_assertions::assert_eq;

    fn tenants() -> Vec<Record> {
        vec![
            Record::new(1).with_field("name", "Anna"),
            Record::new(2).with_field("name", "Ben"),
        ]
    }

    #[test]
    fn test_target_path_sanitizes() {
        let exporter = FileExporter::new("/tmp/out");
        assert_eq!(
            exporter
                .target_path(Some("../../etc/tenants"), ExportFormat::Csv)
                .unwrap(),
            PathBuf::from("/tmp/out/tenants.csv")
        );
        assert_eq!(
            exporter
                .target_path(Some("q1:report.JSON"), ExportFormat::Json)
                .unwrap(),
            PathBuf::from("/tmp/out/q1_report.JSON")
        );
        assert!(matches!(
            exporter.target_path(Some(".."), ExportFormat::Csv),
            Err(ExportError::InvalidFilename(_))
        ));
    }

    #[test]
    fn test_default_name() {
        let path = FileExporter::new("/tmp/out")
            .target_path(None, ExportFormat::Json)
            .unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("export-"));
        assert!(name.ends_with(".json"));
    }

    #[tokio::test]
    async fn test_export_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = FileExporter::new(dir.path().join("exports")).with_csv_options(CsvOptions {
            record_delimiter: RecordDelimiter::Lf,
            ..CsvOptions::default()
        });

        let report = exporter
            .export(&tenants(), Some("tenants"), ExportFormat::Csv, &|_| {})
            .await
            .unwrap();

        let path = report.path.unwrap();
        assert_eq!(path, dir.path().join("exports").join("tenants.csv"));
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "\"name\"\n\"Anna\"\n\"Ben\"\n"
        );
        assert_eq!(report.rows_written, 2);
    }

    #[tokio::test]
    async fn test_export_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = FileExporter::new(dir.path()).with_pretty_json(false);
        let report = exporter
            .export(&tenants(), Some("tenants.json"), ExportFormat::Json, &|_| {})
            .await
            .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(report.path.unwrap()).unwrap()).unwrap();
        assert_eq!(
            written,
            serde_json::json!([{ "name": "Anna" }, { "name": "Ben" }])
        );
    }
}
