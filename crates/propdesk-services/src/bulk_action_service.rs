//! Bulk action orchestration
//!
//! Runs one operation (export, archive, delete, edit) over a set of selected
//! record ids. Items are processed sequentially in id order; a failing item
//! is recorded and the run moves on, successes are never rolled back. Only
//! one run exists at a time. A finished run stays visible through
//! [`BulkActionService::current_run`] for a display delay and is then
//! cleared.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use propdesk_cache::RequestOptions;
use propdesk_core::{Record, RecordId, ResourceKind, Value};
use propdesk_interchange::{ExportFormat, ExportProgress, ExportReport, RecordExporter};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use uuid::Uuid;

use crate::error::{BulkError, ItemError};
use crate::fetch_service::FetchService;
use crate::transport::HttpMethod;

/// How long a finished run stays visible
pub const DEFAULT_DISPLAY_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BulkOperation {
    Export {
        format: ExportFormat,
        filename: Option<String>,
    },
    Archive,
    Delete,
    Edit {
        field: String,
        value: Value,
    },
}

impl BulkOperation {
    /// Progressive verb used in progress messages
    pub fn verb(&self) -> &'static str {
        match self {
            BulkOperation::Export { .. } => "Exporting",
            BulkOperation::Archive => "Archiving",
            BulkOperation::Delete => "Deleting",
            BulkOperation::Edit { .. } => "Updating",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BulkStatus {
    Pending,
    Running,
    Succeeded,
    PartiallySucceeded,
    Failed,
}

impl BulkStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BulkStatus::Succeeded | BulkStatus::PartiallySucceeded | BulkStatus::Failed
        )
    }

    fn from_counts(succeeded: usize, failed: usize) -> Self {
        match (succeeded, failed) {
            (_, 0) => BulkStatus::Succeeded,
            (0, _) => BulkStatus::Failed,
            _ => BulkStatus::PartiallySucceeded,
        }
    }
}

/// The visible state of a bulk run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkActionRun {
    pub id: Uuid,
    pub target_ids: Vec<RecordId>,
    pub operation: BulkOperation,
    /// 0..=100, never decreases
    pub progress: u8,
    pub message: String,
    pub status: BulkStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkItemFailure {
    pub id: RecordId,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulkOutcome {
    pub run_id: Uuid,
    pub status: BulkStatus,
    /// Ids the operation succeeded for, in processing order
    pub succeeded: Vec<RecordId>,
    pub failures: Vec<BulkItemFailure>,
    /// Present for export runs that produced output
    pub export: Option<ExportReport>,
}

/// Applies a per-item operation (archive, delete, edit) to one record
#[async_trait]
pub trait BulkItemExecutor: Send + Sync {
    async fn execute(&self, operation: &BulkOperation, record: &Record) -> Result<(), ItemError>;
}

/// Executes items as REST writes through the fetch wrapper, so every
/// successful write invalidates the affected cache entries
pub struct RestBulkExecutor {
    fetch: Arc<FetchService>,
    resource: ResourceKind,
    archive_field: String,
}

impl RestBulkExecutor {
    pub fn new(fetch: Arc<FetchService>, resource: ResourceKind) -> Self {
        Self {
            fetch,
            resource,
            archive_field: "archived".to_string(),
        }
    }

    /// Field set to `true` by the archive operation
    pub fn with_archive_field(mut self, field: impl Into<String>) -> Self {
        self.archive_field = field.into();
        self
    }

    fn patch_body(field: &str, value: serde_json::Value) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        body.insert(field.to_string(), value);
        serde_json::Value::Object(body)
    }
}

#[async_trait]
impl BulkItemExecutor for RestBulkExecutor {
    async fn execute(&self, operation: &BulkOperation, record: &Record) -> Result<(), ItemError> {
        let url = self.resource.item_path(record.id.as_str());
        let options = RequestOptions::new();
        match operation {
            BulkOperation::Archive => {
                let body = Self::patch_body(&self.archive_field, serde_json::Value::Bool(true));
                self.fetch
                    .write(HttpMethod::Patch, self.resource, &url, &options, Some(&body))
                    .await?;
            }
            BulkOperation::Delete => {
                self.fetch
                    .write(HttpMethod::Delete, self.resource, &url, &options, None)
                    .await?;
            }
            BulkOperation::Edit { field, value } => {
                let body = Self::patch_body(field, value.to_json());
                self.fetch
                    .write(HttpMethod::Patch, self.resource, &url, &options, Some(&body))
                    .await?;
            }
            BulkOperation::Export { .. } => {
                return Err(ItemError::Rejected(
                    "exports are not executed per item".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Executor of services that only export
struct NoItemExecutor;

#[async_trait]
impl BulkItemExecutor for NoItemExecutor {
    async fn execute(&self, _operation: &BulkOperation, _record: &Record) -> Result<(), ItemError> {
        Err(ItemError::Rejected(
            "no executor configured for per-item operations".to_string(),
        ))
    }
}

type CurrentRun = Arc<Mutex<Option<BulkActionRun>>>;

/// Forwards progress to the caller and the visible run, never going backwards
struct ProgressReporter<'a> {
    sink: &'a (dyn Fn(u8, &str) + Send + Sync),
    current: &'a CurrentRun,
    run_id: Uuid,
    last: AtomicU8,
}

impl ProgressReporter<'_> {
    fn report(&self, percent: u8, message: &str) {
        let percent = percent.min(100);
        let previous = self.last.fetch_max(percent, Ordering::SeqCst);
        let percent = percent.max(previous);

        if let Some(run) = self.current.lock().as_mut().filter(|r| r.id == self.run_id) {
            run.progress = percent;
            run.message = message.to_string();
        }
        (self.sink)(percent, message);
    }
}

pub struct BulkActionService {
    executor: Arc<dyn BulkItemExecutor>,
    exporter: Arc<dyn RecordExporter>,
    display_delay: Duration,
    current: CurrentRun,
}

impl BulkActionService {
    pub fn new(executor: Arc<dyn BulkItemExecutor>, exporter: Arc<dyn RecordExporter>) -> Self {
        Self {
            executor,
            exporter,
            display_delay: DEFAULT_DISPLAY_DELAY,
            current: Arc::new(Mutex::new(None)),
        }
    }

    /// A service that can only run exports; per-item operations fail
    pub fn export_only(exporter: Arc<dyn RecordExporter>) -> Self {
        Self::new(Arc::new(NoItemExecutor), exporter)
    }

    pub fn with_display_delay(mut self, delay: Duration) -> Self {
        self.display_delay = delay;
        self
    }

    /// The running run, or the last finished one while it is still displayed
    pub fn current_run(&self) -> Option<BulkActionRun> {
        self.current.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.current
            .lock()
            .as_ref()
            .is_some_and(|run| !run.status.is_terminal())
    }

    /// Run `operation` over the selected ids.
    ///
    /// `records` is the data set the ids are resolved against; ids without a
    /// record are reported as item failures. `on_progress` receives a
    /// non-decreasing percentage and a message, ending with 100.
    #[tracing::instrument(skip_all, fields(op = operation.verb(), selected = selected_ids.len()))]
    pub async fn run(
        &self,
        operation: BulkOperation,
        selected_ids: &[RecordId],
        records: &[Record],
        on_progress: &(dyn Fn(u8, &str) + Send + Sync),
    ) -> Result<BulkOutcome, BulkError> {
        if selected_ids.is_empty() {
            return Err(BulkError::EmptySelection);
        }

        let mut target_ids = selected_ids.to_vec();
        target_ids.sort();
        target_ids.dedup();

        let run_id = Uuid::new_v4();
        {
            let mut current = self.current.lock();
            if current.as_ref().is_some_and(|run| !run.status.is_terminal()) {
                tracing::warn!("bulk action rejected, another run is active");
                return Err(BulkError::AlreadyRunning);
            }
            *current = Some(BulkActionRun {
                id: run_id,
                target_ids: target_ids.clone(),
                operation: operation.clone(),
                progress: 0,
                message: String::new(),
                status: BulkStatus::Pending,
                started_at: Utc::now(),
                finished_at: None,
            });
        }

        let run_guard = RunGuard {
            current: &self.current,
            run_id,
            finished: false,
        };
        self.set_status(run_id, BulkStatus::Running);
        tracing::info!(%run_id, targets = target_ids.len(), "bulk action started");

        let reporter = ProgressReporter {
            sink: on_progress,
            current: &self.current,
            run_id,
            last: AtomicU8::new(0),
        };
        reporter.report(0, &format!("{} {} records", operation.verb(), target_ids.len()));

        let by_id: HashMap<&RecordId, &Record> = records.iter().map(|r| (&r.id, r)).collect();
        let mut failures = Vec::new();
        let mut found = Vec::with_capacity(target_ids.len());
        for id in &target_ids {
            match by_id.get(id) {
                Some(record) => found.push(*record),
                None => {
                    tracing::warn!(%id, "selected record not in data set");
                    failures.push(BulkItemFailure {
                        id: id.clone(),
                        message: "record not found".to_string(),
                    });
                }
            }
        }

        let (succeeded, export) = match &operation {
            BulkOperation::Export { format, filename } => {
                self.run_export(&found, *format, filename.as_deref(), &reporter, &mut failures)
                    .await
            }
            _ => (
                self.run_items(&operation, &found, &reporter, &mut failures)
                    .await,
                None,
            ),
        };

        let status = BulkStatus::from_counts(succeeded.len(), failures.len());
        let message = match status {
            BulkStatus::Succeeded => format!("{} records done", succeeded.len()),
            _ => format!("{} done, {} failed", succeeded.len(), failures.len()),
        };
        reporter.report(100, &message);
        run_guard.disarm();
        self.finish(run_id, status);
        tracing::info!(
            %run_id,
            ?status,
            succeeded = succeeded.len(),
            failed = failures.len(),
            "bulk action finished"
        );

        Ok(BulkOutcome {
            run_id,
            status,
            succeeded,
            failures,
            export,
        })
    }

    async fn run_items(
        &self,
        operation: &BulkOperation,
        records: &[&Record],
        reporter: &ProgressReporter<'_>,
        failures: &mut Vec<BulkItemFailure>,
    ) -> Vec<RecordId> {
        let total = records.len();
        let mut succeeded = Vec::with_capacity(total);
        for (ix, record) in records.iter().enumerate() {
            match self.executor.execute(operation, record).await {
                Ok(()) => succeeded.push(record.id.clone()),
                Err(e) => {
                    tracing::warn!(id = %record.id, error = %e, "bulk item failed");
                    failures.push(BulkItemFailure {
                        id: record.id.clone(),
                        message: e.to_string(),
                    });
                }
            }
            let percent = ((ix + 1) * 100 / total) as u8;
            reporter.report(
                percent,
                &format!("{} {}/{}", operation.verb(), ix + 1, total),
            );
        }
        succeeded
    }

    async fn run_export(
        &self,
        records: &[&Record],
        format: ExportFormat,
        filename: Option<&str>,
        reporter: &ProgressReporter<'_>,
        failures: &mut Vec<BulkItemFailure>,
    ) -> (Vec<RecordId>, Option<ExportReport>) {
        if records.is_empty() {
            return (Vec::new(), None);
        }

        let items: Vec<Record> = records.iter().map(|r| (*r).clone()).collect();
        let forward = |progress: ExportProgress| reporter.report(progress.percent(), &progress.message);

        match self.exporter.export(&items, filename, format, &forward).await {
            Ok(report) => {
                let failed: HashSet<&RecordId> = report.failures.iter().map(|f| &f.id).collect();
                let succeeded = items
                    .iter()
                    .filter(|r| !failed.contains(&r.id))
                    .map(|r| r.id.clone())
                    .collect();
                failures.extend(report.failures.iter().map(|f| BulkItemFailure {
                    id: f.id.clone(),
                    message: f.message.clone(),
                }));
                (succeeded, Some(report))
            }
            Err(e) => {
                tracing::warn!(error = %e, "export failed");
                failures.extend(items.iter().map(|r| BulkItemFailure {
                    id: r.id.clone(),
                    message: e.to_string(),
                }));
                (Vec::new(), None)
            }
        }
    }

    fn set_status(&self, run_id: Uuid, status: BulkStatus) {
        if let Some(run) = self.current.lock().as_mut().filter(|r| r.id == run_id) {
            run.status = status;
        }
    }

    fn finish(&self, run_id: Uuid, status: BulkStatus) {
        if let Some(run) = self.current.lock().as_mut().filter(|r| r.id == run_id) {
            run.status = status;
            run.finished_at = Some(Utc::now());
        }

        if self.display_delay.is_zero() {
            clear_run(&self.current, run_id);
            return;
        }
        let current = self.current.clone();
        let delay = self.display_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            clear_run(&current, run_id);
        });
    }
}

/// Clears the run when `run` is dropped before reaching a terminal state,
/// so an abandoned run cannot block later ones
struct RunGuard<'a> {
    current: &'a CurrentRun,
    run_id: Uuid,
    finished: bool,
}

impl RunGuard<'_> {
    fn disarm(mut self) {
        self.finished = true;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(run_id = %self.run_id, "bulk action abandoned before completion");
            clear_run(self.current, self.run_id);
        }
    }
}

/// Clear the visible run unless a newer one replaced it
fn clear_run(current: &CurrentRun, run_id: Uuid) {
    let mut current = current.lock();
    if current.as_ref().is_some_and(|run| run.id == run_id) {
        *current = None;
    }
}

#[cfg(test)]
mod tests;
