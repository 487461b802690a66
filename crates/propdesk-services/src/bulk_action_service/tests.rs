use super::*;
use crate::fetch_service::InvalidationMap;
use crate::test_support::MockTransport;
use propdesk_cache::{CacheConfig, new_shared_cache};
use propdesk_interchange::{ExportError, ExportProgressFn, FileExporter};
use tokio::sync::Notify;

/// Fails every id listed in `failing`; optionally waits on a gate per item
#[derive(Default)]
struct ScriptedExecutor {
    failing: HashSet<RecordId>,
    gate: Option<Arc<Notify>>,
    executed: Mutex<Vec<RecordId>>,
}

#[async_trait]
impl BulkItemExecutor for ScriptedExecutor {
    async fn execute(&self, _operation: &BulkOperation, record: &Record) -> Result<(), ItemError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.executed.lock().push(record.id.clone());
        if self.failing.contains(&record.id) {
            return Err(ItemError::Rejected(format!("{} is locked", record.id.as_str())));
        }
        Ok(())
    }
}

struct BrokenExporter;

#[async_trait]
impl RecordExporter for BrokenExporter {
    async fn export(
        &self,
        _items: &[Record],
        _filename: Option<&str>,
        _format: ExportFormat,
        _on_progress: &ExportProgressFn<'_>,
    ) -> Result<ExportReport, ExportError> {
        Err(ExportError::Failed("disk full".to_string()))
    }
}

fn invoices(n: i64) -> Vec<Record> {
    (1..=n)
        .map(|i| {
            Record::new(i)
                .with_field("number", format!("INV-{i}"))
                .with_field("amount", i * 100)
        })
        .collect()
}

fn ids(raw: &[i64]) -> Vec<RecordId> {
    raw.iter().copied().map(RecordId::from).collect()
}

fn service(executor: ScriptedExecutor) -> BulkActionService {
    BulkActionService::new(Arc::new(executor), Arc::new(BrokenExporter))
}

/// Collects every progress callback
#[derive(Default)]
struct ProgressLog(Mutex<Vec<(u8, String)>>);

impl ProgressLog {
    fn record(&self, percent: u8, message: &str) {
        self.0.lock().push((percent, message.to_string()));
    }

    fn percents(&self) -> Vec<u8> {
        self.0.lock().iter().map(|(p, _)| *p).collect()
    }
}

mod run_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_partial_failure() {
        let executor = ScriptedExecutor {
            failing: ids(&[3, 7]).into_iter().collect(),
            ..Default::default()
        };
        let service = service(executor);
        let log = ProgressLog::default();

        let selected = ids(&(1..=10).collect::<Vec<_>>());
        let outcome = service
            .run(BulkOperation::Archive, &selected, &invoices(10), &|p, m| {
                log.record(p, m)
            })
            .await
            .unwrap();

        assert_eq!(outcome.status, BulkStatus::PartiallySucceeded);
        assert_eq!(outcome.succeeded.len(), 8);
        assert_eq!(
            outcome.failures.iter().map(|f| f.id.clone()).collect::<Vec<_>>(),
            ids(&[3, 7])
        );
        assert_eq!(outcome.failures[0].message, "3 is locked");

        let percents = log.percents();
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(percents.last(), Some(&100));
    }

    #[tokio::test]
    async fn test_items_processed_in_id_order() {
        let executor = Arc::new(ScriptedExecutor::default());
        let service = BulkActionService::new(executor.clone(), Arc::new(BrokenExporter));

        service
            .run(BulkOperation::Delete, &ids(&[5, 2, 8, 2]), &invoices(9), &|_, _| {})
            .await
            .unwrap();

        // Ids compare as strings
        assert_eq!(*executor.executed.lock(), ids(&[2, 5, 8]));
    }

    #[tokio::test]
    async fn test_all_failed() {
        let executor = ScriptedExecutor {
            failing: ids(&[1, 2]).into_iter().collect(),
            ..Default::default()
        };
        let outcome = service(executor)
            .run(
                BulkOperation::Edit {
                    field: "status".into(),
                    value: Value::from("paid"),
                },
                &ids(&[1, 2]),
                &invoices(2),
                &|_, _| {},
            )
            .await
            .unwrap();
        assert_eq!(outcome.status, BulkStatus::Failed);
        assert!(outcome.succeeded.is_empty());
    }

    #[tokio::test]
    async fn test_missing_records_are_failures() {
        let outcome = service(ScriptedExecutor::default())
            .run(BulkOperation::Archive, &ids(&[1, 42]), &invoices(3), &|_, _| {})
            .await
            .unwrap();
        assert_eq!(outcome.status, BulkStatus::PartiallySucceeded);
        assert_eq!(outcome.succeeded, ids(&[1]));
        assert_eq!(
            outcome.failures,
            vec![BulkItemFailure {
                id: RecordId::from(42),
                message: "record not found".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_empty_selection() {
        let result = service(ScriptedExecutor::default())
            .run(BulkOperation::Delete, &[], &invoices(3), &|_, _| {})
            .await;
        assert_eq!(result.unwrap_err(), BulkError::EmptySelection);
    }
}

mod lifecycle_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_second_run_rejected_while_running() {
        let gate = Arc::new(Notify::new());
        let executor = ScriptedExecutor {
            gate: Some(gate.clone()),
            ..Default::default()
        };
        let service = Arc::new(service(executor).with_display_delay(Duration::ZERO));

        let background = {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .run(BulkOperation::Archive, &ids(&[1]), &invoices(1), &|_, _| {})
                    .await
            })
        };

        while !service.is_running() {
            tokio::task::yield_now().await;
        }
        assert_eq!(
            service.current_run().map(|r| r.status),
            Some(BulkStatus::Running)
        );

        let second = service
            .run(BulkOperation::Delete, &ids(&[1]), &invoices(1), &|_, _| {})
            .await;
        assert_eq!(second.unwrap_err(), BulkError::AlreadyRunning);

        gate.notify_one();
        let outcome = background.await.unwrap().unwrap();
        assert_eq!(outcome.status, BulkStatus::Succeeded);
        assert!(service.current_run().is_none());
    }

    #[tokio::test]
    async fn test_abandoned_run_does_not_block_next_run() {
        let gate = Arc::new(Notify::new());
        let executor = ScriptedExecutor {
            gate: Some(gate.clone()),
            ..Default::default()
        };
        let service = service(executor).with_display_delay(Duration::ZERO);

        let first = tokio::time::timeout(
            Duration::from_millis(20),
            service.run(BulkOperation::Archive, &ids(&[1]), &invoices(1), &|_, _| {}),
        )
        .await;
        assert!(first.is_err());
        assert!(service.current_run().is_none());
        assert!(!service.is_running());

        // Stored permit lets the next run's single item through
        gate.notify_one();
        let outcome = service
            .run(BulkOperation::Archive, &ids(&[1]), &invoices(1), &|_, _| {})
            .await
            .unwrap();
        assert_eq!(outcome.status, BulkStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_finished_run_cleared_after_delay() {
        let service =
            service(ScriptedExecutor::default()).with_display_delay(Duration::from_millis(20));

        let outcome = service
            .run(BulkOperation::Archive, &ids(&[1, 2]), &invoices(2), &|_, _| {})
            .await
            .unwrap();

        let run = service.current_run().unwrap();
        assert_eq!(run.id, outcome.run_id);
        assert_eq!(run.status, BulkStatus::Succeeded);
        assert_eq!(run.progress, 100);
        assert!(run.finished_at.is_some());

        // A new run may start while the last one is still displayed
        service
            .run(BulkOperation::Archive, &ids(&[1]), &invoices(2), &|_, _| {})
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(service.current_run().is_none());
    }
}

mod export_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_export_selected_records() {
        let dir = tempfile::tempdir().unwrap();
        let service = BulkActionService::new(
            Arc::new(ScriptedExecutor::default()),
            Arc::new(FileExporter::new(dir.path())),
        );
        let log = ProgressLog::default();

        let outcome = service
            .run(
                BulkOperation::Export {
                    format: ExportFormat::Json,
                    filename: Some("invoices".into()),
                },
                &ids(&[2, 3]),
                &invoices(5),
                &|p, m| log.record(p, m),
            )
            .await
            .unwrap();

        assert_eq!(outcome.status, BulkStatus::Succeeded);
        let report = outcome.export.unwrap();
        assert_eq!(report.rows_written, 2);
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(report.path.unwrap()).unwrap())
                .unwrap();
        assert_eq!(written[0]["number"], serde_json::json!("INV-2"));
        assert_eq!(log.percents().last(), Some(&100));
    }

    #[tokio::test]
    async fn test_export_failure_fails_run() {
        let outcome = service(ScriptedExecutor::default())
            .run(
                BulkOperation::Export {
                    format: ExportFormat::Csv,
                    filename: None,
                },
                &ids(&[1, 2]),
                &invoices(2),
                &|_, _| {},
            )
            .await
            .unwrap();
        assert_eq!(outcome.status, BulkStatus::Failed);
        assert_eq!(outcome.failures.len(), 2);
        assert!(outcome.failures[0].message.contains("disk full"));
    }
}

mod rest_executor_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_archive_writes_and_invalidates() {
        let transport = Arc::new(MockTransport::new().with_response("/v1/invoices/", json!([])));
        let fetch = Arc::new(
            FetchService::new(transport.clone(), new_shared_cache(CacheConfig::default()))
                .with_invalidation(InvalidationMap::standard()),
        );
        fetch
            .read("/v1/invoices/", &RequestOptions::new())
            .await
            .unwrap();

        let executor = RestBulkExecutor::new(fetch.clone(), ResourceKind::Invoice);
        let service = BulkActionService::new(Arc::new(executor), Arc::new(BrokenExporter));
        let outcome = service
            .run(BulkOperation::Archive, &ids(&[1, 2]), &invoices(2), &|_, _| {})
            .await
            .unwrap();

        assert_eq!(outcome.status, BulkStatus::Succeeded);
        assert_eq!(
            transport.sent(),
            vec![
                (HttpMethod::Patch, "/v1/invoices/1/".to_string()),
                (HttpMethod::Patch, "/v1/invoices/2/".to_string()),
            ]
        );
        assert!(fetch.cache().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_export_per_item() {
        let transport = Arc::new(MockTransport::new());
        let fetch = Arc::new(FetchService::new(
            transport,
            new_shared_cache(CacheConfig::default()),
        ));
        let executor = RestBulkExecutor::new(fetch, ResourceKind::Task);
        let result = executor
            .execute(
                &BulkOperation::Export {
                    format: ExportFormat::Csv,
                    filename: None,
                },
                &Record::new(1),
            )
            .await;
        assert!(matches!(result, Err(ItemError::Rejected(_))));
    }
}

mod export_only_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_item_operations_fail() {
        let service = BulkActionService::export_only(Arc::new(BrokenExporter));
        let outcome = service
            .run(BulkOperation::Delete, &ids(&[1]), &invoices(1), &|_, _| {})
            .await
            .unwrap();
        assert_eq!(outcome.status, BulkStatus::Failed);
        assert_eq!(
            outcome.failures[0].message,
            "no executor configured for per-item operations"
        );
    }
}
