//! In-memory collaborators for the service tests

use async_trait::async_trait;
use parking_lot::Mutex;
use propdesk_cache::RequestOptions;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{FetchError, FetchResult};
use crate::transport::{HttpMethod, Transport};

/// Serves canned GET responses by path and records every write
#[derive(Default)]
pub struct MockTransport {
    responses: HashMap<String, serde_json::Value>,
    delay: Option<Duration>,
    gets: AtomicUsize,
    sent: Mutex<Vec<(HttpMethod, String)>>,
    fail_sends: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, path: &str, body: serde_json::Value) -> Self {
        self.responses.insert(path.to_string(), body);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<(HttpMethod, String)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str, _options: &RequestOptions) -> FetchResult<serde_json::Value> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                method: HttpMethod::Get,
                url: url.to_string(),
                status: 404,
            })
    }

    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        _options: &RequestOptions,
        _body: Option<&serde_json::Value>,
    ) -> FetchResult<serde_json::Value> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(FetchError::Status {
                method,
                url: url.to_string(),
                status: 500,
            });
        }
        self.sent.lock().push((method, url.to_string()));
        Ok(serde_json::Value::Null)
    }
}
