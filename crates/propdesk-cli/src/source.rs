//! Where a command's records come from: a local JSON file or the REST API

use anyhow::{Context, Result, bail};
use propdesk_cache::{RequestOptions, new_shared_cache};
use propdesk_core::{Record, records_from_payload};
use propdesk_services::{FetchService, HttpTransport, InvalidationMap};
use propdesk_settings::EngineConfig;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, clap::Args)]
pub struct SourceArgs {
    /// JSON file holding a list payload, or an API path such as
    /// `/v1/invoices/` when `--remote` is given
    pub source: String,

    /// Read `source` from the API instead of the filesystem
    #[arg(long)]
    pub remote: bool,

    #[command(flatten)]
    pub api: ApiArgs,

    /// Field holding each record's id
    #[arg(long, default_value = "id")]
    pub id_field: String,
}

/// Connection options for commands that talk to the API
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ApiArgs {
    /// API base URL; falls back to `fetch.base_url` in engine.toml
    #[arg(long, env = "PROPDESK_BASE_URL")]
    pub base_url: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, env = "PROPDESK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

impl ApiArgs {
    /// Fetch service over HTTP with the configured cache and invalidation rules
    pub fn fetch_service(&self, config: &EngineConfig) -> Result<Arc<FetchService>> {
        let Some(base_url) = self.base_url.as_deref().or(config.fetch.base_url.as_deref()) else {
            bail!("no API base URL: pass --base-url, set PROPDESK_BASE_URL or fetch.base_url");
        };

        let mut transport = HttpTransport::new(base_url, config.fetch_timeout())
            .with_context(|| format!("invalid base URL '{}'", base_url))?;
        if let Some(token) = &self.token {
            transport = transport.with_bearer_token(token.clone());
        }

        let service = FetchService::new(Arc::new(transport), new_shared_cache(config.cache_config()))
            .with_invalidation(InvalidationMap::standard())
            .with_config(config.fetch_config());
        Ok(Arc::new(service))
    }
}

impl SourceArgs {
    pub async fn load(&self, config: &EngineConfig) -> Result<Vec<Record>> {
        if self.remote {
            let fetch = self.api.fetch_service(config)?;
            let records = fetch
                .read_records(&self.source, &RequestOptions::new(), &self.id_field)
                .await
                .with_context(|| format!("failed to read {}", self.source))?;
            tracing::debug!(path = %self.source, count = records.len(), "loaded remote records");
            Ok(records)
        } else {
            load_file(Path::new(&self.source), &self.id_field)
        }
    }
}

fn load_file(path: &Path, id_field: &str) -> Result<Vec<Record>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let payload: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let records = records_from_payload(&payload, id_field)
        .with_context(|| format!("{} does not hold a record list", path.display()))?;
    tracing::debug!(path = %path.display(), count = records.len(), "loaded records from file");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use propdesk_core::RecordId;

    #[test]
    fn test_load_file_accepts_results_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tenants.json");
        std::fs::write(
            &path,
            r#"{"count": 2, "results": [{"pk": 7, "name": "Muster"}, {"pk": 9, "name": "Weber"}]}"#,
        )
        .unwrap();

        let records = load_file(&path, "pk").unwrap();
        assert_eq!(
            records.iter().map(|r| r.id.clone()).collect::<Vec<_>>(),
            vec![RecordId::from(7), RecordId::from(9)]
        );
    }

    #[test]
    fn test_load_file_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "[{").unwrap();

        let err = load_file(&path, "id").unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn test_fetch_service_requires_base_url() {
        let err = ApiArgs::default()
            .fetch_service(&EngineConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("no API base URL"));
    }
}
