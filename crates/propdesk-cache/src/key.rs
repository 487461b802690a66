//! Cache keys and invalidation patterns

use propdesk_core::ResourceKind;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Headers that never take part in the cache key
const IGNORED_HEADERS: &[&str] = &["authorization", "cookie", "x-request-id"];

/// The parts of a request that select which response comes back.
///
/// Pairs keep their insertion order for sending; the cache key sorts them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    #[serde(default)]
    pub query: Vec<(String, String)>,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Structured parameters sent as JSON (filter payloads and the like)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_extra(mut self, extra: serde_json::Value) -> Self {
        self.extra = Some(extra);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.headers.is_empty() && self.extra.is_none()
    }
}

/// Deterministic key for a cached response.
///
/// Built from the URL path, the query parameters (from the URL and the
/// options, sorted) and the cache-relevant headers (lowercased, sorted).
/// Two requests that differ only in parameter order share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    path: String,
    canonical: String,
}

impl CacheKey {
    pub fn new(url: &str, options: &RequestOptions) -> Self {
        let (path, url_query) = match url.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (url, None),
        };

        let mut query: Vec<(String, String)> = url_query
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        query.extend(options.query.iter().cloned());
        query.sort();

        let mut headers: Vec<(String, String)> = options
            .headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
            .filter(|(name, _)| !IGNORED_HEADERS.contains(&name.as_str()))
            .collect();
        headers.sort();

        let encode = |pairs: &[(String, String)]| {
            form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs)
                .finish()
        };

        let extra = options
            .extra
            .as_ref()
            .map(|value| canonical_json(value).to_string())
            .unwrap_or_default();

        let canonical = format!(
            "GET {} ?{} #{} ${}",
            path,
            encode(&query),
            encode(&headers),
            extra
        );
        Self {
            path: path.to_string(),
            canonical,
        }
    }

    /// Key for a URL with no extra options
    pub fn for_url(url: &str) -> Self {
        Self::new(url, &RequestOptions::default())
    }

    /// URL path without query string
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn as_str(&self) -> &str {
        &self.canonical
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical)
    }
}

/// Selects cache entries by URL path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", content = "path", rename_all = "snake_case")]
pub enum KeyPattern {
    /// Every entry whose path is exactly this one (any query)
    Exact(String),
    /// Every entry whose path starts with this prefix
    Prefix(String),
}

impl KeyPattern {
    /// A resource's collection and all of its items
    pub fn collection(kind: ResourceKind) -> Self {
        Self::Prefix(kind.collection_path().to_string())
    }

    pub fn matches(&self, key: &CacheKey) -> bool {
        match self {
            Self::Exact(path) => trim_slash(key.path()) == trim_slash(path),
            Self::Prefix(prefix) => key.path().starts_with(prefix.as_str()),
        }
    }
}

/// Rebuild a JSON value with every object's keys in sorted order
fn canonical_json(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            serde_json::Value::Object(
                keys.into_iter()
                    .map(|k| (k.clone(), canonical_json(&map[k])))
                    .collect(),
            )
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonical_json).collect())
        }
        other => other.clone(),
    }
}

fn trim_slash(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}
