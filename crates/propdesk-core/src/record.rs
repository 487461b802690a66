//! Records: opaque domain entities with a stable identifier

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{PropdeskError, Result};
use crate::types::Value;

/// Default identifier field used by the REST API
pub const DEFAULT_ID_FIELD: &str = "id";

/// Stable unique identifier of a record.
///
/// The API uses both numeric and string ids; both are normalised to their
/// string form so that `42` and `"42"` identify the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract an id from a JSON value. Only non-empty strings and integers qualify.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(Self(s.clone())),
            serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

/// A domain entity (property, invoice, task, ...) as seen by the engine.
///
/// Field order follows the payload so exporters keep the API's column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub fields: IndexMap<String, Value>,
}

impl Record {
    /// Create a record with no fields
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field setter
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Get a field. Missing fields and explicit nulls both yield `None`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    /// Set a field, returning the previous value
    pub fn set(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(field.into(), value)
    }

    /// Field names in payload order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    /// Decode one JSON object. The identifier field is kept in `fields` too,
    /// so it can be displayed and searched like any other column.
    pub fn from_json(value: &serde_json::Value, id_field: &str) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| PropdeskError::Decode(format!("expected object, got {}", value)))?;

        let id = object
            .get(id_field)
            .and_then(RecordId::from_json)
            .ok_or_else(|| PropdeskError::MissingIdentifier {
                field: id_field.to_string(),
            })?;

        let fields = object
            .iter()
            .map(|(k, v)| (k.clone(), Value::from_json(v)))
            .collect();

        Ok(Self { id, fields })
    }

    /// Convert back into a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

/// Decode a list payload into records.
///
/// Accepts a bare array or an object wrapping the array in `results`, the
/// shape paginated list endpoints return. Entries without a usable
/// identifier are skipped so one malformed row cannot break a whole list.
pub fn records_from_payload(payload: &serde_json::Value, id_field: &str) -> Result<Vec<Record>> {
    let items = match payload {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => match map.get("results") {
            Some(serde_json::Value::Array(items)) => items,
            _ => {
                return Err(PropdeskError::Decode(
                    "expected an array or an object with a 'results' array".to_string(),
                ));
            }
        },
        other => {
            return Err(PropdeskError::Decode(format!(
                "expected a list payload, got {}",
                other
            )));
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match Record::from_json(item, id_field) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping undecodable record");
            }
        }
    }
    Ok(records)
}
