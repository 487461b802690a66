//! Filter and sort types for list views
//!
//! Shared data structures for search, structured filtering and sorting.

use indexmap::IndexMap;
use propdesk_core::Value;
use serde::{Deserialize, Serialize};

/// How a structured-filterable field is compared against its filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterComparison {
    /// Equality (enums, ids, flags)
    #[default]
    Exact,
    /// Inclusive numeric range
    Range,
    /// Inclusive date range
    DateRange,
    /// Membership in a set of values
    OneOf,
}

impl FilterComparison {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Exact => "is",
            Self::Range => "between",
            Self::DateRange => "dated between",
            Self::OneOf => "is one of",
        }
    }
}

/// A field that accepts structured filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterableField {
    pub field: String,
    pub comparison: FilterComparison,
}

impl FilterableField {
    pub fn new(field: impl Into<String>, comparison: FilterComparison) -> Self {
        Self {
            field: field.into(),
            comparison,
        }
    }
}

/// Declares which fields a view searches and filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Fields matched by the free-text query
    #[serde(default)]
    pub searchable_fields: Vec<String>,
    /// Fields that accept structured filters
    #[serde(default)]
    pub filterable_fields: Vec<FilterableField>,
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn searchable(mut self, field: impl Into<String>) -> Self {
        self.searchable_fields.push(field.into());
        self
    }

    pub fn filterable(mut self, field: impl Into<String>, comparison: FilterComparison) -> Self {
        self.filterable_fields
            .push(FilterableField::new(field, comparison));
        self
    }

    /// Declared comparison for a field, if it is filterable
    pub fn comparison_for(&self, field: &str) -> Option<FilterComparison> {
        self.filterable_fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.comparison)
    }
}

/// The filter applied to one structured-filterable field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldFilter {
    /// Field equals the value
    Equals { value: Value },
    /// Field lies within the bounds; a missing bound is open
    Between {
        min: Option<Value>,
        max: Option<Value>,
    },
    /// Field equals any of the values
    OneOf { values: Vec<Value> },
}

impl FieldFilter {
    pub fn equals(value: impl Into<Value>) -> Self {
        Self::Equals {
            value: value.into(),
        }
    }

    pub fn between(min: Option<Value>, max: Option<Value>) -> Self {
        Self::Between { min, max }
    }

    pub fn one_of(values: impl IntoIterator<Item = Value>) -> Self {
        Self::OneOf {
            values: values.into_iter().collect(),
        }
    }

    /// Inactive filters (the "All" choice) are skipped entirely
    pub fn is_active(&self) -> bool {
        match self {
            Self::Equals { value } => !value.is_null(),
            Self::Between { min, max } => {
                min.as_ref().is_some_and(|v| !v.is_null())
                    || max.as_ref().is_some_and(|v| !v.is_null())
            }
            Self::OneOf { values } => !values.is_empty(),
        }
    }
}

/// Search text plus per-field filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub text_query: String,
    #[serde(default)]
    pub field_filters: IndexMap<String, FieldFilter>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.text_query = query.into();
        self
    }

    pub fn with_filter(mut self, field: impl Into<String>, filter: FieldFilter) -> Self {
        self.set_filter(field, filter);
        self
    }

    pub fn set_filter(&mut self, field: impl Into<String>, filter: FieldFilter) {
        self.field_filters.insert(field.into(), filter);
    }

    pub fn remove_filter(&mut self, field: &str) -> Option<FieldFilter> {
        self.field_filters.shift_remove(field)
    }

    /// Trimmed search text, `None` when blank
    pub fn query(&self) -> Option<&str> {
        let trimmed = self.text_query.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Whether any search or active field filter would narrow the set
    pub fn is_active(&self) -> bool {
        self.query().is_some() || self.field_filters.values().any(FieldFilter::is_active)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// The single active sort of a view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: String,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }

    pub fn asc(key: impl Into<String>) -> Self {
        Self::new(key, SortDirection::Asc)
    }

    pub fn desc(key: impl Into<String>) -> Self {
        Self::new(key, SortDirection::Desc)
    }

    /// Header-click semantics: the same key flips direction, a new key starts ascending
    pub fn toggle(current: Option<&SortState>, key: &str) -> SortState {
        match current {
            Some(state) if state.key == key => SortState::new(key, state.direction.toggle()),
            _ => SortState::asc(key),
        }
    }
}
