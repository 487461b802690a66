//! Free-text search and structured field filtering
//!
//! A record passes when it matches the search text (if any) and every active
//! field filter. Fields that are missing or null never match, which keeps a
//! malformed record from breaking the whole list: it just drops out of the
//! filtered set.

use chrono::NaiveDate;
use propdesk_core::{Record, Value};

use crate::filter_types::{FieldFilter, FilterComparison, FilterConfig, FilterState};

/// Filter records, keeping their input order
pub fn apply(records: &[Record], state: &FilterState, config: &FilterConfig) -> Vec<Record> {
    if !state.is_active() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| record_matches(record, state, config))
        .cloned()
        .collect()
}

/// Number of records that would pass [`apply`]
pub fn count_matches(records: &[Record], state: &FilterState, config: &FilterConfig) -> usize {
    records
        .iter()
        .filter(|record| record_matches(record, state, config))
        .count()
}

/// Whether one record passes the search text and every active field filter
pub fn record_matches(record: &Record, state: &FilterState, config: &FilterConfig) -> bool {
    if let Some(query) = state.query() {
        if !matches_text(record, query, &config.searchable_fields) {
            return false;
        }
    }

    state
        .field_filters
        .iter()
        .filter(|(_, filter)| filter.is_active())
        .all(|(field, filter)| {
            let comparison = config
                .comparison_for(field)
                .unwrap_or_else(|| inferred_comparison(filter));
            match record.get(field) {
                Some(value) => matches_filter(value, filter, comparison),
                None => false,
            }
        })
}

/// Case-insensitive substring match against any searchable field
fn matches_text(record: &Record, query: &str, searchable_fields: &[String]) -> bool {
    let needle = query.to_lowercase();
    searchable_fields.iter().any(|field| {
        record
            .get(field)
            .and_then(Value::display_text)
            .is_some_and(|text| text.to_lowercase().contains(&needle))
    })
}

/// Comparison used for a field the config does not declare
fn inferred_comparison(filter: &FieldFilter) -> FilterComparison {
    match filter {
        FieldFilter::Equals { .. } => FilterComparison::Exact,
        FieldFilter::OneOf { .. } => FilterComparison::OneOf,
        FieldFilter::Between { min, max } => {
            let bound_is_date = |b: &Option<Value>| {
                b.as_ref()
                    .is_some_and(|v| v.as_f64().is_none() && v.as_datetime().is_some())
            };
            if bound_is_date(min) || bound_is_date(max) {
                FilterComparison::DateRange
            } else {
                FilterComparison::Range
            }
        }
    }
}

fn matches_filter(value: &Value, filter: &FieldFilter, comparison: FilterComparison) -> bool {
    match (filter, comparison) {
        (FieldFilter::Equals { value: expected }, FilterComparison::DateRange) => {
            match (as_date(value), as_date(expected)) {
                (Some(actual), Some(expected)) => actual == expected,
                _ => false,
            }
        }
        (FieldFilter::Equals { value: expected }, _) => values_equal(value, expected),
        (FieldFilter::OneOf { values }, _) => values.iter().any(|v| values_equal(value, v)),
        (FieldFilter::Between { min, max }, FilterComparison::DateRange) => {
            in_range(as_date(value), min.as_ref().map(as_date), max.as_ref().map(as_date))
        }
        (FieldFilter::Between { min, max }, _) => in_range(
            value.as_f64(),
            min.as_ref().map(Value::as_f64),
            max.as_ref().map(Value::as_f64),
        ),
    }
}

/// Inclusive bounds check. An absent bound is open; a bound that is present
/// but cannot be read as the field's type matches nothing.
fn in_range<T: PartialOrd>(value: Option<T>, min: Option<Option<T>>, max: Option<Option<T>>) -> bool {
    let Some(value) = value else {
        return false;
    };
    let above_min = match min {
        None => true,
        Some(Some(min)) => value >= min,
        Some(None) => false,
    };
    let below_max = match max {
        None => true,
        Some(Some(max)) => value <= max,
        Some(None) => false,
    };
    above_min && below_max
}

fn as_date(value: &Value) -> Option<NaiveDate> {
    value.as_datetime().map(|dt| dt.date_naive())
}

/// Equality for enums, ids and flags. Numbers compare numerically so that
/// `3` matches `"3"`; everything else by display text.
fn values_equal(actual: &Value, expected: &Value) -> bool {
    if let (Some(a), Some(b)) = (actual.as_bool(), expected.as_bool()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (actual.as_f64(), expected.as_f64()) {
        return a == b;
    }
    match (actual.display_text(), expected.display_text()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
