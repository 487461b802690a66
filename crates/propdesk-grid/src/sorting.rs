//! Single-key sorting with type-aware comparison
//!
//! Present values compare as dates when both read as dates, else as numbers
//! when both read as numbers, else as case-sensitive strings. Missing and
//! null values always sort last. Descending reverses the comparison of
//! present values only, and the sort is stable in both directions.

use chrono::{DateTime, Utc};
use propdesk_core::{Record, Value};
use std::cmp::Ordering;

use crate::filter_types::{SortDirection, SortState};

/// A present value reduced to the form it sorts by.
///
/// Variant order ranks the classes against each other so that mixed
/// columns still have a total order.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Date(DateTime<Utc>),
    Number(f64),
    Text(String),
}

impl SortKey {
    fn from_value(value: &Value) -> Option<Self> {
        // Numeric strings like "2024" must stay numbers, so only values that
        // do not read as numbers are tried as dates.
        if let Value::Date(_) | Value::DateTime(_) = value {
            return value.as_datetime().map(SortKey::Date);
        }
        if let Some(number) = value.as_f64() {
            return Some(SortKey::Number(number));
        }
        if let Some(dt) = value.as_datetime() {
            return Some(SortKey::Date(dt));
        }
        value.display_text().map(SortKey::Text)
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Date(_) => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

/// Compare two optional field values. `None` (missing) sorts last in either direction.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>, direction: SortDirection) -> Ordering {
    let a = a.and_then(SortKey::from_value);
    let b = b.and_then(SortKey::from_value);
    compare_keys(a.as_ref(), b.as_ref(), direction)
}

fn compare_keys(a: Option<&SortKey>, b: Option<&SortKey>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match direction {
            SortDirection::Asc => a.compare(b),
            SortDirection::Desc => a.compare(b).reverse(),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sort records by the state's key. The input is left untouched.
pub fn apply(records: &[Record], sort: &SortState) -> Vec<Record> {
    sorted_indices(records, sort)
        .into_iter()
        .map(|ix| records[ix].clone())
        .collect()
}

/// Positions of `records` in sorted order
pub fn sorted_indices(records: &[Record], sort: &SortState) -> Vec<usize> {
    let keys: Vec<Option<SortKey>> = records
        .iter()
        .map(|record| record.get(&sort.key).and_then(SortKey::from_value))
        .collect();

    let mut indices: Vec<usize> = (0..records.len()).collect();
    // `sort_by` is stable, which keeps ties in input order
    indices.sort_by(|&a, &b| compare_keys(keys[a].as_ref(), keys[b].as_ref(), sort.direction));
    indices
}

/// Sort positions that refer into `records` (used when the set is already filtered)
pub fn sort_subset(records: &[Record], subset: &mut [usize], sort: &SortState) {
    let key_of = |ix: usize| records[ix].get(&sort.key).and_then(SortKey::from_value);
    let mut keyed: Vec<(usize, Option<SortKey>)> = subset.iter().map(|&ix| (ix, key_of(ix))).collect();
    keyed.sort_by(|a, b| compare_keys(a.1.as_ref(), b.1.as_ref(), sort.direction));
    for (slot, (ix, _)) in subset.iter_mut().zip(keyed) {
        *slot = ix;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_numbers_sort_numerically() {
        let records = vec![
            Record::new("a").with_field("rent", "900"),
            Record::new("b").with_field("rent", 1200i64),
            Record::new("c").with_field("rent", 85.5),
        ];
        let sorted = apply(&records, &SortState::asc("rent"));
        assert_eq!(ids(&sorted), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_dates_sort_as_dates() {
        let records = vec![
            Record::new("a").with_field("due", "2024-10-01"),
            Record::new("b").with_field("due", NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()),
            Record::new("c").with_field("due", "2024-03-15T12:00:00Z"),
        ];
        let sorted = apply(&records, &SortState::asc("due"));
        assert_eq!(ids(&sorted), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_strings_are_case_sensitive() {
        let records = vec![
            Record::new("a").with_field("name", "beta"),
            Record::new("b").with_field("name", "Alpha"),
            Record::new("c").with_field("name", "alpha"),
        ];
        let sorted = apply(&records, &SortState::asc("name"));
        assert_eq!(ids(&sorted), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_missing_last_in_both_directions() {
        let records = vec![
            Record::new("a").with_field("units", 3i64),
            Record::new("b"),
            Record::new("c").with_field("units", 9i64),
            Record::new("d").with_field("units", Value::Null),
        ];
        assert_eq!(ids(&apply(&records, &SortState::asc("units"))), vec!["a", "c", "b", "d"]);
        assert_eq!(ids(&apply(&records, &SortState::desc("units"))), vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let records = vec![
            Record::new("a").with_field("status", "open"),
            Record::new("b").with_field("status", "done"),
            Record::new("c").with_field("status", "open"),
            Record::new("d").with_field("status", "done"),
        ];
        assert_eq!(
            ids(&apply(&records, &SortState::asc("status"))),
            vec!["b", "d", "a", "c"]
        );
        assert_eq!(
            ids(&apply(&records, &SortState::desc("status"))),
            vec!["a", "c", "b", "d"]
        );
    }

    #[test]
    fn test_mixed_column_is_total() {
        let records = vec![
            Record::new("a").with_field("ref", "n/a"),
            Record::new("b").with_field("ref", 5i64),
            Record::new("c").with_field("ref", "2024-01-01"),
        ];
        let sorted = apply(&records, &SortState::asc("ref"));
        assert_eq!(ids(&sorted), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_sort_subset() {
        let records = vec![
            Record::new("a").with_field("n", 3i64),
            Record::new("b").with_field("n", 1i64),
            Record::new("c").with_field("n", 2i64),
        ];
        let mut subset = vec![0, 2];
        sort_subset(&records, &mut subset, &SortState::asc("n"));
        assert_eq!(subset, vec![2, 0]);
    }

    #[test]
    fn test_compare_values_missing() {
        let v = Value::Int(1);
        assert_eq!(compare_values(Some(&v), None, SortDirection::Desc), Ordering::Less);
        assert_eq!(compare_values(None, None, SortDirection::Asc), Ordering::Equal);
    }
}
