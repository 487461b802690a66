//! Column descriptors and cell rendering
//!
//! Columns are a closed set of variants, each with its own render strategy.
//! A view declares its columns once; the grid derives its searchable fields
//! from them.

use itertools::Itertools;
use propdesk_core::{Record, Value};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Visual tone of an enum badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeTone {
    #[default]
    Neutral,
    Info,
    Success,
    Warning,
    Danger,
}

/// One known value of an enum column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeVariant {
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub tone: BadgeTone,
}

impl BadgeVariant {
    pub fn new(value: impl Into<String>, label: impl Into<String>, tone: BadgeTone) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            tone,
        }
    }
}

/// A per-row action button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowAction {
    pub id: String,
    pub label: String,
}

impl RowAction {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    /// Amount with two decimals and thousands grouping, followed by the currency code
    Currency { currency: String },
    /// Date or timestamp rendered with a `chrono` format string
    Date { format: String },
    EnumBadge { variants: Vec<BadgeVariant> },
    Action { actions: Vec<RowAction> },
}

/// A rendered cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Text(String),
    Badge { label: String, tone: BadgeTone },
    Actions(Vec<RowAction>),
}

impl Cell {
    /// Plain-text form for terminals and exports
    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.clone(),
            Cell::Badge { label, .. } => label.clone(),
            Cell::Actions(actions) => actions.iter().map(|a| a.label.as_str()).join(" | "),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Record field this column shows
    pub key: String,
    pub header: String,
    pub kind: ColumnKind,
    #[serde(default = "default_true")]
    pub sortable: bool,
    #[serde(default)]
    pub searchable: bool,
}

fn default_true() -> bool {
    true
}

impl Column {
    pub fn new(key: impl Into<String>, header: impl Into<String>, kind: ColumnKind) -> Self {
        let searchable = matches!(kind, ColumnKind::Text | ColumnKind::EnumBadge { .. });
        let sortable = !matches!(kind, ColumnKind::Action { .. });
        Self {
            key: key.into(),
            header: header.into(),
            kind,
            sortable,
            searchable,
        }
    }

    pub fn text(key: impl Into<String>, header: impl Into<String>) -> Self {
        Self::new(key, header, ColumnKind::Text)
    }

    pub fn currency(
        key: impl Into<String>,
        header: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self::new(
            key,
            header,
            ColumnKind::Currency {
                currency: currency.into(),
            },
        )
    }

    pub fn date(key: impl Into<String>, header: impl Into<String>, format: impl Into<String>) -> Self {
        Self::new(
            key,
            header,
            ColumnKind::Date {
                format: format.into(),
            },
        )
    }

    pub fn enum_badge(
        key: impl Into<String>,
        header: impl Into<String>,
        variants: Vec<BadgeVariant>,
    ) -> Self {
        Self::new(key, header, ColumnKind::EnumBadge { variants })
    }

    pub fn actions(key: impl Into<String>, header: impl Into<String>, actions: Vec<RowAction>) -> Self {
        Self::new(key, header, ColumnKind::Action { actions })
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    /// Render this column's cell for a record
    pub fn render(&self, record: &Record) -> Cell {
        if let ColumnKind::Action { actions } = &self.kind {
            return Cell::Actions(actions.clone());
        }

        let Some(value) = record.get(&self.key) else {
            return Cell::Empty;
        };

        match &self.kind {
            ColumnKind::Text => text_cell(value),
            ColumnKind::Currency { currency } => match value.as_f64() {
                Some(amount) => Cell::Text(format!("{} {}", format_amount(amount), currency)),
                None => text_cell(value),
            },
            ColumnKind::Date { format } => match value.as_datetime() {
                Some(dt) => {
                    // An invalid format string surfaces as a fmt error, not a panic
                    let mut out = String::new();
                    match write!(out, "{}", dt.format(format)) {
                        Ok(()) => Cell::Text(out),
                        Err(_) => text_cell(value),
                    }
                }
                None => text_cell(value),
            },
            ColumnKind::EnumBadge { variants } => {
                let raw = value.display_text().unwrap_or_default();
                match variants.iter().find(|v| v.value == raw) {
                    Some(variant) => Cell::Badge {
                        label: variant.label.clone(),
                        tone: variant.tone,
                    },
                    None => Cell::Badge {
                        label: raw,
                        tone: BadgeTone::Neutral,
                    },
                }
            }
            ColumnKind::Action { .. } => Cell::Empty,
        }
    }
}

fn text_cell(value: &Value) -> Cell {
    match value.display_text() {
        Some(text) if !text.is_empty() => Cell::Text(text),
        _ => Cell::Empty,
    }
}

/// `1234567.891` -> `1,234,567.89`
fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn invoice() -> Record {
        Record::new(9)
            .with_field("number", "INV-2024-009")
            .with_field("amount", Value::Decimal("1234567.891".into()))
            .with_field("due", "2024-03-01T00:00:00Z")
            .with_field("status", "overdue")
            .with_field("note", "")
    }

    #[test]
    fn test_text() {
        let column = Column::text("number", "Number");
        assert_eq!(column.render(&invoice()), Cell::Text("INV-2024-009".into()));
        assert_eq!(Column::text("missing", "x").render(&invoice()), Cell::Empty);
        assert_eq!(Column::text("note", "Note").render(&invoice()), Cell::Empty);
    }

    #[test]
    fn test_currency() {
        let column = Column::currency("amount", "Amount", "EUR");
        assert_eq!(column.render(&invoice()), Cell::Text("1,234,567.89 EUR".into()));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.5), "999.50");
        assert_eq!(format_amount(1000.0), "1,000.00");
        assert_eq!(format_amount(-45210.1), "-45,210.10");
        assert_eq!(format_amount(-0.001), "0.00");
    }

    #[test]
    fn test_date() {
        let column = Column::date("due", "Due", "%d.%m.%Y");
        assert_eq!(column.render(&invoice()), Cell::Text("01.03.2024".into()));
    }

    #[test]
    fn test_bad_date_format_falls_back() {
        let column = Column::date("due", "Due", "%Q");
        assert_eq!(column.render(&invoice()).text(), "2024-03-01T00:00:00Z");
    }

    #[test]
    fn test_enum_badge() {
        let column = Column::enum_badge(
            "status",
            "Status",
            vec![
                BadgeVariant::new("paid", "Paid", BadgeTone::Success),
                BadgeVariant::new("overdue", "Overdue", BadgeTone::Danger),
            ],
        );
        assert_eq!(
            column.render(&invoice()),
            Cell::Badge {
                label: "Overdue".into(),
                tone: BadgeTone::Danger
            }
        );

        let unknown = Record::new(1).with_field("status", "disputed");
        assert_eq!(column.render(&unknown).text(), "disputed");
    }

    #[test]
    fn test_actions_render_for_every_row() {
        let column = Column::actions(
            "_actions",
            "",
            vec![RowAction::new("open", "Open"), RowAction::new("archive", "Archive")],
        );
        assert!(!column.sortable);
        assert_eq!(column.render(&Record::new(1)).text(), "Open | Archive");
    }

    #[test]
    fn test_default_flags() {
        assert!(Column::text("a", "A").searchable);
        assert!(!Column::currency("a", "A", "EUR").searchable);
        assert!(Column::date("a", "A", "%Y").sortable);
    }
}
