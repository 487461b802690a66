//! Command-line view state: search, filters, sort, page and columns

use propdesk_core::{Record, Value};
use propdesk_grid::{
    Column, DataGrid, Density, FieldFilter, FilterState, GridIntent, PageSizePolicy,
    PaginationState, SortDirection, SortState,
};
use propdesk_interchange::column_order;

#[derive(Debug, Clone, Default, clap::Args)]
pub struct GridArgs {
    /// Free-text search over the shown text columns
    #[arg(long, short)]
    pub search: Option<String>,

    /// Field filter: `field=value`, `field=min..max` (either bound may be
    /// empty) or `field=a|b|c`
    #[arg(long = "filter", short = 'f', value_parser = parse_filter)]
    pub filters: Vec<(String, FieldFilter)>,

    /// Sort key, `field` or `field:desc`
    #[arg(long, value_parser = parse_sort)]
    pub sort: Option<SortState>,

    /// 1-based page; out-of-range pages are clamped
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Row density deciding the page size (ultra, compact, normal, comfortable)
    #[arg(long, value_parser = parse_density, conflicts_with_all = ["page_size", "all"])]
    pub density: Option<Density>,

    #[arg(long, conflicts_with = "all")]
    pub page_size: Option<usize>,

    /// Show every row on one page
    #[arg(long)]
    pub all: bool,

    /// Columns: `field`, `field:currency=CHF` or `field:date=%d.%m.%Y`
    #[arg(long, value_delimiter = ',', value_parser = parse_column)]
    pub columns: Vec<Column>,
}

impl GridArgs {
    fn page_size_policy(&self) -> Option<PageSizePolicy> {
        if self.all {
            Some(PageSizePolicy::All)
        } else if let Some(size) = self.page_size {
            Some(PageSizePolicy::Fixed(size.max(1)))
        } else {
            self.density.map(PageSizePolicy::Auto)
        }
    }

    pub fn filter_state(&self) -> FilterState {
        let mut state = FilterState::new();
        if let Some(query) = &self.search {
            state = state.with_query(query.clone());
        }
        for (field, filter) in &self.filters {
            state.set_filter(field.clone(), filter.clone());
        }
        state
    }

    /// Build the grid. `pagination` supplies density page sizes and the
    /// policy used when no size flag was given.
    pub fn build_grid(&self, records: Vec<Record>, mut pagination: PaginationState) -> DataGrid {
        let columns = if self.columns.is_empty() {
            column_order(&records)
                .into_iter()
                .map(|field| Column::text(field.clone(), field))
                .collect()
        } else {
            self.columns.clone()
        };

        if let Some(policy) = self.page_size_policy() {
            pagination.set_policy(policy);
        }

        let mut grid = DataGrid::new(columns, records)
            .with_filter(self.filter_state())
            .with_pagination(pagination);
        if let Some(sort) = &self.sort {
            grid = grid.with_sort(sort.clone());
        }
        grid.handle(GridIntent::GoToPage(self.page));
        grid
    }
}

/// Interpret a command-line literal as the most specific value type
pub(crate) fn parse_scalar(raw: &str) -> Value {
    let raw = raw.trim();
    if let Ok(int) = raw.parse::<i64>() {
        return Value::Int(int);
    }
    // "inf" and "nan" parse as floats but are meant as text
    if let Some(float) = raw.parse::<f64>().ok().filter(|f| f.is_finite()) {
        return Value::Float(float);
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::from(raw),
    }
}

fn parse_filter(raw: &str) -> Result<(String, FieldFilter), String> {
    let (field, criteria) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got '{}'", raw))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{}'", raw));
    }

    let filter = if let Some((min, max)) = criteria.split_once("..") {
        let bound = |s: &str| (!s.trim().is_empty()).then(|| parse_scalar(s));
        FieldFilter::between(bound(min), bound(max))
    } else if criteria.contains('|') {
        FieldFilter::one_of(criteria.split('|').map(parse_scalar))
    } else {
        FieldFilter::equals(parse_scalar(criteria))
    };
    Ok((field.to_string(), filter))
}

fn parse_sort(raw: &str) -> Result<SortState, String> {
    let (key, direction) = match raw.rsplit_once(':') {
        Some((key, "asc")) => (key, SortDirection::Asc),
        Some((key, "desc")) => (key, SortDirection::Desc),
        Some((_, other)) => return Err(format!("unknown sort direction '{}'", other)),
        None => (raw, SortDirection::Asc),
    };
    if key.trim().is_empty() {
        return Err("missing sort field".to_string());
    }
    Ok(SortState::new(key.trim(), direction))
}

fn parse_density(raw: &str) -> Result<Density, String> {
    Density::parse(raw).ok_or_else(|| {
        format!(
            "unknown density '{}', expected one of: {}",
            raw,
            Density::all()
                .iter()
                .map(|d| d.label())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })
}

fn parse_column(raw: &str) -> Result<Column, String> {
    let (field, kind) = match raw.split_once(':') {
        Some((field, kind)) => (field.trim(), Some(kind)),
        None => (raw.trim(), None),
    };
    if field.is_empty() {
        return Err(format!("missing column field in '{}'", raw));
    }

    match kind.map(|k| k.split_once('=').unwrap_or((k, ""))) {
        None => Ok(Column::text(field, field)),
        Some(("currency", code)) => {
            let code = if code.is_empty() { "CHF" } else { code };
            Ok(Column::currency(field, field, code))
        }
        Some(("date", format)) => {
            let format = if format.is_empty() { "%Y-%m-%d" } else { format };
            Ok(Column::date(field, field, format))
        }
        Some(("text", _)) => Ok(Column::text(field, field)),
        Some((other, _)) => Err(format!("unknown column type '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use propdesk_core::RecordId;
    use propdesk_grid::ColumnKind;

    fn properties(n: i64) -> Vec<Record> {
        (1..=n)
            .map(|i| {
                Record::new(i)
                    .with_field("name", format!("Haus {i}"))
                    .with_field("units", i % 7)
            })
            .collect()
    }

    #[test]
    fn test_parse_filter_shapes() {
        assert_eq!(
            parse_filter("status=open").unwrap(),
            ("status".to_string(), FieldFilter::equals("open"))
        );
        assert_eq!(
            parse_filter("units=2..").unwrap(),
            (
                "units".to_string(),
                FieldFilter::between(Some(Value::Int(2)), None)
            )
        );
        assert_eq!(
            parse_filter("status=open|done").unwrap().1,
            FieldFilter::one_of([Value::from("open"), Value::from("done")])
        );
        assert!(parse_filter("status").is_err());
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort("rent:desc").unwrap(), SortState::desc("rent"));
        assert_eq!(parse_sort("rent").unwrap(), SortState::asc("rent"));
        assert!(parse_sort("rent:sideways").is_err());
    }

    #[test]
    fn test_parse_column() {
        assert_eq!(
            parse_column("rent:currency=EUR").unwrap().kind,
            ColumnKind::Currency {
                currency: "EUR".into()
            }
        );
        assert_eq!(
            parse_column("due:date").unwrap().kind,
            ColumnKind::Date {
                format: "%Y-%m-%d".into()
            }
        );
        assert!(parse_column("x:chart").is_err());
    }

    #[test]
    fn test_build_grid_applies_args() {
        let args = GridArgs {
            filters: vec![parse_filter("units=3..").unwrap()],
            sort: Some(SortState::desc("units")),
            page_size: Some(5),
            page: 9,
            ..Default::default()
        };
        let grid = args.build_grid(properties(20), PaginationState::default());
        let view = grid.view();

        // units 3..=6 appear for ids 3-6, 10-13, 17-20
        assert_eq!(view.page.total, 12);
        assert_eq!(view.page.current_page, 3);
        assert_eq!(view.headers, vec!["name", "units"]);
        assert_eq!(view.page.items[0].id, RecordId::from(10));
    }

    #[test]
    fn test_default_pagination_used_without_flags() {
        let grid = GridArgs::default().build_grid(
            properties(30),
            PaginationState::new(PageSizePolicy::Auto(Density::Comfortable)),
        );
        assert_eq!(grid.view().page.items.len(), 12);
    }
}
