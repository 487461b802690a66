//! User intents sent to the grid and what it answers

use propdesk_core::RecordId;

use crate::filter_types::FieldFilter;
use crate::pagination::{Density, PageSizePolicy};

#[derive(Debug, Clone, PartialEq)]
pub enum GridIntent {
    /// Header click on a column
    Sort { key: String },
    RowClick { id: RecordId },
    ToggleRow { id: RecordId },
    SelectVisible,
    InvertVisible,
    ClearSelection,
    SetDensity(Density),
    SetPageSize(PageSizePolicy),
    GoToPage(usize),
    NextPage,
    PrevPage,
    SetSearch(String),
    /// `None` removes the field's filter
    SetFieldFilter {
        field: String,
        filter: Option<FieldFilter>,
    },
    ResetFilters,
}

/// Where a row click leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTarget {
    pub path: String,
    pub record_id: RecordId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridOutcome {
    /// State changed; re-render from `view()`
    Updated,
    Navigate(NavigationTarget),
    /// Nothing to do (unknown row, unsortable column, no row link)
    Ignored,
}
