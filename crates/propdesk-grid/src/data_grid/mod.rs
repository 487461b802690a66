//! Data grid: the composed list view
//!
//! Holds the record set together with the view state (search, field
//! filters, sort, page, selection) and re-derives the visible rows after
//! every intent. The rendering layer only reads [`GridView`] and sends
//! [`GridIntent`]s back; it never filters, sorts or pages on its own.

mod intents;

pub use intents::{GridIntent, GridOutcome, NavigationTarget};

use propdesk_core::{Record, RecordId};

use crate::columns::{Cell, Column};
use crate::filter_types::{FilterConfig, FilterState, SortState};
use crate::filtering;
use crate::pagination::{Density, Page, PageSizePolicy, PaginationState, paginate};
use crate::selection::{Selection, VisibleSelection};
use crate::sorting;

/// One rendered row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub id: RecordId,
    pub cells: Vec<Cell>,
    pub selected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSummary {
    /// Selected ids across the whole record set
    pub count: usize,
    /// Selected ids that pass the current filters
    pub in_filtered: usize,
    /// Header checkbox over the current page
    pub visible: VisibleSelection,
}

/// Everything the rendering layer needs for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct GridView {
    pub headers: Vec<String>,
    pub page: Page<GridRow>,
    pub sort: Option<SortState>,
    pub selection: SelectionSummary,
    pub density: Option<Density>,
    /// Whether row checkboxes are shown
    pub selectable: bool,
}

#[derive(Debug, Clone)]
pub struct DataGrid {
    columns: Vec<Column>,
    records: Vec<Record>,
    filter_config: FilterConfig,
    filter: FilterState,
    sort: Option<SortState>,
    pagination: PaginationState,
    selection: Selection,
    selectable: bool,
    row_link: Option<String>,
    /// Positions into `records` that pass the filters, in display order
    view_indices: Vec<usize>,
}

impl DataGrid {
    /// Create a grid whose searchable fields come from the columns
    pub fn new(columns: Vec<Column>, records: Vec<Record>) -> Self {
        let filter_config = FilterConfig {
            searchable_fields: columns
                .iter()
                .filter(|c| c.searchable)
                .map(|c| c.key.clone())
                .collect(),
            filterable_fields: Vec::new(),
        };

        let mut grid = Self {
            columns,
            records,
            filter_config,
            filter: FilterState::default(),
            sort: None,
            pagination: PaginationState::default(),
            selection: Selection::new(),
            selectable: true,
            row_link: None,
            view_indices: Vec::new(),
        };
        grid.rederive();
        grid
    }

    /// Replace the filter configuration. An empty searchable list keeps the
    /// fields derived from the columns.
    pub fn with_filter_config(mut self, config: FilterConfig) -> Self {
        let searchable_fields = if config.searchable_fields.is_empty() {
            std::mem::take(&mut self.filter_config.searchable_fields)
        } else {
            config.searchable_fields
        };
        self.filter_config = FilterConfig {
            searchable_fields,
            filterable_fields: config.filterable_fields,
        };
        self.rederive();
        self
    }

    pub fn with_pagination(mut self, pagination: PaginationState) -> Self {
        self.pagination = pagination;
        self.rederive();
        self
    }

    pub fn with_sort(mut self, sort: SortState) -> Self {
        self.sort = Some(sort);
        self.rederive();
        self
    }

    pub fn with_filter(mut self, filter: FilterState) -> Self {
        self.filter = filter;
        self.rederive();
        self
    }

    /// A non-selectable grid ignores the row and page selection intents
    pub fn with_selectable(mut self, selectable: bool) -> Self {
        self.selectable = selectable;
        self
    }

    pub fn is_selectable(&self) -> bool {
        self.selectable
    }

    /// Row-link template; `{id}` is replaced by the clicked record's id
    pub fn with_row_link(mut self, template: impl Into<String>) -> Self {
        self.row_link = Some(template.into());
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn filter_config(&self) -> &FilterConfig {
        &self.filter_config
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    pub fn pagination(&self) -> &PaginationState {
        &self.pagination
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn density(&self) -> Option<Density> {
        match self.pagination.policy {
            PageSizePolicy::Auto(density) => Some(density),
            _ => None,
        }
    }

    /// Records that pass the filters, in display order
    pub fn filtered_records(&self) -> Vec<&Record> {
        self.view_indices.iter().map(|&ix| &self.records[ix]).collect()
    }

    pub fn filtered_ids(&self) -> Vec<RecordId> {
        self.view_indices
            .iter()
            .map(|&ix| self.records[ix].id.clone())
            .collect()
    }

    pub fn filtered_count(&self) -> usize {
        self.view_indices.len()
    }

    /// Ids on the current page
    pub fn visible_ids(&self) -> Vec<RecordId> {
        paginate(&self.view_indices, &self.pagination)
            .items
            .into_iter()
            .map(|ix| self.records[ix].id.clone())
            .collect()
    }

    /// Selected records in source order, whether or not they pass the filters
    pub fn selected_records(&self) -> Vec<&Record> {
        self.records
            .iter()
            .filter(|r| self.selection.is_selected(&r.id))
            .collect()
    }

    /// Swap in a fresh record set. Selected ids whose records are gone are dropped.
    pub fn set_records(&mut self, records: Vec<Record>) {
        self.records = records;
        let dropped = self
            .selection
            .retain_existing(self.records.iter().map(|r| &r.id));
        if dropped > 0 {
            tracing::debug!(dropped, "dropped selection of removed records");
        }
        self.rederive();
    }

    /// Remove records (after an archive or delete) and their selection
    pub fn remove_records(&mut self, ids: &[RecordId]) {
        let removed: std::collections::HashSet<&RecordId> = ids.iter().collect();
        let records = std::mem::take(&mut self.records)
            .into_iter()
            .filter(|r| !removed.contains(&r.id))
            .collect();
        self.set_records(records);
    }

    /// Apply a user intent and re-derive the view
    pub fn handle(&mut self, intent: GridIntent) -> GridOutcome {
        tracing::trace!(intent = ?intent, "grid intent");
        let selects = matches!(
            intent,
            GridIntent::ToggleRow { .. } | GridIntent::SelectVisible | GridIntent::InvertVisible
        );
        if selects && !self.selectable {
            return GridOutcome::Ignored;
        }

        let outcome = match intent {
            GridIntent::Sort { key } => {
                let sortable = self.columns.iter().any(|c| c.key == key && c.sortable);
                if !sortable {
                    return GridOutcome::Ignored;
                }
                let next = SortState::toggle(self.sort.as_ref(), &key);
                tracing::debug!(key = %next.key, direction = next.direction.label(), "sort applied");
                self.sort = Some(next);
                GridOutcome::Updated
            }
            GridIntent::RowClick { id } => return self.navigation_target(&id),
            GridIntent::ToggleRow { id } => {
                if !self.records.iter().any(|r| r.id == id) {
                    return GridOutcome::Ignored;
                }
                self.selection.toggle(&id);
                GridOutcome::Updated
            }
            GridIntent::SelectVisible => {
                let visible = self.visible_ids();
                self.selection.select_visible(&visible);
                GridOutcome::Updated
            }
            GridIntent::InvertVisible => {
                let visible = self.visible_ids();
                self.selection.invert_visible(&visible);
                GridOutcome::Updated
            }
            GridIntent::ClearSelection => {
                self.selection.clear();
                GridOutcome::Updated
            }
            GridIntent::SetDensity(density) => {
                self.pagination.set_policy(PageSizePolicy::Auto(density));
                GridOutcome::Updated
            }
            GridIntent::SetPageSize(policy) => {
                self.pagination.set_policy(policy);
                GridOutcome::Updated
            }
            GridIntent::GoToPage(page) => {
                self.pagination.go_to(page, self.view_indices.len());
                GridOutcome::Updated
            }
            GridIntent::NextPage => {
                self.pagination.next(self.view_indices.len());
                GridOutcome::Updated
            }
            GridIntent::PrevPage => {
                self.pagination.prev();
                GridOutcome::Updated
            }
            GridIntent::SetSearch(query) => {
                self.filter.text_query = query;
                GridOutcome::Updated
            }
            GridIntent::SetFieldFilter { field, filter } => {
                match filter {
                    Some(filter) => self.filter.set_filter(field, filter),
                    None => {
                        self.filter.remove_filter(&field);
                    }
                }
                GridOutcome::Updated
            }
            GridIntent::ResetFilters => {
                self.filter.reset();
                GridOutcome::Updated
            }
        };
        self.rederive();
        outcome
    }

    fn navigation_target(&self, id: &RecordId) -> GridOutcome {
        let Some(template) = &self.row_link else {
            return GridOutcome::Ignored;
        };
        if !self.records.iter().any(|r| &r.id == id) {
            return GridOutcome::Ignored;
        }
        GridOutcome::Navigate(NavigationTarget {
            path: template.replace("{id}", id.as_str()),
            record_id: id.clone(),
        })
    }

    /// Recompute filtered and sorted positions and clamp the page
    fn rederive(&mut self) {
        self.view_indices = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| filtering::record_matches(record, &self.filter, &self.filter_config))
            .map(|(ix, _)| ix)
            .collect();

        if let Some(sort) = &self.sort {
            sorting::sort_subset(&self.records, &mut self.view_indices, sort);
        }

        self.pagination.clamp(self.view_indices.len());
    }

    /// Render the current page
    pub fn view(&self) -> GridView {
        let index_page = paginate(&self.view_indices, &self.pagination);

        let rows: Vec<GridRow> = index_page
            .items
            .iter()
            .map(|&ix| {
                let record = &self.records[ix];
                GridRow {
                    id: record.id.clone(),
                    cells: self.columns.iter().map(|c| c.render(record)).collect(),
                    selected: self.selection.is_selected(&record.id),
                }
            })
            .collect();

        let visible = self.selection.visible_state(rows.iter().map(|r| &r.id));
        let in_filtered = self
            .selection
            .count_within(self.view_indices.iter().map(|&ix| &self.records[ix].id));

        GridView {
            headers: self.columns.iter().map(|c| c.header.clone()).collect(),
            page: Page {
                items: rows,
                current_page: index_page.current_page,
                total_pages: index_page.total_pages,
                from: index_page.from,
                to: index_page.to,
                total: index_page.total,
            },
            sort: self.sort.clone(),
            selection: SelectionSummary {
                count: self.selection.count(),
                in_filtered,
                visible,
            },
            density: self.density(),
            selectable: self.selectable,
        }
    }
}
