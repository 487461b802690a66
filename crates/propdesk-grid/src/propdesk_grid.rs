//! Client-side tabular engine for list views
//!
//! Takes a raw record set and produces a searched, filtered, sorted,
//! paginated and selectable view of it:
//!
//! - `filtering` - free-text search and structured field filters
//! - `sorting` - stable, type-aware single-key sort
//! - `pagination` - fixed, density-driven or single-page slicing
//! - `selection` - id-keyed selection that survives paging and filtering
//! - `columns` - closed set of column descriptors and their cell rendering
//! - `data_grid` - composes the above and reacts to user intents
//!
//! Every computation here is synchronous and infallible.

pub mod columns;
pub mod data_grid;
mod filter_types;
pub mod filtering;
pub mod pagination;
pub mod selection;
pub mod sorting;

#[cfg(test)]
mod property_tests;

pub use columns::{BadgeTone, BadgeVariant, Cell, Column, ColumnKind, RowAction};
pub use data_grid::{
    DataGrid, GridIntent, GridOutcome, GridRow, GridView, NavigationTarget, SelectionSummary,
};
pub use filter_types::*;
pub use pagination::{
    DEFAULT_PAGE_SIZE_COMFORTABLE, DEFAULT_PAGE_SIZE_COMPACT, DEFAULT_PAGE_SIZE_NORMAL,
    DEFAULT_PAGE_SIZE_ULTRA, Density, DensityPageSizes, Page, PageSizePolicy, PaginationState,
    paginate,
};
pub use selection::{Selection, VisibleSelection};
