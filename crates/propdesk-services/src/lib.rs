//! Propdesk Services Layer
//!
//! This crate sits between the list views and the REST API. It owns the
//! read-through fetch wrapper in front of the response cache and the bulk
//! action orchestrator that runs archive/delete/edit/export over a selection.
//!
//! # Architecture
//!
//! ```text
//! View layer (propdesk-cli, ...)
//!     ↓
//! Service Layer (propdesk-services) ← This crate
//!     ↓
//! Engine (propdesk-grid, propdesk-cache, propdesk-interchange)
//!     ↓
//! Shared types (propdesk-core)
//! ```
//!
//! # Services
//!
//! - [`FetchService`] - cache-aside reads and invalidating writes
//! - [`BulkActionService`] - one bulk run at a time with progress reporting
//!
//! The network is reached through the [`Transport`] trait; [`HttpTransport`]
//! is the `reqwest` implementation.

mod bulk_action_service;
mod error;
mod fetch_service;
mod transport;

#[cfg(test)]
mod test_support;

pub use bulk_action_service::{
    BulkActionRun, BulkActionService, BulkItemExecutor, BulkItemFailure, BulkOperation,
    BulkOutcome, BulkStatus, DEFAULT_DISPLAY_DELAY, RestBulkExecutor,
};
pub use error::{BulkError, FetchError, FetchResult, ItemError};
pub use fetch_service::{DASHBOARD_SUMMARY_PATH, FetchConfig, FetchService, InvalidationMap};
pub use transport::{HttpMethod, HttpTransport, Transport};
