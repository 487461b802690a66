//! Propdesk Core - shared types for the back-office data engine
//!
//! This crate provides the fundamental types every other propdesk crate
//! depends on:
//!
//! - `Value` - dynamically typed field value decoded from API payloads
//! - `Record` / `RecordId` - an opaque domain entity with a stable identifier
//! - `ResourceKind` - the REST resources the back office works with
//! - `PropdeskError` - the shared error type

mod error;
mod record;
mod resource;
mod types;

pub use error::*;
pub use record::*;
pub use resource::*;
pub use types::*;
