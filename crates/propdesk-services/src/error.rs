use propdesk_core::PropdeskError;
use thiserror::Error;

use crate::transport::HttpMethod;

pub type FetchResult<T> = Result<T, FetchError>;

/// Failures of a request. Never cached.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("{method} {url} returned status {status}")]
    Status {
        method: HttpMethod,
        url: String,
        status: u16,
    },

    #[error("Could not decode response: {0}")]
    Decode(String),

    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("{0} is not a write method")]
    NotAWrite(HttpMethod),
}

impl From<PropdeskError> for FetchError {
    fn from(error: PropdeskError) -> Self {
        FetchError::Decode(error.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(error: serde_json::Error) -> Self {
        FetchError::Decode(error.to_string())
    }
}

/// Failure of one item inside a bulk run
#[derive(Debug, Clone, Error)]
pub enum ItemError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Rejected(String),
}

/// Reasons a bulk run does not start
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BulkError {
    #[error("No records selected")]
    EmptySelection,

    #[error("A bulk action is already running")]
    AlreadyRunning,
}
