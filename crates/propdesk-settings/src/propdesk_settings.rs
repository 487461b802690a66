//! Engine configuration and persisted view preferences
//!
//! `engine.toml` tunes the engine (cache TTL, page sizes, bulk display
//! delay); `preferences.json` remembers per-view choices such as density or
//! view mode across sessions.

mod engine_config;
mod preferences;
mod settings_file;

use std::path::PathBuf;
use thiserror::Error;

pub use engine_config::{
    BulkSettings, CacheSettings, EngineConfig, FetchSettings, PaginationSettings,
};
pub use preferences::{PreferenceStore, view_key};
pub use settings_file::{config_dir, data_dir, engine_config_file, exports_dir, preferences_file};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Could not determine the {0} directory")]
    NoDirectory(&'static str),

    #[error("Failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Failed to serialize settings: {0}")]
    Serialize(String),
}

pub type Result<T> = std::result::Result<T, SettingsError>;
