//! Settings file locations

use std::path::PathBuf;

use crate::{Result, SettingsError};

pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .ok_or(SettingsError::NoDirectory("config"))
        .map(|p| p.join("propdesk"))
}

pub fn data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .ok_or(SettingsError::NoDirectory("data"))
        .map(|p| p.join("propdesk"))
}

pub fn engine_config_file() -> Result<PathBuf> {
    config_dir().map(|p| p.join("engine.toml"))
}

pub fn preferences_file() -> Result<PathBuf> {
    config_dir().map(|p| p.join("preferences.json"))
}

/// Default output directory of exports
pub fn exports_dir() -> Result<PathBuf> {
    data_dir().map(|p| p.join("exports"))
}
