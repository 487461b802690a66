use propdesk_cache::{CacheConfig, DEFAULT_HIGH_WATER_MARK, DEFAULT_TTL};
use propdesk_grid::{Density, DensityPageSizes, PageSizePolicy, PaginationState};
use propdesk_services::{DEFAULT_DISPLAY_DELAY, FetchConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::settings_file::engine_config_file;
use crate::{Result, SettingsError};

/// Engine tuning loaded from `engine.toml`. Missing keys use defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub cache: CacheSettings,
    pub fetch: FetchSettings,
    pub pagination: PaginationSettings,
    pub bulk: BulkSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub default_ttl_secs: u64,
    pub high_water_mark: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            default_ttl_secs: DEFAULT_TTL.as_secs(),
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub coalesce_misses: bool,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            coalesce_misses: true,
            base_url: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PaginationSettings {
    pub default_density: Density,
    pub page_sizes: DensityPageSizes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkSettings {
    pub display_delay_ms: u64,
}

impl Default for BulkSettings {
    fn default() -> Self {
        Self {
            display_delay_ms: DEFAULT_DISPLAY_DELAY.as_millis() as u64,
        }
    }
}

impl EngineConfig {
    /// Load from the user config directory, defaults when the file is absent
    pub fn load() -> Result<Self> {
        Self::load_from(&engine_config_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no engine config, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SettingsError::Serialize(e.to_string()))?;
        std::fs::write(path, content).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            default_ttl: Duration::from_secs(self.cache.default_ttl_secs),
            high_water_mark: self.cache.high_water_mark,
        }
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            coalesce_misses: self.fetch.coalesce_misses,
            ttl: None,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_secs)
    }

    /// Initial pagination of a list view, at `density` or the configured default
    pub fn pagination(&self, density: Option<Density>) -> PaginationState {
        let density = density.unwrap_or(self.pagination.default_density);
        PaginationState::new(PageSizePolicy::Auto(density))
            .with_density_sizes(self.pagination.page_sizes)
    }

    pub fn display_delay(&self) -> Duration {
        Duration::from_millis(self.bulk.display_delay_ms)
    }
}
