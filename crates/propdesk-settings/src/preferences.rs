//! Persisted view preferences
//!
//! Plain `key -> string` pairs such as `invoices_density = "compact"` or
//! `technicalObjects_viewMode = "table"`. The file is read once when the
//! store is opened and rewritten on every change.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::settings_file::preferences_file;
use crate::{Result, SettingsError};

/// Preference key of a view setting, e.g. `view_key("invoices", "density")`
pub fn view_key(view: &str, setting: &str) -> String {
    format!("{}_{}", view, setting)
}

#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl PreferenceStore {
    /// Open the store in the user config directory
    pub fn open_default() -> Result<Self> {
        Self::open(preferences_file()?)
    }

    /// Open a store backed by `path`. A missing file is an empty store; an
    /// unreadable one is logged and treated as empty so a corrupt file never
    /// blocks the views.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|source| SettingsError::Io {
                path: path.clone(),
                source,
            })?;
            match serde_json::from_str(&content) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable preferences");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set a value and persist the store
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        let value = value.into();
        if self.values.get(&key) == Some(&value) {
            return Ok(());
        }
        self.values.insert(key, value);
        self.save()
    }

    /// Remove a value, persisting when something was removed
    pub fn remove(&mut self, key: &str) -> Result<Option<String>> {
        let removed = self.values.remove(key);
        if removed.is_some() {
            self.save()?;
        }
        Ok(removed)
    }

    /// All pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = serde_json::to_string_pretty(&self.values)
            .map_err(|e| SettingsError::Serialize(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), "saved preferences");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_persists_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("propdesk").join("preferences.json");

        let mut store = PreferenceStore::open(&path).unwrap();
        assert!(store.is_empty());
        store.set(view_key("invoices", "density"), "compact").unwrap();
        store.set("technicalObjects_viewMode", "table").unwrap();

        let reopened = PreferenceStore::open(&path).unwrap();
        assert_eq!(reopened.get("invoices_density"), Some("compact"));
        assert_eq!(
            reopened.iter().collect::<Vec<_>>(),
            vec![
                ("invoices_density", "compact"),
                ("technicalObjects_viewMode", "table"),
            ]
        );
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        let mut store = PreferenceStore::open(&path).unwrap();
        store.set("tasks_density", "ultra").unwrap();

        assert_eq!(store.remove("tasks_density").unwrap(), Some("ultra".into()));
        assert_eq!(store.remove("tasks_density").unwrap(), None);
        assert!(PreferenceStore::open(&path).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut store = PreferenceStore::open(&path).unwrap();
        assert!(store.is_empty());
        store.set("tenants_density", "normal").unwrap();
        assert_eq!(
            PreferenceStore::open(&path).unwrap().get("tenants_density"),
            Some("normal")
        );
    }
}
