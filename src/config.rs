//! Persistent CLI preferences (spec.md 4.F).
//!
//! Grounded on `dwetterau-photo-manager`'s `AppConfig`
//! (`config_path()`/`load()`/`save()` via `dirs::config_dir()` +
//! `serde_json`), generalized from UI view-state fields to the
//! CLI-appropriate preferences a dedup indexer actually needs to remember
//! between runs.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Catalog database used the last time no `--db` flag was given.
    #[serde(default)]
    pub last_db_path: Option<PathBuf>,
    /// Verbosity applied when `-v` isn't passed on the command line.
    #[serde(default)]
    pub default_verbosity: u8,
    /// External table-browser binary launched by `scan -b/--browse`
    /// (spec.md 6). `None` means the flag is a no-op; this crate does not
    /// bundle a browser of its own (spec.md 1, out of scope).
    #[serde(default)]
    pub table_browser: Option<String>,
}

impl Config {
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("deduper");

        fs::create_dir_all(&config_dir).ok();
        config_dir.join("config.json")
    }

    pub fn load() -> Self {
        let path = Self::config_path();
        if path.exists() {
            fs::read_to_string(&path)
                .ok()
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or_default()
        } else {
            Self::default()
        }
    }

    pub fn save(&self) -> Result<(), String> {
        let path = Self::config_path();
        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_zero_verbosity_and_no_remembered_path() {
        let config = Config::default();
        assert_eq!(config.default_verbosity, 0);
        assert!(config.last_db_path.is_none());
    }

    #[test]
    fn round_trips_through_json() {
        let config = Config {
            last_db_path: Some(PathBuf::from("/tmp/catalog.sqlite")),
            default_verbosity: 2,
            table_browser: Some("sqlitebrowser".to_string()),
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config.last_db_path, back.last_db_path);
        assert_eq!(config.default_verbosity, back.default_verbosity);
        assert_eq!(config.table_browser, back.table_browser);
    }
}
