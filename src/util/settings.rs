use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use tracing::debug;

use crate::infra::OutputFormat;

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "CraftProfit";
const APP_NAME: &str = "CraftProfit";

/// Item kinds whose cost is listed in the price table rather than derived from a
/// recipe: crop, tree, collector, honey, seafood, material.
pub const DEFAULT_PRIMARY_KINDS: [&str; 6] = ["作物", "樹木", "収集機", "蜜", "海産物", "素材"];

pub const DEFAULT_UNSET_MARKER: &str = "nan";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub primary_kinds: Vec<String>,
    /// Printed in place of values that could not be resolved.
    pub unset_marker: String,
    pub format: OutputFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            primary_kinds: DEFAULT_PRIMARY_KINDS.iter().map(|k| k.to_string()).collect(),
            unset_marker: DEFAULT_UNSET_MARKER.to_string(),
            format: OutputFormat::default(),
        }
    }
}

pub fn default_settings_path() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join("settings.json"))
}

/// Loads settings from `explicit`, or from the platform config directory.
///
/// A missing default file yields defaults; a missing explicit file is an error.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, SettingsError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_settings_path() {
            Some(path) if path.exists() => path,
            _ => {
                debug!("no settings file, using defaults");
                return Ok(Settings::default());
            }
        },
    };

    let data = fs::read_to_string(&path).map_err(|source| SettingsError::Io {
        path: path.clone(),
        source,
    })?;
    let settings =
        serde_json::from_str(&data).map_err(|source| SettingsError::Parse {
            path: path.clone(),
            source,
        })?;
    debug!("loaded settings from {}", path.display());
    Ok(settings)
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "unset_marker": "-", "format": "json" }"#).unwrap();

        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.unset_marker, "-");
        assert_eq!(settings.format, OutputFormat::Json);
        assert_eq!(settings.primary_kinds, Settings::default().primary_kinds);
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_settings(Some(&dir.path().join("missing.json"))).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn malformed_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ primary_kinds: ").unwrap();
        assert!(matches!(
            load_settings(Some(&path)),
            Err(SettingsError::Parse { .. })
        ));
    }
}
