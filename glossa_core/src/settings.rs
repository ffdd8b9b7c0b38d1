//! Service settings, read from `~/.config/glossa/settings.toml`.
//!
//! These tune the background service itself and are separate from the
//! user-facing [`AppConfig`](crate::config::AppConfig) kept in storage.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What `set_configs` writes into every registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSyncPolicy {
    /// Every entry is reset to the built-in default; the incoming value is ignored.
    #[default]
    ResetToDefault,
    /// Every entry receives a copy of the incoming value.
    ApplyIncoming,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub config_sync: ConfigSyncPolicy,

    /// Upper bound for relayed tab round trips. Unbounded when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_timeout_ms: Option<u64>,

    /// Where file-backed storage areas live. Defaults to the platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Settings {
    /// Default settings file location.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|p| p.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("glossa")
            .join("settings.toml")
    }

    /// Load settings from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        Self::from_toml(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn relay_timeout(&self) -> Option<Duration> {
        self.relay_timeout_ms.map(Duration::from_millis)
    }

    /// Resolved directory for file-backed storage.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .or_else(|| dirs::home_dir().map(|p| p.join(".local").join("share")))
                .unwrap_or_else(|| PathBuf::from("."))
                .join("glossa")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.config_sync, ConfigSyncPolicy::ResetToDefault);
        assert!(settings.relay_timeout().is_none());
    }

    #[test]
    fn test_parse_all_fields() {
        let settings = Settings::from_toml(
            r#"
config_sync = "apply_incoming"
relay_timeout_ms = 1500
data_dir = "/tmp/glossa"
"#,
        )
        .unwrap();
        assert_eq!(settings.config_sync, ConfigSyncPolicy::ApplyIncoming);
        assert_eq!(settings.relay_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(settings.data_dir(), PathBuf::from("/tmp/glossa"));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_bad_policy_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "config_sync = \"merge\"").unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(SettingsError::Parse { .. })
        ));
    }
}
