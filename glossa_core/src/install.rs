//! Install and update handling.
//!
//! Upgrading from a release whose major version is at most
//! [`RESET_MAX_MAJOR`] (or installing fresh) wipes both storage areas and
//! starts over from the default configuration. Later versions are left alone.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::CONFIG_KEY;
use crate::storage::{Storage, StoreError};
use crate::DictRegistry;

/// Highest previous major version whose stored data is discarded on update.
pub const RESET_MAX_MAJOR: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallReason {
    Install,
    Update,
    BrowserUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallDetails {
    pub reason: InstallReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_version: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallOutcome {
    /// Storage was cleared and defaults written
    Reset,
    Unchanged,
}

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("unreadable previous version '{0}'")]
    Version(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Major component of a version string. Accepts full semver (`4.2.0`) and
/// short forms such as `4.1` or `5`.
pub fn previous_major(version: &str) -> Result<u64, InstallError> {
    let version = version.trim().trim_start_matches('v');
    if let Ok(parsed) = semver::Version::parse(version) {
        return Ok(parsed.major);
    }
    version
        .split('.')
        .next()
        .and_then(|major| major.parse::<u64>().ok())
        .ok_or_else(|| InstallError::Version(version.to_string()))
}

/// Whether these details call for a full reset.
pub fn needs_reset(details: &InstallDetails) -> Result<bool, InstallError> {
    match details.previous_version.as_deref() {
        None => Ok(details.reason == InstallReason::Install),
        Some(version) => Ok(previous_major(version)? <= RESET_MAX_MAJOR),
    }
}

pub async fn handle_installed(
    details: &InstallDetails,
    storage: &Storage,
    registry: &DictRegistry,
) -> Result<InstallOutcome, InstallError> {
    if !needs_reset(details)? {
        info!(reason = ?details.reason, previous = ?details.previous_version, "no reset needed");
        return Ok(InstallOutcome::Unchanged);
    }

    info!(
        reason = ?details.reason,
        previous = ?details.previous_version,
        "resetting storage to the default configuration"
    );
    storage.local.clear().await?;
    storage.sync.clear().await?;

    let defaults = registry.defaults().clone();
    storage.sync.set(CONFIG_KEY, defaults.to_value()).await?;
    registry.set_configs(&defaults).await;

    Ok(InstallOutcome::Reset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_from(version: &str) -> InstallDetails {
        InstallDetails {
            reason: InstallReason::Update,
            previous_version: Some(version.to_string()),
        }
    }

    #[test]
    fn test_previous_major_forms() {
        assert_eq!(previous_major("4.2.0").unwrap(), 4);
        assert_eq!(previous_major("v6.0.1").unwrap(), 6);
        assert_eq!(previous_major("4.1").unwrap(), 4);
        assert_eq!(previous_major("3").unwrap(), 3);
        assert!(matches!(
            previous_major("beta"),
            Err(InstallError::Version(_))
        ));
    }

    #[test]
    fn test_reset_threshold() {
        assert!(needs_reset(&update_from("1.0.0")).unwrap());
        assert!(needs_reset(&update_from("4.9.9")).unwrap());
        assert!(!needs_reset(&update_from("5.0.0")).unwrap());
        assert!(!needs_reset(&update_from("6.1.2")).unwrap());
    }

    #[test]
    fn test_fresh_install_resets() {
        let fresh = InstallDetails {
            reason: InstallReason::Install,
            previous_version: None,
        };
        assert!(needs_reset(&fresh).unwrap());

        let browser = InstallDetails {
            reason: InstallReason::BrowserUpdate,
            previous_version: None,
        };
        assert!(!needs_reset(&browser).unwrap());
    }
}
