pub mod config;
pub mod install;
pub mod list;
pub mod search;

use crate::cli::Cli;
use glossa_core::service::Background;
use glossa_core::storage::Storage;
use glossa_core::{build_registry_enabled_only, Settings};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Dictionary '{0}' not found")]
    DictionaryNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Settings error: {0}")]
    Settings(#[from] glossa_core::settings::SettingsError),

    #[error("Storage error: {0}")]
    Storage(#[from] glossa_core::storage::StoreError),

    #[error("Install error: {0}")]
    Install(#[from] glossa_core::install::InstallError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CommandError>;

pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let path = cli.settings.clone().unwrap_or_else(Settings::default_path);
    debug!(path = %path.display(), "loading settings");
    Ok(Settings::load(&path)?)
}

/// Start a background service over the on-disk storage areas. The CLI has
/// no tabs, so relayed messages get no reply.
pub async fn start_background(settings: &Settings) -> Result<Background> {
    let registry = build_registry_enabled_only(settings.config_sync);
    let storage = Storage::in_dir(&settings.data_dir());
    Ok(Background::start(registry, storage, None, settings).await?)
}
