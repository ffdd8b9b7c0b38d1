use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use glossa_core::{
    router::TabMessenger,
    service::Background,
    storage::Storage,
    transport::{FrameLink, HostTransport},
    Settings,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Stdout carries frames, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("GLOSSA_LOG")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| "glossa_host=info,glossa_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("Starting Glossa host");

    let settings_path = std::env::var_os("GLOSSA_SETTINGS")
        .map(Into::into)
        .unwrap_or_else(Settings::default_path);
    let settings = Settings::load(&settings_path)?;
    info!(
        settings = %settings_path.display(),
        data_dir = %settings.data_dir().display(),
        "settings loaded"
    );

    let registry = glossa_core::build_registry_enabled_only(settings.config_sync);
    let storage = Storage::in_dir(&settings.data_dir());

    // Relayed messages leave as forward frames on the same stdout.
    let (link, outbound) = FrameLink::new();
    let messenger: Arc<dyn TabMessenger> = link.clone();
    let background = Background::start(registry, storage, Some(messenger), &settings).await?;

    let transport = HostTransport::new(Arc::new(background), link, outbound);

    info!("Host ready, listening on stdio");

    tokio::select! {
        result = transport.run_stdio() => {
            if let Err(e) = result {
                error!("Transport error: {}", e);
                return Err(e.into());
            }
            info!("Input closed, shutting down");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
        }
    }

    Ok(())
}
