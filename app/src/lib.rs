//! Iron Bank application library

use std::path::PathBuf;

use anyhow::Context;
use ironbank_api::AppState;
use ironbank_core::AppConfig;

/// Default config file, relative to the working directory
const DEFAULT_CONFIG_PATH: &str = "ironbank.json";

/// Path named by `IRONBANK_CONFIG`, else the default
pub fn config_path() -> PathBuf {
    std::env::var_os("IRONBANK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load the config file and apply environment overrides
pub fn load_config() -> anyhow::Result<AppConfig> {
    let path = config_path();
    let config = AppConfig::from_file(&path)
        .with_context(|| format!("loading config from {}", path.display()))?
        .with_env_overrides()?;
    config.validate()?;
    Ok(config)
}

fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ironbank=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .init();
    Ok(())
}

/// Run the API server
pub async fn run() -> anyhow::Result<()> {
    init_tracing()?;

    tracing::info!("Starting Iron Bank application");

    let config = load_config()?;
    tracing::info!(
        network = %config.network,
        backend = %config.backend.url,
        "Configuration loaded"
    );

    let port = config.api_port;
    let state = AppState::new(config).context("creating backend client")?;

    ironbank_api::start_server(state, port)
        .await
        .with_context(|| format!("serving API on port {}", port))
}
