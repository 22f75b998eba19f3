//! Auth Gateway - Main Entry Point

use anyhow::Context;
use auth_gateway::{Config, LoggingConfig, ShutdownCoordinator, init_logging, run, wait_for_signal};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    init_logging(&LoggingConfig::from(&config));

    info!(
        host = %config.auth_host,
        port = config.auth_port,
        max_retries = config.max_retries,
        "Starting Auth Gateway"
    );

    let coordinator = ShutdownCoordinator::new();
    let signal = coordinator.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        coordinator.trigger();
    });

    run(&config, signal.recv())
        .await
        .context("auth gateway terminated with an error")?;

    info!("Auth Gateway stopped");
    Ok(())
}
