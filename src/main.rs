use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use imagebin::config::AppConfig;
use imagebin::supervisor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    info!(
        workers = config.server.workers,
        start_port = config.server.start_port,
        images_dir = %config.storage.images_dir.display(),
        "starting worker pool"
    );

    supervisor::run(config).await
}
