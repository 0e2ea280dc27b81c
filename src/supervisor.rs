use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::info;

use crate::build_router;
use crate::config::AppConfig;
use crate::database;
use crate::state::AppState;
use crate::storage::ImageStore;

/// Starts `server.workers` independent workers on the contiguous ports
/// `[start_port, start_port + workers)` and supervises them.
///
/// Workers share nothing in process: each owns its own database pool and
/// serves its own router. The images directory and the database endpoint
/// are the only common resources. Any startup failure (a port that cannot
/// be bound, an unreachable database, a port range running past 65535) is
/// fatal for the whole pool, as is a worker exiting later. The pool is
/// reported ready only after every worker has answered its liveness probe.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let store = ImageStore::init(&config.storage.images_dir)
        .await
        .context("failed to open images directory")?;

    let mut workers = JoinSet::new();

    let mut ports = Vec::with_capacity(config.server.workers as usize);

    for i in 0..config.server.workers {
        let port = config
            .server
            .start_port
            .checked_add(i)
            .with_context(|| format!("worker {i}: port range exceeds 65535"))?;
        ports.push(port);

        let db = database::init_db(&config.database)
            .await
            .with_context(|| format!("worker {i}: database unavailable"))?;
        let state = AppState {
            db: std::sync::Arc::new(db),
            store: store.clone(),
            config: config.clone(),
        };
        let app = build_router(state);

        let listener = TcpListener::bind((config.server.host.as_str(), port))
            .await
            .with_context(|| format!("worker {i}: failed to bind port {port}"))?;
        info!(worker = i, port, "worker listening");

        workers.spawn(async move { axum::serve(listener, app).await });
    }

    // The fleet is only healthy once every worker answers its liveness
    // probe, not merely once the listeners are bound.
    let client = reqwest::Client::new();
    for (i, port) in ports.iter().enumerate() {
        let url = format!("http://{}:{port}/", config.server.host);
        wait_for_live(&client, &url, 50)
            .await
            .with_context(|| format!("worker {i}: liveness probe never answered"))?;
    }

    info!(workers = config.server.workers, "all workers ready");

    while let Some(joined) = workers.join_next().await {
        let served = joined.context("worker task panicked")?;
        served.context("worker server error")?;
        anyhow::bail!("worker exited unexpectedly");
    }

    Ok(())
}

/// Polls `url` until it answers 200, up to `attempts` tries 100ms apart.
pub async fn wait_for_live(
    client: &reqwest::Client,
    url: &str,
    attempts: u32,
) -> anyhow::Result<()> {
    for _ in 0..attempts {
        if let Ok(res) = client.get(url).send().await {
            if res.status().is_success() {
                return Ok(());
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    anyhow::bail!("no successful response from {url} after {attempts} attempts")
}
