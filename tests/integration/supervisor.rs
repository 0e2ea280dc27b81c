use std::net::TcpListener;
use std::time::Duration;

use crate::common::{fresh_database, test_config};

/// Find `n` consecutive free ports, holding no sockets open on return.
fn consecutive_free_ports(n: u16) -> u16 {
    for _ in 0..16 {
        let probe = TcpListener::bind("127.0.0.1:0").expect("Failed to probe for a port");
        let start = probe.local_addr().unwrap().port();
        drop(probe);

        let all_free = (0..n).all(|i| {
            start
                .checked_add(i)
                .map(|p| TcpListener::bind(("127.0.0.1", p)).is_ok())
                .unwrap_or(false)
        });
        if all_free {
            return start;
        }
    }
    panic!("Could not find {n} consecutive free ports");
}

#[tokio::test]
async fn every_worker_in_the_pool_answers_the_liveness_probe() {
    let database = fresh_database().await;
    let images_dir = tempfile::tempdir().unwrap();
    let mut config = test_config(database, &images_dir);
    config.server.workers = 2;
    config.server.start_port = consecutive_free_ports(2);
    let start_port = config.server.start_port;

    let pool = tokio::spawn(imagebin::supervisor::run(config));

    // The supervisor itself only reports the fleet ready after this same
    // probe succeeds against every worker.
    let client = reqwest::Client::new();
    for i in 0..2u16 {
        let url = format!("http://127.0.0.1:{}/", start_port + i);
        imagebin::supervisor::wait_for_live(&client, &url, 50)
            .await
            .unwrap_or_else(|e| panic!("worker on port {} never became live: {e}", start_port + i));
    }

    pool.abort();
}

#[tokio::test]
async fn readiness_probe_gives_up_on_a_dead_endpoint() {
    let port = consecutive_free_ports(1);
    let client = reqwest::Client::new();

    let result =
        imagebin::supervisor::wait_for_live(&client, &format!("http://127.0.0.1:{port}/"), 3).await;

    let err = result.expect_err("probe must fail when nothing is listening");
    assert!(err.to_string().contains("no successful response"), "{err:#}");
}

#[tokio::test]
async fn pool_startup_fails_fast_when_a_port_is_taken() {
    let database = fresh_database().await;
    let images_dir = tempfile::tempdir().unwrap();
    let mut config = test_config(database, &images_dir);

    // Occupy the single worker's port for the duration of the test.
    let blocker = TcpListener::bind("127.0.0.1:0").unwrap();
    config.server.workers = 1;
    config.server.start_port = blocker.local_addr().unwrap().port();

    let result = tokio::time::timeout(Duration::from_secs(30), imagebin::supervisor::run(config))
        .await
        .expect("supervisor did not fail within the timeout");

    let err = result.expect_err("supervisor must fail when the port is taken");
    assert!(err.to_string().contains("failed to bind"), "{err:#}");
}

#[tokio::test]
async fn pool_startup_fails_when_the_database_is_unreachable() {
    let database = {
        let mut db = fresh_database().await;
        // Nothing listens here.
        db.port = 1;
        db
    };
    let images_dir = tempfile::tempdir().unwrap();
    let mut config = test_config(database, &images_dir);
    config.server.workers = 1;
    config.server.start_port = consecutive_free_ports(1);

    let result = tokio::time::timeout(Duration::from_secs(60), imagebin::supervisor::run(config))
        .await
        .expect("supervisor did not fail within the timeout");

    let err = result.expect_err("supervisor must fail when the database is unreachable");
    assert!(err.to_string().contains("database unavailable"), "{err:#}");
}
