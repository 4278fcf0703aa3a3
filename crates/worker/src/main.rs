//! cachework entry point.
//!
//! Boots the worker, runs the install/activate transitions, then serves
//! the control channel over stdio: one JSON message per line on stdin,
//! replies on stdout. Logging goes to stderr so it never interferes with
//! the message protocol.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use cachework_client::{FetchClient, FetchConfig};
use cachework_core::WorkerConfig;
use cachework_worker::{Worker, control};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = WorkerConfig::load()?;
    tracing::info!(version = %config.cache_version, "cachework loaded");

    let fetcher = Arc::new(FetchClient::new(FetchConfig::from_worker(&config))?);
    let worker = Worker::new(config, fetcher);

    // Both transitions are awaited in full before commands are served.
    worker.install().await;
    worker.activate().await;

    serve_control_channel(&worker).await
}

/// Read tagged JSON commands line by line and write replies to stdout.
async fn serve_control_channel(worker: &Worker) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let message: serde_json::Value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "discarding malformed message");
                continue;
            }
        };

        let Some(command) = control::Command::parse(&message) else {
            continue;
        };

        if let Some(reply) = control::dispatch(worker, command).await {
            let mut out = serde_json::to_vec(&reply)?;
            out.push(b'\n');
            stdout.write_all(&out).await?;
            stdout.flush().await?;
        }
    }

    tracing::info!("control channel closed, shutting down");
    Ok(())
}
