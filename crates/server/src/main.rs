use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use baler_core::{encode_response, ServiceError};
use baler_engine::AlgorithmRegistry;
use baler_server::{transport, JobQueue, ServerConfig, WorkerPool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "baler=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::parse();
    config.validate()?;

    // --- Algorithm registry (immutable after this point) ---
    let registry = Arc::new(
        AlgorithmRegistry::with_algorithms(&config.algorithms)
            .context("Failed to build the algorithm registry")?,
    );
    tracing::info!(algorithms = ?registry.names(), "Algorithm registry built");

    // --- Transport socket ---
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    tracing::info!(
        addr = %config.bind,
        workers = config.workers,
        queue_capacity = config.queue_capacity,
        overflow = ?config.overflow,
        "baler-server listening"
    );

    // --- Queue, workers, transport ---
    let shutdown = CancellationToken::new();
    let (queue, receiver) =
        JobQueue::bounded(config.queue_capacity, config.overflow, shutdown.clone());

    let pool = WorkerPool::spawn(
        config.workers,
        registry,
        receiver.clone(),
        config.max_decompressed_size,
    );
    let mut pool_handle = tokio::spawn(pool.run());
    let transport_handle = tokio::spawn(transport::run(listener, queue, shutdown.clone()));

    // --- Shutdown ---
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for the shutdown signal")?;
    tracing::info!("Shutdown signal received, draining");
    shutdown.cancel();

    if let Err(e) = transport_handle.await {
        tracing::warn!(error = %e, "Transport task failed");
    }

    // In-flight and already-queued jobs get the drain window to finish.
    let drain = Duration::from_secs(config.drain_timeout_secs);
    if tokio::time::timeout(drain, &mut pool_handle).await.is_err() {
        tracing::warn!(
            timeout_secs = config.drain_timeout_secs,
            "Drain timeout expired, aborting remaining workers"
        );
        pool_handle.abort();
    }

    // Whatever never reached a worker is failed, not silently dropped.
    for queued in receiver.drain().await {
        let mut job = queued.job;
        if job.fail(ServiceError::ShutdownInProgress).is_ok() {
            let _ = queued.reply.send(encode_response(&job)).await;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
