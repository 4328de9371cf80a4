//! Edge Worker - local runtime host
//!
//! This binary:
//! - Serves every HTTP request through the linked worker's `fetch`
//! - Loads the worker's bindings from `.dev.vars` and the environment
//! - Optionally delivers scheduled events on an interval

mod bindings;
mod config;
mod router;
mod scheduler;
mod tasks;

use anyhow::Result;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edge_worker_sdk::{Env, Fetcher, HttpFetcher, Worker};
use hello_worker::HelloWorker;

use crate::config::HostConfig;
use crate::tasks::BackgroundTasks;

/// Shared application state
pub struct AppState {
    pub config: HostConfig,
    pub env: Arc<Env>,
    pub worker: Arc<dyn Worker>,
    pub fetcher: Arc<dyn Fetcher>,
    /// `wait_until` drains still running after their responses were sent
    pub background: BackgroundTasks,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info,edge_worker=debug,hello_worker=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Edge Worker host");

    // Load configuration
    let config = HostConfig::from_env();
    tracing::info!("Configuration loaded: {:?}", config);

    let env = bindings::load(&config, |name| std::env::var(name).ok())?;
    let addr = config.socket_addr()?;
    let schedule = config.schedule_interval();

    let state = Arc::new(AppState {
        config,
        env: Arc::new(env),
        worker: Arc::new(HelloWorker),
        fetcher: Arc::new(HttpFetcher::new()),
        background: BackgroundTasks::default(),
    });

    let scheduler = schedule.map(|period| scheduler::spawn(state.clone(), period));

    let app = router::create_worker_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Worker listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = scheduler {
        handle.abort();
    }

    let drained = state.background.shutdown().await;
    tracing::info!(drained, "Background tasks finished");

    tracing::info!("Edge Worker host stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
