//! HTTP front door: the webhook receiver and a small job API.

mod error;
pub mod rate_limit;
mod routes_api;
mod routes_webhook;
pub mod signature;

pub use error::AppError;
pub use signature::{verify_webhook_signature, SIGNATURE_HEADER};

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::{middleware, Extension, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::http::Transport;
use crate::metadata::MetadataCoordinator;
use crate::notifications::NotificationManager;
use crate::queue::{IngestQueue, Worker};
use crate::store::{MemoryRecordStore, RecordStore};
use rate_limit::{create_limiter, rate_limit_middleware};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub queue: IngestQueue,
    pub store: Arc<dyn RecordStore>,
}

impl AppContext {
    pub fn new(config: Arc<Config>, queue: IngestQueue, store: Arc<dyn RecordStore>) -> Self {
        Self {
            config,
            queue,
            store,
        }
    }
}

pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut webhook = routes_webhook::webhook_routes();
    if let Some(limiter) = create_limiter(ctx.config.server.webhook_rate_limit_per_minute) {
        webhook = webhook
            .layer(middleware::from_fn(rate_limit_middleware))
            .layer(Extension(limiter));
    }

    Router::new()
        .route("/health", get(health))
        .nest("/webhook", webhook)
        .nest("/api", routes_api::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(ctx)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Bind the configured address and serve until SIGINT/SIGTERM.
pub async fn start(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Server listening on {}", addr);

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    run(listener, config, cancel).await
}

/// Serve on an already-bound listener until `cancel` fires.
///
/// Shutdown order: stop accepting requests, stop the worker, then release
/// the shared transport.
pub async fn run(listener: TcpListener, config: Config, cancel: CancellationToken) -> Result<()> {
    let config = Arc::new(config);
    let transport = Arc::new(Transport::from_config("providers", &config.http)?);
    let coordinator = Arc::new(MetadataCoordinator::from_config(
        &config,
        Arc::clone(&transport),
    ));
    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
    let notifications = Arc::new(NotificationManager::new(&config));
    let (queue, receiver) = IngestQueue::new(config.server.queue_capacity);

    let worker_cancel = CancellationToken::new();
    let worker = Worker::new(
        receiver,
        coordinator,
        Arc::clone(&store),
        notifications,
        config.server.poll_interval(),
        worker_cancel.clone(),
    )
    .spawn();

    let app = create_router(AppContext::new(Arc::clone(&config), queue, store));

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .context("server error");

    tracing::info!("Stopping metadata worker");
    worker_cancel.cancel();
    if let Err(e) = worker.await {
        tracing::error!("Worker task panicked: {}", e);
    }

    drop(transport);
    tracing::info!("Shutdown complete");
    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
