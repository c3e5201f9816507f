//! HTTP API server with observability for the fulfillment routing system.
//!
//! Exposes the synchronous order boundary (`POST /order`) backed by the
//! gateway/worker exchange, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use broker::{Broker, InMemoryBroker};
use gateway::{Gateway, GatewayError};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use worker::{InMemoryInventory, Worker, WorkerError};

use config::Config;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<B: Broker + 'static>(
    state: Arc<AppState<B>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/order", post(routes::orders::submit::<B>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default single-process wiring: an in-memory broker, a
/// gateway over it, and `worker_count` worker loops sharing one
/// in-memory inventory.
///
/// Returns the shared state, the inventory handle (so callers can stock
/// centers at runtime), and the spawned worker tasks.
pub async fn create_default_state(
    config: &Config,
) -> Result<
    (
        Arc<AppState<InMemoryBroker>>,
        InMemoryInventory,
        Vec<tokio::task::JoinHandle<Result<(), WorkerError>>>,
    ),
    GatewayError,
> {
    let broker = InMemoryBroker::new();
    let inventory = InMemoryInventory::new();

    let gateway = Gateway::new(
        broker.clone(),
        config.work_queue.clone(),
        config.reply_timeout(),
    )
    .await?;

    let mut workers = Vec::with_capacity(config.worker_count);
    for _ in 0..config.worker_count {
        let worker = Worker::new(broker.clone(), inventory.clone(), config.work_queue.clone());
        workers.push(tokio::spawn(async move { worker.run().await }));
    }

    let state = Arc::new(AppState { gateway });
    Ok((state, inventory, workers))
}
