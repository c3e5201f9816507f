//! Order submission endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use broker::Broker;
use domain::{Order, OrderResult};
use gateway::Gateway;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<B: Broker> {
    pub gateway: Gateway<B>,
}

/// POST /order — submit an order and wait for its fulfillment decision.
///
/// The request and response bodies are the wire forms of [`Order`] and
/// [`OrderResult`]. The call blocks until the correlated reply arrives
/// or the gateway deadline elapses (504).
#[tracing::instrument(skip(state, body))]
pub async fn submit<B: Broker + 'static>(
    State(state): State<Arc<AppState<B>>>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<OrderResult>, ApiError> {
    // Decode by hand so shape errors come back as 400, not axum's 422.
    let order: Order = serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order body: {e}")))?;

    let result = state.gateway.submit(order).await?;
    Ok(Json(result))
}
