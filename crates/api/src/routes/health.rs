//! Liveness endpoint.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health — reports that the routing process is up.
///
/// Deliberately shallow: it does not touch the broker or the workers,
/// so a stalled queue still answers `ok` here and shows up in the
/// submit metrics instead.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
