//! Health check HTTP handler

use axum::{extract::State, response::IntoResponse, Json};

use crate::web::{responses::HealthResponse, AppState};

/// Liveness probe
///
/// Reports the number of enabled sources; feeds are not contacted.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse::healthy(
        state.search.registry().enabled_count(),
    ))
}
