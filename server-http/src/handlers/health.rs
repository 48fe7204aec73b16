use crate::models::HealthResponse;
use crate::state::AppState;
use axum::{extract::State, Json};

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        store: state.cache.store_name(),
        stats: state.cache.stats(),
    })
}
