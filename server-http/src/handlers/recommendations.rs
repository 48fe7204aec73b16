use crate::error::ApiError;
use crate::models::RecommendationResponse;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use recs::CacheKey;
use shared::Ttl;
use std::sync::Arc;
use tracing::info;

/// GET /recommendations/:user_id
pub async fn get_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    info!("GET recommendations: user={}", user_id);

    let key = CacheKey::for_user(&user_id)?;
    let predictor = Arc::clone(&state.predictor);

    let lookup = state
        .cache
        .get_or_compute(&key, Ttl::RECOMMENDATIONS, move || async move {
            predictor.predict(&user_id).await
        })
        .await?;

    Ok(Json(RecommendationResponse {
        source: lookup.source,
        data: lookup.value,
    }))
}
