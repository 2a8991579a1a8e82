use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use ragbot_knowledge::{ClearResult, CollectionStats};

use crate::errors::ApiError;
use crate::state::AppState;

/// Collection statistics; a failed count is reported as 500.
pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<CollectionStats>, ApiError> {
    let stats = state.service.get_stats().await;
    match stats.error {
        Some(err) => Err(ApiError::Internal(err)),
        None => Ok(Json(stats)),
    }
}

pub async fn clear(State(state): State<Arc<AppState>>) -> Json<ClearResult> {
    Json(state.service.clear_collection().await)
}
