use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use ragbot_knowledge::QueryResult;
use serde::Deserialize;

use crate::state::AppState;

fn default_k() -> usize {
    4
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default = "default_k")]
    pub k: usize,
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Json<QueryResult> {
    Json(state.service.query(&request.question, request.k).await)
}
