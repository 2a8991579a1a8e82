use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

pub const SERVICE_NAME: &str = "RAG Chatbot API";
pub const API_VERSION: &str = "1.0.0";

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": SERVICE_NAME,
        "version": API_VERSION,
        "endpoints": {
            "query": "/api/query",
            "upload": "/api/upload",
            "stats": "/api/stats",
            "health": "/api/health",
            "clear": "/api/clear"
        }
    }))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME
    }))
}
