//! Service info and health endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::server::state::AppState;

/// Health report; served with 503 until both collaborators are up
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub openai: &'static str,
    pub cache_size: usize,
}

/// GET / - Service info
pub async fn index() -> Json<Value> {
    Json(json!({
        "name": "Mia RAG API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/health",
            "query": "/query (POST)",
            "search": "/search (POST)",
            "cache_clear": "/cache/clear (POST)",
            "cache_stats": "/cache/stats"
        }
    }))
}

/// GET /health - Collaborator availability and cache size
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let report = HealthResponse {
        status: "healthy",
        message: "Mia RAG API is running",
        version: env!("CARGO_PKG_VERSION"),
        database: if state.vector_store().is_some() {
            "loaded"
        } else {
            "not loaded"
        },
        openai: if state.llm().is_some() {
            "ready"
        } else {
            "not configured"
        },
        cache_size: state.cache().len(),
    };

    let status = if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(report))
}
