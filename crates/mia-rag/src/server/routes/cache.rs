//! Response cache maintenance endpoints

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::cache::CacheStats;
use crate::server::state::AppState;

/// POST /cache/clear - Drop every cached answer
pub async fn clear_cache(State(state): State<AppState>) -> Json<Value> {
    state.cache().clear();
    tracing::info!("Cache cleared");

    Json(json!({
        "success": true,
        "message": "Cache cleared"
    }))
}

/// GET /cache/stats - Current and maximum cache size
pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache().stats())
}
