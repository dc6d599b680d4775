//! API routes for the RAG server

pub mod cache;
pub mod health;
pub mod query;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::server::rate_limit::{enforce, RateLimits};
use crate::server::state::AppState;

/// Build all routes
///
/// `/query` and `/search` carry their own quotas; everything else shares the
/// default one. No limiting at all when `limits` is `None`.
pub fn api_routes(state: AppState, limits: Option<RateLimits>) -> Router {
    let mut general = Router::new()
        .route("/", get(health::index))
        .route("/health", get(health::health))
        .route("/cache/clear", post(cache::clear_cache))
        .route("/cache/stats", get(cache::cache_stats));
    let mut answers = Router::new().route("/query", post(query::query));
    let mut search = Router::new().route("/search", post(query::search));

    if let Some(limits) = limits {
        general = general.route_layer(from_fn_with_state(limits.default, enforce));
        answers = answers.route_layer(from_fn_with_state(limits.query, enforce));
        search = search.route_layer(from_fn_with_state(limits.search, enforce));
    }

    general.merge(answers).merge(search).with_state(state)
}
