//! Per-client request quotas
//!
//! Each limited route group gets its own keyed limiter. Clients are keyed by
//! peer address, falling back to the first `X-Forwarded-For` entry.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::config::RateLimitConfig;
use crate::error::Error;

/// Keyed limiter shared by every request on one route group
pub type ClientLimiter = Arc<DefaultKeyedRateLimiter<String>>;

/// Limiters for the route groups
#[derive(Clone)]
pub struct RateLimits {
    /// Routes without a dedicated limit
    pub default: ClientLimiter,
    /// `POST /query`
    pub query: ClientLimiter,
    /// `POST /search`
    pub search: ClientLimiter,
}

impl RateLimits {
    /// Build limiters from configuration, or `None` when disabled
    pub fn from_config(config: &RateLimitConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }

        Some(Self {
            default: limiter(Quota::per_hour(non_zero(config.default_per_hour))),
            query: limiter(Quota::per_minute(non_zero(config.query_per_minute))),
            search: limiter(Quota::per_minute(non_zero(config.search_per_minute))),
        })
    }
}

fn limiter(quota: Quota) -> ClientLimiter {
    Arc::new(RateLimiter::keyed(quota))
}

fn non_zero(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN)
}

/// Middleware rejecting requests over the client's quota with 429
pub async fn enforce(
    State(limiter): State<ClientLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = client_key(&request);

    if limiter.check_key(&client).is_err() {
        tracing::warn!("Rate limit exceeded: {} {}", client, request.uri().path());
        return Error::RateLimited.into_response();
    }

    next.run(request).await
}

/// Identify the caller
fn client_key(request: &Request<Body>) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string()
}
