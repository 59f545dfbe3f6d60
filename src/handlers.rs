use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::algorithms::RateLimiter;
use crate::error::ThrottlerError;
use crate::key_generator::KeyGenerator;
use crate::metrics::MetricsCollector;
use crate::response::{HealthResponse, LIMITED_BODY, UNLIMITED_BODY};

/// Shared application state
pub type SharedState = Arc<AppState>;

/// Application state containing the selected limiter and its counters
pub struct AppState {
    pub limiter: Arc<dyn RateLimiter>,
    pub metrics: MetricsCollector,
}

impl AppState {
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            limiter,
            metrics: MetricsCollector::new(),
        }
    }
}

/// Rate limited endpoint, keyed on the peer's host
pub async fn limited(
    State(state): State<SharedState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Result<Response, ThrottlerError> {
    let identifier = KeyGenerator::from_remote_addr(&peer.to_string())?;

    let limit_exceeded = state.limiter.decide(&identifier)?;
    state.metrics.record_request(!limit_exceeded);

    if limit_exceeded {
        Ok(StatusCode::TOO_MANY_REQUESTS.into_response())
    } else {
        Ok(LIMITED_BODY.into_response())
    }
}

/// Endpoint that bypasses the limiter
pub async fn unlimited() -> &'static str {
    UNLIMITED_BODY
}

/// Health check endpoint
pub async fn health_check(State(state): State<SharedState>) -> Result<impl IntoResponse, ThrottlerError> {
    let tracked = state.limiter.tracked_identifiers()?;
    Ok(Json(HealthResponse::healthy(state.limiter.strategy().name(), tracked)))
}

/// Decision counters for the limited endpoint
pub async fn metrics(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}
