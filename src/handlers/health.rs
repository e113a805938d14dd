use axum::{Json, extract::State};
use std::sync::Arc;
use std::time::Instant;

use crate::models::HealthResponse;
use crate::state::AppState;

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let limiter = &state.rate_limiter;

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        events_in_window: limiter.in_window(Instant::now()),
        quantity_limit: limiter.quantity_limit(),
        time_window_secs: limiter.time_window().as_secs(),
    })
}
