use axum::{Router, routing::get};
use std::sync::Arc;

use crate::handlers::{data_handler, health_handler, metrics_handler};
use crate::state::AppState;

/// Build the application router.
///
/// `/data1` through `/dataN` all go through the same handler and the same
/// limiter, so the quota is shared across every path.
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler));

    for i in 1..=state.route_count {
        router = router.route(&format!("/data{}", i), get(data_handler));
    }

    router.with_state(state)
}
