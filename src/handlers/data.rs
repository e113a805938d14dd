use axum::extract::State;
use axum::http::Uri;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::{QuotaError, retry_after_secs};
use crate::metrics::{EVENT_LOG_SIZE, REQUEST_LATENCY, REQUEST_TOTAL, REQUESTS_ADMITTED, REQUESTS_DENIED};
use crate::rate_limit::Admission;
use crate::state::AppState;

// Shared handler behind every /dataN route
pub async fn data_handler(
    State(state): State<Arc<AppState>>,
    uri: Uri,
) -> Result<String, QuotaError> {
    REQUEST_TOTAL.inc();
    let start_time = Instant::now();

    if !state.request_delay.is_zero() {
        tokio::time::sleep(state.request_delay).await;
    }

    let limiter = &state.rate_limiter;
    let admission = limiter.try_acquire(Instant::now());
    // denials can prune too
    EVENT_LOG_SIZE.set(limiter.len() as f64);

    if let Admission::Denied { retry_after } = admission {
        REQUESTS_DENIED.inc();
        warn!(
            path = %uri.path(),
            retry_after_secs = retry_after_secs(retry_after),
            "Rate limit exceeded"
        );
        return Err(QuotaError::RateLimitExceeded {
            status: state.deny_status,
            retry_after,
        });
    }

    REQUESTS_ADMITTED.inc();

    let value: f64 = rand::random();
    debug!(path = %uri.path(), "Request admitted");

    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
    Ok(value.to_string())
}
