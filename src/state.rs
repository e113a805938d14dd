use axum::http::StatusCode;
use std::time::Duration;

use crate::config::Args;
use crate::error::Result;
use crate::rate_limit::RateLimiter;

// app's shared state
pub struct AppState {
    pub rate_limiter: RateLimiter, // one quota for every route
    pub route_count: u32,
    pub request_delay: Duration,
    pub deny_status: StatusCode,
}

impl AppState {
    pub fn new(rate_limiter: RateLimiter, route_count: u32) -> Self {
        Self {
            rate_limiter,
            route_count,
            request_delay: Duration::ZERO,
            deny_status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_deny_status(mut self, status: StatusCode) -> Self {
        self.deny_status = status;
        self
    }

    // Build from validated CLI arguments
    pub fn from_args(args: &Args) -> Result<Self> {
        args.validate()?;
        let limiter = RateLimiter::new(args.rate_limit, args.rate_window());

        Ok(Self::new(limiter, args.routes)
            .with_request_delay(args.request_delay())
            .with_deny_status(args.deny_status_code()?))
    }
}
