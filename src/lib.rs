//! Quota server
//!
//! Serves a set of numbered data endpoints that all draw from one
//! process-wide sliding-window rate limiter. Admitted requests get a random
//! number back; once the shared quota is exhausted every endpoint answers
//! with a denial until old events age out of the window.
//!
//! [`reader`] is the matching client: it works through a queue of URLs and
//! backs off whenever the server denies it.

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod reader;
pub mod router;
pub mod state;
