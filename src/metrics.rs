use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("quota_requests_total", "Total number of data requests").unwrap();
    pub static ref REQUESTS_ADMITTED: Counter =
        register_counter!("quota_requests_admitted_total", "Data requests admitted by the rate limiter").unwrap();
    pub static ref REQUESTS_DENIED: Counter =
        register_counter!("quota_requests_denied_total", "Data requests denied by the rate limiter").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "quota_request_latency_seconds",
        "Data request latency in seconds"
    )
    .unwrap();
    pub static ref EVENT_LOG_SIZE: Gauge =
        register_gauge!("quota_event_log_size", "Current number of entries in the event log").unwrap();
}
