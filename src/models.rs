use serde::{Deserialize, Serialize};

// JSON body for error responses, e.g. {"error":"denied!"}
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

// Health endpoint response
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub events_in_window: usize, // live entries in the shared log
    pub quantity_limit: usize,
    pub time_window_secs: u64,
}
