use prometheus::{Encoder, TextEncoder};

use crate::error::QuotaError;

pub async fn metrics_handler() -> Result<String, QuotaError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
