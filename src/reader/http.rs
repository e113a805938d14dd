use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{StatusCode, header};
use std::time::Duration;

use crate::error::ReadError;

// IMF-fixdate, the only HTTP-date form servers are expected to send
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Fetches one URL. Swap in a custom implementation with
/// [`SustainableReader::set_reader`](super::SustainableReader::set_reader).
#[async_trait]
pub trait Reader: Send + Sync {
    async fn read(&self, url: &str) -> Result<Vec<u8>, ReadError>;
}

// Plain GET; anything but 200 is a failure
pub struct HttpReader {
    client: reqwest::Client,
}

impl HttpReader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpReader {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl Reader for HttpReader {
    async fn read(&self, url: &str) -> Result<Vec<u8>, ReadError> {
        let res = self.client.get(url).send().await?;

        if res.status() != StatusCode::OK {
            let retry_after = res
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| parse_retry_after(v, Utc::now()));

            return Err(ReadError::Status {
                status: res.status().as_u16(),
                retry_after,
            });
        }

        Ok(res.bytes().await?.to_vec())
    }
}

/// Parse a `Retry-After` value, either delay-seconds or an HTTP-date.
///
/// Returns `None` for unparseable values and for waits that are zero or
/// already in the past, so the caller falls back to its own pause.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();

    let secs = match value.parse::<u64>() {
        Ok(secs) => secs,
        Err(_) => {
            let date = NaiveDateTime::parse_from_str(value, HTTP_DATE_FORMAT)
                .ok()?
                .and_utc();
            u64::try_from((date - now).num_seconds()).ok()?
        }
    };

    (secs > 0).then(|| Duration::from_secs(secs))
}
