use axum::http::StatusCode;
use clap::Parser;
use std::time::Duration;

use crate::error::{QuotaError, Result};

/// Longest accepted rate window: one year.
pub const MAX_RATE_WINDOW_SECS: u64 = 365 * 24 * 60 * 60;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "quota-server")]
#[command(about = "Numbered data endpoints behind one shared sliding-window quota")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 3100)]
    pub port: u16,

    // Number of /dataN routes to register
    #[arg(short, long, default_value_t = 99)]
    pub routes: u32,

    // Rate limit: events counted against the quota per window
    #[arg(long, default_value_t = 3)]
    pub rate_limit: usize,

    // Rate limit window in seconds
    #[arg(long, default_value_t = 30)]
    pub rate_window: u64,

    // Seconds to wait before answering each data request
    #[arg(short, long, default_value_t = 0)]
    pub delay: u64,

    // HTTP status returned on denial
    #[arg(long, default_value_t = 500)]
    pub deny_status: u16,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            port: 3100,
            routes: 99,
            rate_limit: 3,
            rate_window: 30,
            delay: 0,
            deny_status: 500,
        }
    }
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        if self.routes == 0 {
            return Err(QuotaError::Config("at least one route is required".to_string()));
        }
        if self.rate_window == 0 {
            return Err(QuotaError::Config("rate window must be at least one second".to_string()));
        }
        if self.rate_window > MAX_RATE_WINDOW_SECS {
            return Err(QuotaError::Config(format!(
                "rate window must be at most {} seconds",
                MAX_RATE_WINDOW_SECS
            )));
        }
        self.deny_status_code()?;
        Ok(())
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_secs(self.delay)
    }

    // only client or server error codes make sense for a denial
    pub fn deny_status_code(&self) -> Result<StatusCode> {
        let status = StatusCode::from_u16(self.deny_status)
            .map_err(|e| QuotaError::Config(format!("invalid deny status {}: {}", self.deny_status, e)))?;

        if !(status.is_client_error() || status.is_server_error()) {
            return Err(QuotaError::Config(format!(
                "deny status {} is not a 4xx or 5xx code",
                self.deny_status
            )));
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_cli() {
        let parsed = Args::parse_from(["quota-server"]);
        let defaults = Args::default();

        assert_eq!(parsed.port, defaults.port);
        assert_eq!(parsed.routes, defaults.routes);
        assert_eq!(parsed.rate_limit, defaults.rate_limit);
        assert_eq!(parsed.rate_window, defaults.rate_window);
        assert_eq!(parsed.delay, defaults.delay);
        assert_eq!(parsed.deny_status, defaults.deny_status);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::parse_from([
            "quota-server",
            "-p",
            "8080",
            "--routes",
            "5",
            "--rate-limit",
            "10",
            "--rate-window",
            "60",
            "-d",
            "2",
            "--deny-status",
            "429",
        ]);

        assert_eq!(args.port, 8080);
        assert_eq!(args.routes, 5);
        assert_eq!(args.rate_window(), Duration::from_secs(60));
        assert_eq!(args.request_delay(), Duration::from_secs(2));
        assert_eq!(args.deny_status_code().unwrap(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_rejects_zero_routes() {
        let args = Args { routes: 0, ..Args::default() };
        assert!(matches!(args.validate(), Err(QuotaError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_window() {
        let args = Args { rate_window: 0, ..Args::default() };
        assert!(matches!(args.validate(), Err(QuotaError::Config(_))));
    }

    #[test]
    fn test_rejects_oversized_window() {
        let args = Args::parse_from([
            "quota-server",
            "--rate-limit",
            "0",
            "--rate-window",
            "18446744073709551615",
        ]);
        assert!(matches!(args.validate(), Err(QuotaError::Config(_))));

        let longest = Args { rate_window: MAX_RATE_WINDOW_SECS, ..Args::default() };
        assert!(longest.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_error_status() {
        let ok = Args { deny_status: 200, ..Args::default() };
        assert!(ok.validate().is_err());

        let bogus = Args { deny_status: 42, ..Args::default() };
        assert!(bogus.validate().is_err());

        let forbidden = Args { deny_status: 403, ..Args::default() };
        assert!(forbidden.validate().is_ok());
    }
}
