mod data;
mod health;
mod metrics;

pub use data::data_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;
