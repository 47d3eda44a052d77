//! # Observability Infrastructure
//!
//! Structured logging and metrics for the gateway compiler.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, log_options_info};
pub use metrics::MetricsRecorder;
