//! # Structured Logging
//!
//! Subscriber setup and span macros for gateway compilation. Compilation code
//! logs through `tracing`; the embedding process decides whether to install
//! the subscriber provided here.

use crate::config::{GatewayOptions, ObservabilityConfig};
use crate::errors::{Error, Result};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Create a tracing span for one gateway compilation step
///
/// ```rust,ignore
/// let span = gateway_span!("build_listeners", proxy.id);
/// let span = gateway_span!("build_route_config", proxy.id, route_name = %name);
/// ```
#[macro_export]
macro_rules! gateway_span {
    ($operation:expr, $proxy_id:expr) => {
        tracing::debug_span!(
            "gateway_compile",
            operation = %$operation,
            proxy_id = %$proxy_id
        )
    };
    ($operation:expr, $proxy_id:expr, $($field:tt)*) => {
        tracing::debug_span!(
            "gateway_compile",
            operation = %$operation,
            proxy_id = %$proxy_id,
            $($field)*
        )
    };
}

/// Install a global `tracing` subscriber driven by an `EnvFilter`.
///
/// An already-installed subscriber (for example one set up by a test harness or
/// by the embedding control plane) is left in place.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_level).map_err(|e| {
        Error::config(format!("Invalid log level '{}': {}", config.log_level, e))
    })?;

    let installed = if config.json_logs {
        tracing::subscriber::set_global_default(
            tracing_subscriber::fmt().json().with_env_filter(filter).finish(),
        )
    } else {
        tracing::subscriber::set_global_default(
            FmtSubscriber::builder().with_env_filter(filter).finish(),
        )
    };

    if installed.is_err() {
        tracing::debug!("Global tracing subscriber already installed, keeping it");
    }

    Ok(())
}

/// Log compiler options at startup
pub fn log_options_info(options: &GatewayOptions) {
    tracing::info!(
        quic_listeners = options.enable_quic_listeners,
        route_collapse = options.enable_route_collapse,
        wildcard_address = %options.wildcard_address,
        "Gateway compiler options"
    );
}
