//! # Configuration Management
//!
//! Compiler options and observability settings. Behavior toggles live in an
//! immutable [`GatewayOptions`] value handed to the generator for each
//! compilation; nothing here is process-wide mutable state.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use validator::Validate;

const ENV_PREFIX: &str = "FLOWPLANE_GATEWAY";

/// Options that alter how gateway listeners and routes are compiled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GatewayOptions {
    /// Emit a QUIC listener next to the TCP one for TLS-terminating HTTPS servers
    pub enable_quic_listeners: bool,

    /// Merge virtual hosts whose route tables are identical
    pub enable_route_collapse: bool,

    /// Address used in the listener socket when a server binds to no address
    #[validate(length(min = 1, message = "Wildcard address cannot be empty"))]
    pub wildcard_address: String,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            enable_quic_listeners: false,
            enable_route_collapse: true,
            wildcard_address: "0.0.0.0".to_string(),
        }
    }
}

impl GatewayOptions {
    /// Create options from `FLOWPLANE_GATEWAY_*` environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let options = Self {
            enable_quic_listeners: env_bool("ENABLE_QUIC_LISTENERS")?
                .unwrap_or(defaults.enable_quic_listeners),
            enable_route_collapse: env_bool("ENABLE_ROUTE_COLLAPSE")?
                .unwrap_or(defaults.enable_route_collapse),
            wildcard_address: env_var("WILDCARD_ADDRESS").unwrap_or(defaults.wildcard_address),
        };

        options.validate()?;
        Ok(options)
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;

        if self.wildcard_address.contains(':') && self.wildcard_address != "::" {
            return Err(Error::validation(format!(
                "Wildcard address '{}' must be 0.0.0.0, :: or a plain address",
                self.wildcard_address
            )));
        }

        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or `EnvFilter` directive (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Emit logs as JSON lines
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logs: false }
    }
}

impl ObservabilityConfig {
    /// Create configuration from `FLOWPLANE_GATEWAY_*` environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            log_level: env_var("LOG_LEVEL").unwrap_or(defaults.log_level),
            json_logs: env_bool("JSON_LOGS")?.unwrap_or(defaults.json_logs),
        };

        Validate::validate(&config).map_err(Error::from)?;
        Ok(config)
    }
}

fn env_var(suffix: &str) -> Option<String> {
    std::env::var(format!("{}_{}", ENV_PREFIX, suffix)).ok()
}

fn env_bool(suffix: &str) -> Result<Option<bool>> {
    match env_var(suffix) {
        None => Ok(None),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            other => Err(Error::config(format!(
                "Invalid boolean for {}_{}: {}",
                ENV_PREFIX, suffix, other
            ))),
        },
    }
}
