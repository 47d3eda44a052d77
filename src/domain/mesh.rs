//! Mesh-wide and per-proxy settings consulted during compilation

use super::gateway::{MergedGateway, TlsProtocolVersion};
use serde::{Deserialize, Serialize};

/// TLS defaults applied to gateway servers that do not override them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsDefaults {
    #[serde(default)]
    pub min_protocol_version: Option<TlsProtocolVersion>,
    #[serde(default)]
    pub cipher_suites: Vec<String>,
    #[serde(default)]
    pub ecdh_curves: Vec<String>,
}

/// Mesh-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshConfig {
    #[serde(default)]
    pub tls_defaults: TlsDefaults,

    /// File path for HTTP access logs; unset disables access logging
    #[serde(default)]
    pub access_log_file: Option<String>,
}

/// How the `x-forwarded-client-cert` header is handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForwardClientCertDetails {
    Sanitize,
    ForwardOnly,
    AppendForward,
    #[default]
    SanitizeSet,
    AlwaysForwardOnly,
}

impl ForwardClientCertDetails {
    /// Whether the proxy writes details of the client certificate into the header
    pub fn sets_current_details(self) -> bool {
        matches!(self, Self::AppendForward | Self::SanitizeSet)
    }
}

/// Network topology in front of the gateway
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayTopology {
    /// Trusted proxies in front of the gateway, used for `x-forwarded-for` handling
    #[serde(default)]
    pub num_trusted_proxies: u32,

    #[serde(default)]
    pub forward_client_cert_details: ForwardClientCertDetails,
}

/// Per-proxy settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub gateway_topology: GatewayTopology,
}

/// The gateway proxy being compiled
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayProxy {
    pub id: String,

    /// Servers bound to the proxy; absent when no gateway selects it
    #[serde(default)]
    pub merged_gateway: Option<MergedGateway>,

    #[serde(default)]
    pub proxy_config: ProxyConfig,
}

impl GatewayProxy {
    pub fn new(id: impl Into<String>, merged_gateway: Option<MergedGateway>) -> Self {
        Self { id: id.into(), merged_gateway, proxy_config: ProxyConfig::default() }
    }

    pub fn with_proxy_config(mut self, proxy_config: ProxyConfig) -> Self {
        self.proxy_config = proxy_config;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_client_cert_defaults_to_sanitize_set() {
        let topology = GatewayTopology::default();
        assert_eq!(topology.forward_client_cert_details, ForwardClientCertDetails::SanitizeSet);
        assert!(topology.forward_client_cert_details.sets_current_details());
        assert!(!ForwardClientCertDetails::ForwardOnly.sets_current_details());
    }

    #[test]
    fn proxy_config_deserializes_with_defaults() {
        let config: ProxyConfig = serde_json::from_value(serde_json::json!({
            "gateway_topology": {"num_trusted_proxies": 2, "forward_client_cert_details": "APPEND_FORWARD"}
        }))
        .unwrap();
        assert_eq!(config.gateway_topology.num_trusted_proxies, 2);
        assert_eq!(
            config.gateway_topology.forward_client_cert_details,
            ForwardClientCertDetails::AppendForward
        );

        let mesh: MeshConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(mesh, MeshConfig::default());
    }
}
