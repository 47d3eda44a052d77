//! Virtual service routing intent
//!
//! Routing rules a gateway applies once a connection or request has been
//! accepted on one of its servers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Routing rules for a set of hosts, bound to zero or more gateways
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualService {
    pub name: String,
    pub namespace: String,
    pub hosts: Vec<String>,

    /// Gateway references, `name` or `namespace/name`. Empty binds to every gateway.
    #[serde(default)]
    pub gateways: Vec<String>,

    #[serde(default)]
    pub http: Vec<HttpRoute>,

    #[serde(default)]
    pub tcp: Vec<TcpRoute>,

    #[serde(default)]
    pub tls: Vec<TlsRoute>,
}

/// String comparison used by URI and header matches
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringMatch {
    Exact(String),
    Prefix(String),
    Regex(String),
}

/// One match clause of an HTTP route. All populated conditions must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpMatchRequest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub uri: Option<StringMatch>,

    #[serde(default)]
    pub headers: BTreeMap<String, StringMatch>,

    /// Restricts the clause to one gateway port; 0 matches any port
    #[serde(default)]
    pub port: u32,
}

/// A backend service reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub host: String,

    #[serde(default)]
    pub subset: Option<String>,

    #[serde(default)]
    pub port: Option<u32>,
}

impl Destination {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into(), subset: None, port: None }
    }

    pub fn with_port(mut self, port: u32) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_subset(mut self, subset: impl Into<String>) -> Self {
        self.subset = Some(subset.into());
        self
    }
}

/// Weighted HTTP destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRouteDestination {
    pub destination: Destination,

    #[serde(default)]
    pub weight: u32,
}

/// Weighted L4 destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDestination {
    pub destination: Destination,

    #[serde(default)]
    pub weight: u32,
}

/// Redirect response returned instead of forwarding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRedirect {
    #[serde(default)]
    pub uri: Option<String>,

    #[serde(default)]
    pub authority: Option<String>,

    /// HTTP status for the redirect; 301 when unset
    #[serde(default)]
    pub redirect_code: Option<u32>,
}

/// Path prefix rewrite applied before forwarding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRewrite {
    pub uri: String,
}

/// Retry policy for forwarded requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRetry {
    pub attempts: u32,

    #[serde(default)]
    pub per_try_timeout_ms: Option<u64>,

    #[serde(default)]
    pub retry_on: Option<String>,
}

/// One HTTP routing rule, evaluated in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRoute {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, rename = "match")]
    pub matches: Vec<HttpMatchRequest>,

    #[serde(default)]
    pub route: Vec<HttpRouteDestination>,

    #[serde(default)]
    pub redirect: Option<HttpRedirect>,

    #[serde(default)]
    pub rewrite: Option<HttpRewrite>,

    #[serde(default)]
    pub timeout_ms: Option<u64>,

    #[serde(default)]
    pub retries: Option<HttpRetry>,
}

/// Opaque TCP routing rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpRoute {
    /// Gateway port the rule applies to; 0 matches any port
    #[serde(default)]
    pub port: u32,

    pub route: Vec<RouteDestination>,
}

/// SNI-based routing rule for passthrough TLS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsRoute {
    pub sni_hosts: Vec<String>,

    /// Gateway port the rule applies to; 0 matches any port
    #[serde(default)]
    pub port: u32,

    pub route: Vec<RouteDestination>,
}

impl VirtualService {
    /// `namespace/name` identity used in log messages
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_routes_from_json() {
        let vs: VirtualService = serde_json::from_value(serde_json::json!({
            "name": "bookinfo",
            "namespace": "default",
            "hosts": ["bookinfo.example.com"],
            "gateways": ["istio-system/ingress"],
            "http": [{
                "match": [{"uri": {"prefix": "/reviews"}, "headers": {"x-user": {"exact": "jason"}}}],
                "route": [{"destination": {"host": "reviews", "subset": "v2", "port": 9080}, "weight": 100}],
                "timeout_ms": 1500
            }],
            "tls": [{"sni_hosts": ["secure.example.com"], "route": [{"destination": {"host": "secure"}}]}]
        }))
        .unwrap();

        assert_eq!(vs.qualified_name(), "default/bookinfo");
        let route = &vs.http[0];
        assert_eq!(route.matches[0].uri, Some(StringMatch::Prefix("/reviews".to_string())));
        assert_eq!(route.matches[0].headers["x-user"], StringMatch::Exact("jason".to_string()));
        assert_eq!(route.matches[0].port, 0);
        assert_eq!(route.route[0].destination, Destination::new("reviews").with_subset("v2").with_port(9080));
        assert_eq!(route.timeout_ms, Some(1500));
        assert!(vs.tcp.is_empty());
        assert_eq!(vs.tls[0].port, 0);
    }
}
