//! Gateway domain types
//!
//! The merged view of every gateway server bound to one proxy. These types are
//! produced by the configuration layer and are read-only inputs to
//! compilation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Application protocol declared on a gateway server port
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Protocol {
    Http,
    Https,
    Http2,
    Grpc,
    GrpcWeb,
    Http3,
    Tcp,
    Tls,
    Mongo,
    Redis,
    Unknown,
}

impl Protocol {
    /// Plaintext HTTP protocols served by an HTTP connection manager
    pub fn is_http_family(self) -> bool {
        matches!(self, Protocol::Http | Protocol::Http2 | Protocol::Grpc | Protocol::GrpcWeb)
    }

    /// HTTP protocols carried over TLS
    pub fn is_https_like(self) -> bool {
        matches!(self, Protocol::Https | Protocol::Http3)
    }

    /// Any protocol terminated by an HTTP connection manager
    pub fn is_http_capable(self) -> bool {
        self.is_http_family() || self.is_https_like()
    }

    /// Protocols that cannot be served without TLS settings
    pub fn requires_tls(self) -> bool {
        matches!(self, Protocol::Https | Protocol::Http3 | Protocol::Tls)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Http => "HTTP",
            Protocol::Https => "HTTPS",
            Protocol::Http2 => "HTTP2",
            Protocol::Grpc => "GRPC",
            Protocol::GrpcWeb => "GRPC-WEB",
            Protocol::Http3 => "HTTP3",
            Protocol::Tcp => "TCP",
            Protocol::Tls => "TLS",
            Protocol::Mongo => "MONGO",
            Protocol::Redis => "REDIS",
            Protocol::Unknown => "UNKNOWN",
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let protocol = match value.to_ascii_uppercase().as_str() {
            "HTTP" => Protocol::Http,
            "HTTPS" => Protocol::Https,
            "HTTP2" => Protocol::Http2,
            "GRPC" => Protocol::Grpc,
            "GRPC-WEB" => Protocol::GrpcWeb,
            "HTTP3" => Protocol::Http3,
            "TCP" => Protocol::Tcp,
            "TLS" => Protocol::Tls,
            "MONGO" => Protocol::Mongo,
            "REDIS" => Protocol::Redis,
            "" => return Err("protocol cannot be empty".to_string()),
            _ => Protocol::Unknown,
        };
        Ok(protocol)
    }
}

impl TryFrom<String> for Protocol {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Protocol> for String {
    fn from(protocol: Protocol) -> Self {
        protocol.as_str().to_string()
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A distinct listener target declared by one or more servers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerPort {
    pub number: u32,
    pub protocol: Protocol,
    /// Bind address; empty means the wildcard address
    #[serde(default)]
    pub bind: String,
}

impl ServerPort {
    pub fn new(number: u32, protocol: Protocol) -> Self {
        Self { number, protocol, bind: String::new() }
    }

    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }
}

impl Ord for ServerPort {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.number
            .cmp(&other.number)
            .then_with(|| self.bind.cmp(&other.bind))
            .then_with(|| self.protocol.cmp(&other.protocol))
    }
}

impl PartialOrd for ServerPort {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// TLS handling requested by a server
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TlsMode {
    /// Plaintext
    Disable,
    /// Terminate TLS with a server certificate
    Simple,
    /// Terminate TLS and require a client certificate
    Mutual,
    /// Forward encrypted bytes, routed by SNI
    Passthrough,
    /// Forward encrypted bytes to a cluster named by SNI
    AutoPassthrough,
    /// Terminate with the mesh workload certificate and require a mesh client certificate
    IstioMutual,
}

impl TlsMode {
    /// Modes where the proxy decrypts the connection
    pub fn terminates(self) -> bool {
        matches!(self, TlsMode::Simple | TlsMode::Mutual | TlsMode::IstioMutual)
    }

    /// Modes where encrypted bytes are forwarded unmodified
    pub fn is_passthrough(self) -> bool {
        matches!(self, TlsMode::Passthrough | TlsMode::AutoPassthrough)
    }
}

/// TLS protocol versions accepted in server settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TlsProtocolVersion {
    #[serde(rename = "TLS_AUTO")]
    Auto,
    #[serde(rename = "TLSV1_0")]
    V1_0,
    #[serde(rename = "TLSV1_1")]
    V1_1,
    #[serde(rename = "TLSV1_2")]
    V1_2,
    #[serde(rename = "TLSV1_3")]
    V1_3,
}

/// TLS settings of a gateway server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsPolicy {
    pub mode: TlsMode,

    /// Answer plaintext requests with a redirect to HTTPS
    #[serde(default)]
    pub https_redirect: bool,

    /// Secret-store reference holding certificate, key and (for MUTUAL) CA bundle
    #[serde(default)]
    pub credential_name: Option<String>,

    /// Path to the server certificate chain
    #[serde(default)]
    pub server_certificate: Option<String>,

    /// Path to the server private key
    #[serde(default)]
    pub private_key: Option<String>,

    /// Path to the CA bundle used to verify client certificates
    #[serde(default)]
    pub ca_certificates: Option<String>,

    #[serde(default)]
    pub min_protocol_version: Option<TlsProtocolVersion>,

    #[serde(default)]
    pub max_protocol_version: Option<TlsProtocolVersion>,

    /// Cipher suites overriding the mesh defaults; empty keeps the defaults
    #[serde(default)]
    pub cipher_suites: Vec<String>,
}

impl TlsPolicy {
    /// Settings with only the mode populated
    pub fn new(mode: TlsMode) -> Self {
        Self {
            mode,
            https_redirect: false,
            credential_name: None,
            server_certificate: None,
            private_key: None,
            ca_certificates: None,
            min_protocol_version: None,
            max_protocol_version: None,
            cipher_suites: Vec::new(),
        }
    }

    /// Terminating settings backed by a secret-store credential
    pub fn with_credential(mode: TlsMode, credential_name: impl Into<String>) -> Self {
        Self { credential_name: Some(credential_name.into()), ..Self::new(mode) }
    }

    /// Terminating settings backed by certificate files
    pub fn with_files(
        mode: TlsMode,
        server_certificate: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        Self {
            server_certificate: Some(server_certificate.into()),
            private_key: Some(private_key.into()),
            ..Self::new(mode)
        }
    }
}

/// One gateway server declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub port: ServerPort,

    /// Host patterns, optionally qualified as `namespace/host`
    pub hosts: Vec<String>,

    #[serde(default)]
    pub tls: Option<TlsPolicy>,

    /// RDS route configuration name for HTTP-capable servers
    #[serde(default)]
    pub route_name: String,

    /// `namespace/name` of the gateway declaring this server
    pub gateway: String,

    #[serde(default)]
    pub name: Option<String>,
}

impl Server {
    pub fn protocol(&self) -> Protocol {
        self.port.protocol
    }

    /// Effective TLS mode; servers without settings are plaintext
    pub fn tls_mode(&self) -> TlsMode {
        self.tls.as_ref().map(|tls| tls.mode).unwrap_or(TlsMode::Disable)
    }

    pub fn https_redirect(&self) -> bool {
        self.tls.as_ref().is_some_and(|tls| tls.https_redirect)
    }

    /// Human readable identity for log messages
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => format!("{}/{}", self.gateway, name),
            None => format!("{}:{}", self.gateway, self.port.number),
        }
    }
}

/// All gateway servers bound to one proxy, indexed for compilation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedGateway {
    pub server_ports: BTreeSet<ServerPort>,
    pub merged_servers: BTreeMap<ServerPort, Vec<Server>>,
    pub servers_by_route_name: BTreeMap<String, Vec<Server>>,
}

impl MergedGateway {
    /// Index server declarations, keeping declaration order within each group
    pub fn from_servers(servers: impl IntoIterator<Item = Server>) -> Self {
        let mut merged = Self::default();

        for server in servers {
            merged.server_ports.insert(server.port.clone());
            if !server.route_name.is_empty() {
                merged
                    .servers_by_route_name
                    .entry(server.route_name.clone())
                    .or_default()
                    .push(server.clone());
            }
            merged.merged_servers.entry(server.port.clone()).or_default().push(server);
        }

        merged
    }

    /// Servers bound to a route configuration name
    pub fn servers_for_route(&self, route_name: &str) -> &[Server] {
        self.servers_by_route_name.get(route_name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Servers declared on one server port
    pub fn servers_on_port(&self, port: &ServerPort) -> &[Server] {
        self.merged_servers.get(port).map(Vec::as_slice).unwrap_or(&[])
    }
}
