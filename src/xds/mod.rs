//! Envoy xDS resource generation
//!
//! Translates the gateway domain model into Envoy v3 resources:
//! - LDS listeners with TLS, passthrough and QUIC filter chains
//! - RDS route configurations with collapsed virtual hosts

pub mod context;
pub mod gateway;

pub use context::{InMemoryRoutingContext, RoutingContext};
pub use gateway::GatewayConfigGenerator;

use envoy_types::pb::google::protobuf::Any as EnvoyAny;
use prost::Message;

pub const HTTP_CONNECTION_MANAGER_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.filters.network.http_connection_manager.v3.HttpConnectionManager";
pub const TCP_PROXY_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.filters.network.tcp_proxy.v3.TcpProxy";
pub const SNI_CLUSTER_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.filters.network.sni_cluster.v3.SniCluster";
pub const TLS_INSPECTOR_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.filters.listener.tls_inspector.v3.TlsInspector";
pub const DOWNSTREAM_TLS_CONTEXT_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.transport_sockets.tls.v3.DownstreamTlsContext";
pub const QUIC_DOWNSTREAM_TRANSPORT_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.transport_sockets.quic.v3.QuicDownstreamTransport";
pub const ROUTER_TYPE_URL: &str = "type.googleapis.com/envoy.extensions.filters.http.router.v3.Router";
pub const FILE_ACCESS_LOG_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.access_loggers.file.v3.FileAccessLog";

/// Pack a protobuf message into an `Any`
pub(crate) fn to_any<M: Message>(type_url: &str, message: &M) -> EnvoyAny {
    EnvoyAny { type_url: type_url.to_string(), value: message.encode_to_vec() }
}

/// An `Any` for extensions configured without fields
pub(crate) fn empty_any(type_url: &str) -> EnvoyAny {
    EnvoyAny { type_url: type_url.to_string(), value: Vec::new() }
}
