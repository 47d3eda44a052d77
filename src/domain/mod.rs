//! Domain layer
//!
//! Pure input types for gateway compilation with zero infrastructure
//! dependencies. Nothing here knows about Envoy; the `xds` layer translates
//! these types into proxy configuration.
//!
//! ## Module Organization
//!
//! - `host`: Hostname pattern matching and specificity
//! - `gateway`: Gateway servers, ports, TLS settings and the merged gateway view
//! - `virtual_service`: HTTP, TCP and TLS routing intent
//! - `service`: Resolved backend service identities
//! - `mesh`: Mesh configuration, proxy configuration and the proxy being compiled

pub mod gateway;
pub mod host;
pub mod mesh;
pub mod service;
pub mod virtual_service;

pub use gateway::{
    MergedGateway, Protocol, Server, ServerPort, TlsMode, TlsPolicy, TlsProtocolVersion,
};
pub use mesh::{
    ForwardClientCertDetails, GatewayProxy, GatewayTopology, MeshConfig, ProxyConfig, TlsDefaults,
};
pub use service::{ServiceIdentity, ServicePort};
pub use virtual_service::{
    Destination, HttpMatchRequest, HttpRedirect, HttpRetry, HttpRewrite, HttpRoute,
    HttpRouteDestination, RouteDestination, StringMatch, TcpRoute, TlsRoute, VirtualService,
};
