//! # Flowplane Gateway
//!
//! Compiles the gateway servers bound to an Envoy proxy into LDS listeners and
//! RDS route configurations.
//!
//! ## Architecture
//!
//! ```text
//! MergedGateway + RoutingContext → GatewayConfigGenerator → Listener / RouteConfiguration
//!                                         ↓
//!                       filter chains, TLS contexts, virtual hosts
//! ```
//!
//! ## Core Components
//!
//! - **Domain**: gateway servers, virtual services, services and mesh settings
//! - **Routing context**: read-only view of the routing state a proxy sees
//! - **Listener compiler**: one listener per bind address and port, plus a QUIC
//!   listener for HTTP/3 servers
//! - **Route compiler**: one route configuration per RDS name, with duplicate
//!   virtual hosts collapsed
//!
//! ## Example Usage
//!
//! ```rust
//! use flowplane_gateway::domain::{GatewayProxy, MergedGateway, Protocol, Server, ServerPort};
//! use flowplane_gateway::{GatewayConfigGenerator, GatewayOptions, InMemoryRoutingContext};
//!
//! let server = Server {
//!     port: ServerPort::new(80, Protocol::Http),
//!     hosts: vec!["*".to_string()],
//!     tls: None,
//!     route_name: "http.80".to_string(),
//!     gateway: "istio-system/ingress".to_string(),
//!     name: None,
//! };
//! let proxy = GatewayProxy::new("router~10.0.0.1", Some(MergedGateway::from_servers([server])));
//!
//! let context = InMemoryRoutingContext::default();
//! let generator = GatewayConfigGenerator::new(&context, GatewayOptions::default());
//! let listeners = generator.build_gateway_listeners(&proxy)?;
//! assert_eq!(listeners[0].name, "_80");
//! # Ok::<(), flowplane_gateway::Error>(())
//! ```

pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod xds;

// Re-export commonly used types and traits
pub use config::{GatewayOptions, ObservabilityConfig};
pub use errors::{Error, Result};
pub use xds::{GatewayConfigGenerator, InMemoryRoutingContext, RoutingContext};
