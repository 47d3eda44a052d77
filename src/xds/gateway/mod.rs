//! Gateway listener and route compilation
//!
//! [`GatewayConfigGenerator`] is the entry point. It compiles the merged
//! gateway of one proxy into LDS listeners and, on demand, RDS route
//! configurations. Compilation reads its inputs through shared references
//! only, so one generator can serve many threads at once.

pub mod collapse;
pub mod filter_chain;
pub mod listener;
pub mod predicates;
pub mod route;
pub mod tls;

use crate::config::GatewayOptions;
use crate::domain::{Destination, GatewayProxy, MeshConfig, ProxyConfig, Server, VirtualService};
use crate::observability::MetricsRecorder;
use crate::xds::context::RoutingContext;
use std::fmt;

pub use collapse::{collapse_duplicate_routes, hash_route_list, routes_equal, vhost_mergeable};
pub use filter_chain::{
    build_gateway_connection_manager, build_gateway_http3_filter_chains,
    build_gateway_tcp_based_filter_chains, FilterChainMatchOpts, FilterChainOpts, TerminalFilter,
};
pub use listener::{build_gateway_listener, GatewayListenerOpts, MutableGatewayListener};
pub use predicates::{get_listener_name, is_gateway_match, is_port_match, pick_matching_gateway_hosts};
pub use tls::build_gateway_listener_tls_context;

/// Cluster that drops every connection
pub const BLACKHOLE_CLUSTER: &str = "BlackHoleCluster";

/// Transport a listener accepts connections on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransportProtocol {
    Tcp,
    Quic,
}

impl TransportProtocol {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportProtocol::Tcp => "tcp",
            TransportProtocol::Quic => "quic",
        }
    }
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a builder may read while compiling one proxy
#[derive(Clone, Copy)]
pub struct BuildEnv<'a> {
    pub context: &'a dyn RoutingContext,
    pub options: &'a GatewayOptions,
    pub proxy: &'a GatewayProxy,
}

impl<'a> BuildEnv<'a> {
    pub fn new(
        context: &'a dyn RoutingContext,
        options: &'a GatewayOptions,
        proxy: &'a GatewayProxy,
    ) -> Self {
        Self { context, options, proxy }
    }

    pub fn mesh(&self) -> &'a MeshConfig {
        self.context.mesh_config()
    }

    pub fn proxy_config(&self) -> &'a ProxyConfig {
        &self.proxy.proxy_config
    }

    /// Visible virtual services ordered by namespace then name
    pub fn sorted_virtual_services(&self) -> Vec<&'a VirtualService> {
        let mut services: Vec<&VirtualService> = self.context.virtual_services().iter().collect();
        services.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));
        services
    }

    /// Virtual services bound to the server's gateway with at least one host the server accepts
    pub fn virtual_services_for(&self, server: &Server) -> Vec<&'a VirtualService> {
        self.sorted_virtual_services()
            .into_iter()
            .filter(|vs| {
                predicates::binds_server(vs, server)
                    && !predicates::pick_matching_gateway_hosts(&server.hosts, vs).is_empty()
            })
            .collect()
    }

    /// Outbound cluster name `outbound|<port>|<subset>|<hostname>` for a destination.
    ///
    /// The port is the destination's own, else the resolved service's only
    /// port, else the gateway server port.
    pub fn cluster_name(&self, destination: &Destination, namespace: &str, server_port: u32) -> String {
        let service = self.context.resolve_service(&destination.host, namespace);
        let hostname = service.map(|s| s.hostname.as_str()).unwrap_or(&destination.host);
        let port = destination
            .port
            .or_else(|| service.and_then(|s| s.single_port()))
            .unwrap_or(server_port);
        let subset = destination.subset.as_deref().unwrap_or_default();
        format!("outbound|{port}|{subset}|{hostname}")
    }
}

impl fmt::Debug for BuildEnv<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildEnv")
            .field("options", self.options)
            .field("proxy", &self.proxy.id)
            .finish_non_exhaustive()
    }
}

/// Compiles gateway proxies into Envoy listeners and route configurations
#[derive(Clone)]
pub struct GatewayConfigGenerator<'a> {
    context: &'a dyn RoutingContext,
    options: GatewayOptions,
    metrics: MetricsRecorder,
}

impl<'a> GatewayConfigGenerator<'a> {
    pub fn new(context: &'a dyn RoutingContext, options: GatewayOptions) -> Self {
        Self { context, options, metrics: MetricsRecorder::new() }
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    pub fn context(&self) -> &'a dyn RoutingContext {
        self.context
    }

    pub(crate) fn env<'p>(&'p self, proxy: &'p GatewayProxy) -> BuildEnv<'p> {
        BuildEnv::new(self.context, &self.options, proxy)
    }
}

impl fmt::Debug for GatewayConfigGenerator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfigGenerator").field("options", &self.options).finish_non_exhaustive()
    }
}
