//! Gateway listener assembly
//!
//! Servers are grouped by bind address and port number. Each group becomes
//! one TCP listener and, when any server asks for HTTP/3, a QUIC listener on
//! the same port.

use super::filter_chain::{
    build_gateway_http3_filter_chains, build_gateway_tcp_based_filter_chains, requests_http3,
    FilterChainOpts,
};
use super::predicates::get_listener_name;
use super::{BuildEnv, GatewayConfigGenerator, TransportProtocol};
use crate::config::GatewayOptions;
use crate::domain::{GatewayProxy, Server};
use crate::errors::{Error, Result};
use crate::xds::{empty_any, TLS_INSPECTOR_TYPE_URL};
use envoy_types::pb::envoy::config::core::v3::{
    address::Address as AddressType, socket_address, Address, SocketAddress,
};
use envoy_types::pb::envoy::config::listener::v3::{
    listener_filter::ConfigType as ListenerFilterConfigType, Listener, ListenerFilter,
    QuicProtocolOptions, UdpListenerConfig,
};
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument};

pub const TLS_INSPECTOR_FILTER_NAME: &str = "envoy.filters.listener.tls_inspector";

/// Address a gateway listener binds to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayListenerOpts {
    /// Bind address; empty binds the wildcard address
    pub bind: String,
    pub port: u32,
}

impl GatewayListenerOpts {
    pub fn new(bind: impl Into<String>, port: u32) -> Self {
        Self { bind: bind.into(), port }
    }
}

/// A listener skeleton waiting for its filter chains
#[derive(Debug, Clone, PartialEq)]
pub struct MutableGatewayListener {
    pub listener: Listener,
    pub transport: TransportProtocol,
}

/// Create the listener skeleton: name, socket address and transport settings
pub fn build_gateway_listener(
    opts: &GatewayListenerOpts,
    options: &GatewayOptions,
    transport: TransportProtocol,
) -> MutableGatewayListener {
    let address = if opts.bind.is_empty() { options.wildcard_address.clone() } else { opts.bind.clone() };
    let protocol = match transport {
        TransportProtocol::Tcp => socket_address::Protocol::Tcp,
        TransportProtocol::Quic => socket_address::Protocol::Udp,
    };

    let socket_address = SocketAddress {
        protocol: protocol as i32,
        address,
        port_specifier: Some(socket_address::PortSpecifier::PortValue(opts.port)),
        ..Default::default()
    };

    let udp_listener_config = match transport {
        TransportProtocol::Tcp => None,
        TransportProtocol::Quic => Some(UdpListenerConfig {
            quic_options: Some(QuicProtocolOptions::default()),
            ..Default::default()
        }),
    };

    MutableGatewayListener {
        listener: Listener {
            name: get_listener_name(&opts.bind, opts.port, transport),
            address: Some(Address { address: Some(AddressType::SocketAddress(socket_address)) }),
            udp_listener_config,
            ..Default::default()
        },
        transport,
    }
}

impl MutableGatewayListener {
    pub fn name(&self) -> &str {
        &self.listener.name
    }

    /// Attach the filter chains, failing when there are none
    pub fn build(self, chains: Vec<FilterChainOpts>) -> Result<Listener> {
        let Self { mut listener, transport } = self;

        if chains.is_empty() {
            return Err(Error::empty_listener(listener.name));
        }

        if chains.iter().any(FilterChainOpts::matches_tls) {
            listener.listener_filters.push(ListenerFilter {
                name: TLS_INSPECTOR_FILTER_NAME.to_string(),
                config_type: Some(ListenerFilterConfigType::TypedConfig(empty_any(
                    TLS_INSPECTOR_TYPE_URL,
                ))),
                ..Default::default()
            });
        }

        listener.filter_chains = chains.iter().map(|chain| chain.to_filter_chain(transport)).collect();
        Ok(listener)
    }
}

/// A server that declares HTTP/3 must terminate TLS
fn validate_http3_servers(servers: &[&Server], options: &GatewayOptions) -> Result<()> {
    for server in servers.iter().filter(|s| requests_http3(s, options)) {
        if !server.tls_mode().terminates() {
            return Err(Error::config(format!(
                "server {} requests HTTP/3 with TLS mode {:?}; HTTP/3 requires TLS termination",
                server.display_name(),
                server.tls_mode()
            )));
        }
    }
    Ok(())
}

impl GatewayConfigGenerator<'_> {
    /// Compile the proxy's merged gateway into listeners, ordered by port,
    /// bind address, then TCP before QUIC.
    ///
    /// A proxy without a merged gateway has no listeners. Any failure aborts
    /// the whole compilation; no partial listener set is returned.
    #[instrument(skip(self, proxy), fields(proxy_id = %proxy.id))]
    pub fn build_gateway_listeners(&self, proxy: &GatewayProxy) -> Result<Vec<Listener>> {
        let Some(merged) = &proxy.merged_gateway else {
            debug!("Proxy has no merged gateway, no listeners to build");
            return Ok(Vec::new());
        };

        let env = self.env(proxy);
        let mut by_address: BTreeMap<(u32, &str), Vec<&Server>> = BTreeMap::new();
        for port in &merged.server_ports {
            by_address
                .entry((port.number, port.bind.as_str()))
                .or_default()
                .extend(merged.servers_on_port(port));
        }

        let mut listeners = Vec::with_capacity(by_address.len());
        for ((port, bind), servers) in by_address {
            let opts = GatewayListenerOpts::new(bind, port);
            match self.build_listeners_for_address(&env, &opts, &servers) {
                Ok(built) => listeners.extend(built),
                Err(error) => {
                    self.metrics.record_listener_failure();
                    error!(port, bind, error = %error, "Failed to build gateway listener");
                    return Err(error);
                }
            }
        }

        info!(listeners = listeners.len(), "Built gateway listeners");
        Ok(listeners)
    }

    fn build_listeners_for_address(
        &self,
        env: &BuildEnv<'_>,
        opts: &GatewayListenerOpts,
        servers: &[&Server],
    ) -> Result<Vec<Listener>> {
        validate_http3_servers(servers, env.options)?;

        let chains = build_gateway_tcp_based_filter_chains(env, opts.port, servers)?;
        let chain_count = chains.len();
        let tcp = build_gateway_listener(opts, env.options, TransportProtocol::Tcp).build(chains)?;
        self.metrics.record_listener(TransportProtocol::Tcp.as_str(), chain_count);
        debug!(listener = %tcp.name, chains = chain_count, "Built TCP listener");

        let mut listeners = vec![tcp];

        if servers.iter().any(|s| requests_http3(s, env.options)) {
            let chains = build_gateway_http3_filter_chains(env, opts.port, servers)?;
            let chain_count = chains.len();
            let quic = build_gateway_listener(opts, env.options, TransportProtocol::Quic).build(chains)?;
            self.metrics.record_listener(TransportProtocol::Quic.as_str(), chain_count);
            debug!(listener = %quic.name, chains = chain_count, "Built QUIC listener");
            listeners.push(quic);
        }

        Ok(listeners)
    }
}
