//! Filter chains for gateway listeners
//!
//! Servers sharing one port are classified by protocol and TLS mode, merged
//! when they would match identical connections, and turned into filter chains
//! ordered most specific SNI first. Envoy rejects listeners whose chains have
//! identical match criteria, so duplicate SNI names are removed from later
//! chains.

use super::tls::{build_gateway_listener_tls_context, quic_transport_socket, tls_transport_socket};
use super::{predicates, BuildEnv, TransportProtocol, BLACKHOLE_CLUSTER};
use crate::config::GatewayOptions;
use crate::domain::host::{self, specificity, split_namespace, Specificity, WILDCARD};
use crate::domain::{
    ForwardClientCertDetails, Protocol, RouteDestination, Server, TlsMode, VirtualService,
};
use crate::errors::{Error, Result};
use crate::xds::{
    empty_any, to_any, FILE_ACCESS_LOG_TYPE_URL, HTTP_CONNECTION_MANAGER_TYPE_URL, ROUTER_TYPE_URL,
    SNI_CLUSTER_TYPE_URL, TCP_PROXY_TYPE_URL,
};
use envoy_types::pb::envoy::config::accesslog::v3::{
    access_log::ConfigType as AccessLogConfigType, AccessLog,
};
use envoy_types::pb::envoy::config::core::v3::{
    config_source::ConfigSourceSpecifier, AggregatedConfigSource, ApiVersion, ConfigSource,
    Http3ProtocolOptions,
};
use envoy_types::pb::envoy::config::listener::v3::{
    filter::ConfigType as FilterConfigType, Filter, FilterChain, FilterChainMatch,
};
use envoy_types::pb::envoy::extensions::access_loggers::file::v3::FileAccessLog;
use envoy_types::pb::envoy::extensions::filters::http::router::v3::Router as RouterFilter;
use envoy_types::pb::envoy::extensions::filters::network::http_connection_manager::v3::{
    http_connection_manager::{
        CodecType, RouteSpecifier, SetCurrentClientCertDetails, UpgradeConfig,
    },
    http_filter::ConfigType as HttpFilterConfigType,
    HttpConnectionManager, HttpFilter, Rds,
};
use envoy_types::pb::envoy::extensions::filters::network::tcp_proxy::v3::{
    tcp_proxy::{self, weighted_cluster::ClusterWeight},
    TcpProxy,
};
use envoy_types::pb::envoy::extensions::transport_sockets::tls::v3::DownstreamTlsContext;
use envoy_types::pb::google::protobuf::BoolValue;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

pub const HTTP_CONNECTION_MANAGER_FILTER_NAME: &str = "envoy.filters.network.http_connection_manager";
pub const TCP_PROXY_FILTER_NAME: &str = "envoy.filters.network.tcp_proxy";
pub const SNI_CLUSTER_FILTER_NAME: &str = "envoy.filters.network.sni_cluster";
pub const ROUTER_FILTER_NAME: &str = "envoy.filters.http.router";
pub const FILE_ACCESS_LOG_NAME: &str = "envoy.access_loggers.file";

/// `transport_protocol` matched by chains expecting a TLS handshake
pub const TLS_TRANSPORT_PROTOCOL: &str = "tls";
/// `transport_protocol` matched by chains on QUIC listeners
pub const QUIC_TRANSPORT_PROTOCOL: &str = "quic";

/// Match criteria of one filter chain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChainMatchOpts {
    pub transport_protocol: String,
    /// SNI names; empty matches any name
    pub sni_domains: Vec<String>,
    pub application_protocols: Vec<String>,
}

impl FilterChainMatchOpts {
    fn new(transport_protocol: &str, sni_domains: Vec<String>) -> Self {
        Self {
            transport_protocol: transport_protocol.to_string(),
            sni_domains,
            application_protocols: Vec::new(),
        }
    }

    fn to_envoy(&self) -> Option<FilterChainMatch> {
        if self.transport_protocol.is_empty()
            && self.sni_domains.is_empty()
            && self.application_protocols.is_empty()
        {
            return None;
        }

        Some(FilterChainMatch {
            server_names: self.sni_domains.clone(),
            transport_protocol: self.transport_protocol.clone(),
            application_protocols: self.application_protocols.clone(),
            ..Default::default()
        })
    }
}

/// Network filter terminating a filter chain
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalFilter {
    HttpConnectionManager(Box<HttpConnectionManager>),
    /// TCP proxy, optionally preceded by `sni_cluster` which picks the cluster from SNI
    TcpProxy { proxy: Box<TcpProxy>, sni_cluster: bool },
}

impl TerminalFilter {
    fn network_filters(&self) -> Vec<Filter> {
        match self {
            TerminalFilter::HttpConnectionManager(hcm) => vec![network_filter(
                HTTP_CONNECTION_MANAGER_FILTER_NAME,
                to_any(HTTP_CONNECTION_MANAGER_TYPE_URL, hcm.as_ref()),
            )],
            TerminalFilter::TcpProxy { proxy, sni_cluster } => {
                let mut filters = Vec::with_capacity(2);
                if *sni_cluster {
                    filters.push(network_filter(
                        SNI_CLUSTER_FILTER_NAME,
                        empty_any(SNI_CLUSTER_TYPE_URL),
                    ));
                }
                filters.push(network_filter(
                    TCP_PROXY_FILTER_NAME,
                    to_any(TCP_PROXY_TYPE_URL, proxy.as_ref()),
                ));
                filters
            }
        }
    }
}

fn network_filter(name: &str, config: envoy_types::pb::google::protobuf::Any) -> Filter {
    Filter { name: name.to_string(), config_type: Some(FilterConfigType::TypedConfig(config)) }
}

/// A filter chain before it is attached to a listener
#[derive(Debug, Clone, PartialEq)]
pub struct FilterChainOpts {
    pub match_criteria: FilterChainMatchOpts,
    pub tls_context: Option<DownstreamTlsContext>,
    pub terminal: TerminalFilter,
}

impl FilterChainOpts {
    /// Render as an Envoy filter chain for a listener of the given transport
    pub fn to_filter_chain(&self, transport: TransportProtocol) -> FilterChain {
        let transport_socket = self.tls_context.clone().map(|context| match transport {
            TransportProtocol::Tcp => tls_transport_socket(context),
            TransportProtocol::Quic => quic_transport_socket(context),
        });

        FilterChain {
            filter_chain_match: self.match_criteria.to_envoy(),
            filters: self.terminal.network_filters(),
            transport_socket,
            ..Default::default()
        }
    }

    /// Whether Envoy must inspect the TLS handshake to select this chain
    pub fn matches_tls(&self) -> bool {
        self.match_criteria.transport_protocol == TLS_TRANSPORT_PROTOCOL
    }
}

/// How a server's connections are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Treatment {
    PlaintextHttp,
    TerminatedHttp,
    TerminatedTcp,
    Passthrough,
    AutoPassthrough,
    PlaintextTcp,
}

impl Treatment {
    fn matches_sni(self) -> bool {
        !matches!(self, Treatment::PlaintextHttp | Treatment::PlaintextTcp)
    }
}

fn classify(server: &Server) -> Result<Treatment> {
    let protocol = server.protocol();
    let mode = server.tls_mode();

    let treatment = match mode {
        TlsMode::Disable if protocol.requires_tls() => {
            return Err(Error::config(format!(
                "server {} declares protocol {} without terminating or passthrough TLS settings",
                server.display_name(),
                protocol
            )))
        }
        TlsMode::Disable if protocol.is_http_family() => Treatment::PlaintextHttp,
        TlsMode::Disable => Treatment::PlaintextTcp,
        TlsMode::Passthrough => Treatment::Passthrough,
        TlsMode::AutoPassthrough => Treatment::AutoPassthrough,
        _ if protocol.is_http_capable() => Treatment::TerminatedHttp,
        _ => Treatment::TerminatedTcp,
    };

    Ok(treatment)
}

/// SNI names of a server: hosts without namespace qualifiers, sorted and
/// deduplicated. A bare `*` host removes the SNI restriction entirely.
pub fn server_sni_domains(server: &Server) -> Vec<String> {
    let mut domains: Vec<String> =
        server.hosts.iter().map(|h| split_namespace(h).1.to_string()).collect();
    if domains.iter().any(|d| d == WILDCARD) {
        return Vec::new();
    }
    domains.sort();
    domains.dedup();
    domains
}

/// Whether a server asks for an HTTP/3 listener
pub fn requests_http3(server: &Server, options: &GatewayOptions) -> bool {
    match server.protocol() {
        Protocol::Http3 => true,
        Protocol::Https => options.enable_quic_listeners && server.tls_mode().terminates(),
        _ => false,
    }
}

/// Servers compiled into one chain
struct ServerGroup<'s> {
    treatment: Treatment,
    mode: TlsMode,
    sni_domains: Vec<String>,
    servers: Vec<&'s Server>,
}

impl<'s> ServerGroup<'s> {
    /// The server providing TLS settings and route name for the group
    fn primary(&self) -> &'s Server {
        self.servers[0]
    }
}

fn group_servers<'s>(port: u32, servers: &[&'s Server]) -> Result<Vec<ServerGroup<'s>>> {
    let mut groups: Vec<ServerGroup<'s>> = Vec::new();

    for &server in servers {
        let treatment = classify(server)?;
        let mode = server.tls_mode();
        let sni_domains = if treatment.matches_sni() { server_sni_domains(server) } else { Vec::new() };

        let existing = groups.iter_mut().find(|g| {
            g.treatment == treatment && g.mode == mode && g.sni_domains == sni_domains
        });

        match existing {
            Some(group) => {
                let primary = group.primary();
                if primary.tls != server.tls || primary.route_name != server.route_name {
                    warn!(
                        port,
                        server = %server.display_name(),
                        kept = %primary.display_name(),
                        "Servers match identical connections but differ in TLS or route settings, keeping the first"
                    );
                }
                group.servers.push(server);
            }
            None => groups.push(ServerGroup { treatment, mode, sni_domains, servers: vec![server] }),
        }
    }

    Ok(groups)
}

/// Build the filter chains of a TCP listener from the servers bound to its port
pub fn build_gateway_tcp_based_filter_chains(
    env: &BuildEnv<'_>,
    port: u32,
    servers: &[&Server],
) -> Result<Vec<FilterChainOpts>> {
    let groups = group_servers(port, servers)?;
    let mut chains = Vec::with_capacity(groups.len());

    for group in &groups {
        let primary = group.primary();
        match group.treatment {
            Treatment::PlaintextHttp => chains.push(FilterChainOpts {
                match_criteria: FilterChainMatchOpts::default(),
                tls_context: None,
                terminal: http_terminal(env, &primary.route_name, false),
            }),
            Treatment::TerminatedHttp => chains.push(FilterChainOpts {
                match_criteria: FilterChainMatchOpts::new(
                    TLS_TRANSPORT_PROTOCOL,
                    group.sni_domains.clone(),
                ),
                tls_context: Some(terminating_context(env, primary, TransportProtocol::Tcp)?),
                terminal: http_terminal(env, &primary.route_name, false),
            }),
            Treatment::TerminatedTcp => chains.push(FilterChainOpts {
                match_criteria: FilterChainMatchOpts::new(
                    TLS_TRANSPORT_PROTOCOL,
                    group.sni_domains.clone(),
                ),
                tls_context: Some(terminating_context(env, primary, TransportProtocol::Tcp)?),
                terminal: tcp_terminal(tcp_route_proxy(env, group, port), false),
            }),
            Treatment::PlaintextTcp => chains.push(FilterChainOpts {
                match_criteria: FilterChainMatchOpts::default(),
                tls_context: None,
                terminal: tcp_terminal(tcp_route_proxy(env, group, port), false),
            }),
            Treatment::Passthrough => chains.extend(passthrough_chains(env, group, port)),
            Treatment::AutoPassthrough => chains.push(FilterChainOpts {
                match_criteria: FilterChainMatchOpts::new(
                    TLS_TRANSPORT_PROTOCOL,
                    group.sni_domains.clone(),
                ),
                tls_context: None,
                terminal: tcp_terminal(build_tcp_proxy(TcpTarget::blackhole()), true),
            }),
        }
    }

    debug!(port, servers = servers.len(), chains = chains.len(), "Built TCP filter chains");
    Ok(order_filter_chains(port, chains))
}

/// Build the filter chains of a QUIC listener from the HTTP/3 servers bound to its port
pub fn build_gateway_http3_filter_chains(
    env: &BuildEnv<'_>,
    port: u32,
    servers: &[&Server],
) -> Result<Vec<FilterChainOpts>> {
    let mut groups: Vec<(Vec<String>, &Server)> = Vec::new();

    for &server in servers.iter().filter(|s| requests_http3(s, env.options)) {
        if !server.tls_mode().terminates() {
            return Err(Error::config(format!(
                "server {} requests HTTP/3 but TLS mode {:?} does not terminate TLS",
                server.display_name(),
                server.tls_mode()
            )));
        }

        let sni_domains = server_sni_domains(server);
        if groups.iter().any(|(domains, _)| *domains == sni_domains) {
            debug!(port, server = %server.display_name(), "Merged HTTP/3 server into existing chain");
            continue;
        }
        groups.push((sni_domains, server));
    }

    let chains = groups
        .into_iter()
        .map(|(sni_domains, server)| {
            Ok(FilterChainOpts {
                match_criteria: FilterChainMatchOpts::new(QUIC_TRANSPORT_PROTOCOL, sni_domains),
                tls_context: Some(terminating_context(env, server, TransportProtocol::Quic)?),
                terminal: http_terminal(env, &server.route_name, true),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(order_filter_chains(port, chains))
}

fn terminating_context(
    env: &BuildEnv<'_>,
    server: &Server,
    transport: TransportProtocol,
) -> Result<DownstreamTlsContext> {
    build_gateway_listener_tls_context(env.mesh(), server, transport)?.ok_or_else(|| {
        Error::internal(format!("server {} produced no TLS context", server.display_name()))
    })
}

fn http_terminal(env: &BuildEnv<'_>, route_name: &str, http3: bool) -> TerminalFilter {
    TerminalFilter::HttpConnectionManager(Box::new(build_gateway_connection_manager(
        env, route_name, http3,
    )))
}

fn tcp_terminal(proxy: TcpProxy, sni_cluster: bool) -> TerminalFilter {
    TerminalFilter::TcpProxy { proxy: Box::new(proxy), sni_cluster }
}

/// Upstream selection for a TCP proxy
#[derive(Debug, Clone, PartialEq, Eq)]
enum TcpTarget {
    Cluster(String),
    Weighted(Vec<(String, u32)>),
}

impl TcpTarget {
    fn blackhole() -> Self {
        TcpTarget::Cluster(BLACKHOLE_CLUSTER.to_string())
    }

    fn from_destinations(
        env: &BuildEnv<'_>,
        destinations: &[RouteDestination],
        namespace: &str,
        port: u32,
    ) -> Self {
        match destinations {
            [] => TcpTarget::blackhole(),
            [only] => TcpTarget::Cluster(env.cluster_name(&only.destination, namespace, port)),
            many => {
                let all_zero = many.iter().all(|d| d.weight == 0);
                TcpTarget::Weighted(
                    many.iter()
                        .filter(|d| all_zero || d.weight > 0)
                        .map(|d| {
                            let weight = if all_zero { 1 } else { d.weight };
                            (env.cluster_name(&d.destination, namespace, port), weight)
                        })
                        .collect(),
                )
            }
        }
    }
}

fn build_tcp_proxy(target: TcpTarget) -> TcpProxy {
    match target {
        TcpTarget::Cluster(cluster) => TcpProxy {
            stat_prefix: cluster.clone(),
            cluster_specifier: Some(tcp_proxy::ClusterSpecifier::Cluster(cluster)),
            ..Default::default()
        },
        TcpTarget::Weighted(clusters) => TcpProxy {
            stat_prefix: clusters.first().map(|(name, _)| name.clone()).unwrap_or_default(),
            cluster_specifier: Some(tcp_proxy::ClusterSpecifier::WeightedClusters(
                tcp_proxy::WeightedCluster {
                    clusters: clusters
                        .into_iter()
                        .map(|(name, weight)| ClusterWeight { name, weight, ..Default::default() })
                        .collect(),
                    ..Default::default()
                },
            )),
            ..Default::default()
        },
    }
}

/// Virtual services bound to any server of the group, each once
fn group_virtual_services<'a>(env: &BuildEnv<'a>, group: &ServerGroup<'_>) -> Vec<&'a VirtualService> {
    let mut seen = BTreeMap::new();
    for server in &group.servers {
        for vs in env.virtual_services_for(server) {
            seen.entry((vs.namespace.as_str(), vs.name.as_str())).or_insert(vs);
        }
    }
    seen.into_values().collect()
}

/// TCP proxy for the first port-matched TCP route of a bound virtual service
fn tcp_route_proxy(env: &BuildEnv<'_>, group: &ServerGroup<'_>, port: u32) -> TcpProxy {
    let primary = group.primary();
    let target = group_virtual_services(env, group)
        .into_iter()
        .find_map(|vs| {
            vs.tcp
                .iter()
                .find(|route| predicates::is_port_match(route.port, primary))
                .map(|route| TcpTarget::from_destinations(env, &route.route, &vs.namespace, port))
        })
        .unwrap_or_else(TcpTarget::blackhole);

    build_tcp_proxy(target)
}

/// SNI names matched by both a chain and a TLS route.
/// `None` when they share no name; an empty list means unrestricted.
fn intersect_sni(chain_domains: &[String], route_hosts: &[String]) -> Option<Vec<String>> {
    let chain_hosts: Vec<&str> = if chain_domains.is_empty() {
        vec![WILDCARD]
    } else {
        chain_domains.iter().map(String::as_str).collect()
    };

    let mut shared = BTreeSet::new();
    for route_host in route_hosts {
        for chain_host in &chain_hosts {
            if host::overlaps(chain_host, route_host) {
                shared.insert(host::more_specific(chain_host, route_host).to_string());
            }
        }
    }

    if shared.is_empty() {
        None
    } else if shared.contains(WILDCARD) {
        Some(Vec::new())
    } else {
        Some(shared.into_iter().collect())
    }
}

/// One chain per TLS route claiming part of the group's SNI names, plus a
/// blackhole chain for names no route claims
fn passthrough_chains(env: &BuildEnv<'_>, group: &ServerGroup<'_>, port: u32) -> Vec<FilterChainOpts> {
    let primary = group.primary();
    let mut chains = Vec::new();
    let mut claimed = BTreeSet::new();
    let mut claimed_all = false;

    for vs in group_virtual_services(env, group) {
        for route in vs.tls.iter().filter(|r| predicates::is_port_match(r.port, primary)) {
            let Some(sni_domains) = intersect_sni(&group.sni_domains, &route.sni_hosts) else {
                continue;
            };
            if sni_domains.is_empty() {
                claimed_all = true;
            }
            claimed.extend(sni_domains.iter().cloned());

            let target = TcpTarget::from_destinations(env, &route.route, &vs.namespace, port);
            chains.push(FilterChainOpts {
                match_criteria: FilterChainMatchOpts::new(TLS_TRANSPORT_PROTOCOL, sni_domains),
                tls_context: None,
                terminal: tcp_terminal(build_tcp_proxy(target), false),
            });
        }
    }

    let unclaimed: Vec<String> =
        group.sni_domains.iter().filter(|d| !claimed.contains(*d)).cloned().collect();
    let needs_blackhole = if group.sni_domains.is_empty() { !claimed_all } else { !unclaimed.is_empty() };

    if needs_blackhole {
        chains.push(FilterChainOpts {
            match_criteria: FilterChainMatchOpts::new(TLS_TRANSPORT_PROTOCOL, unclaimed),
            tls_context: None,
            terminal: tcp_terminal(build_tcp_proxy(TcpTarget::blackhole()), false),
        });
    }

    chains
}

/// Least specific SNI name of a chain; unrestricted chains rank last
fn sni_rank(chain: &FilterChainOpts) -> Specificity {
    chain.match_criteria.sni_domains.iter().map(|d| specificity(d)).max().unwrap_or(Specificity::Any)
}

/// Whether `broad` has an SNI name strictly covering a name of `narrow` on the same transport
fn shadows(broad: &FilterChainOpts, narrow: &FilterChainOpts) -> bool {
    broad.match_criteria.transport_protocol == narrow.match_criteria.transport_protocol
        && broad.match_criteria.sni_domains.iter().any(|b| {
            narrow
                .match_criteria
                .sni_domains
                .iter()
                .any(|n| host::covers(b, n) && !host::covers(n, b))
        })
}

/// Move every chain after the chains it shadows, keeping sorted order otherwise
fn place_covering_chains_last(port: u32, chains: Vec<FilterChainOpts>) -> Vec<FilterChainOpts> {
    let count = chains.len();
    let mut placed = vec![false; count];
    let mut order = Vec::with_capacity(count);

    while order.len() < count {
        let ready = (0..count).filter(|&i| !placed[i]).find(|&i| {
            (0..count).all(|j| placed[j] || j == i || !shadows(&chains[i], &chains[j]))
        });
        let next = match ready {
            Some(next) => next,
            None => {
                warn!(port, "Filter chains cover each other's SNI names, keeping sorted order");
                match (0..count).find(|&i| !placed[i]) {
                    Some(next) => next,
                    None => break,
                }
            }
        };
        placed[next] = true;
        order.push(next);
    }

    let mut slots: Vec<Option<FilterChainOpts>> = chains.into_iter().map(Some).collect();
    order.into_iter().filter_map(|i| slots[i].take()).collect()
}

/// Order chains most specific first and remove SNI names already matched by an earlier chain
fn order_filter_chains(port: u32, mut chains: Vec<FilterChainOpts>) -> Vec<FilterChainOpts> {
    // Stable sort keeps visiting order for ties
    chains.sort_by(|a, b| {
        sni_rank(a)
            .cmp(&sni_rank(b))
            .then_with(|| a.match_criteria.sni_domains.first().cmp(&b.match_criteria.sni_domains.first()))
    });
    let chains = place_covering_chains_last(port, chains);

    let mut claimed: BTreeSet<(String, String)> = BTreeSet::new();
    let mut unrestricted: BTreeSet<String> = BTreeSet::new();
    let mut ordered = Vec::with_capacity(chains.len());

    for mut chain in chains {
        let transport = chain.match_criteria.transport_protocol.clone();

        if chain.match_criteria.sni_domains.is_empty() {
            if !unrestricted.insert(transport.clone()) {
                warn!(port, transport = %transport, "Dropping filter chain duplicating an earlier unrestricted match");
                continue;
            }
            ordered.push(chain);
            continue;
        }

        chain.match_criteria.sni_domains.retain(|domain| {
            let fresh = claimed.insert((transport.clone(), domain.clone()));
            if !fresh {
                warn!(port, sni = %domain, "Removing SNI name already matched by an earlier filter chain");
            }
            fresh
        });

        if chain.match_criteria.sni_domains.is_empty() {
            warn!(port, "Dropping filter chain with no remaining SNI names");
            continue;
        }
        ordered.push(chain);
    }

    ordered
}

/// HTTP connection manager for a gateway server, loading routes over RDS
pub fn build_gateway_connection_manager(
    env: &BuildEnv<'_>,
    route_name: &str,
    http3: bool,
) -> HttpConnectionManager {
    let topology = &env.proxy_config().gateway_topology;
    let client_cert = topology.forward_client_cert_details;

    HttpConnectionManager {
        codec_type: (if http3 { CodecType::Http3 } else { CodecType::Auto }) as i32,
        stat_prefix: route_name.to_string(),
        route_specifier: Some(RouteSpecifier::Rds(Rds {
            route_config_name: route_name.to_string(),
            config_source: Some(ConfigSource {
                config_source_specifier: Some(ConfigSourceSpecifier::Ads(
                    AggregatedConfigSource::default(),
                )),
                resource_api_version: ApiVersion::V3 as i32,
                ..Default::default()
            }),
        })),
        http_filters: vec![router_filter()],
        use_remote_address: Some(BoolValue { value: true }),
        xff_num_trusted_hops: topology.num_trusted_proxies,
        forward_client_cert_details: forward_client_cert_code(client_cert),
        set_current_client_cert_details: client_cert.sets_current_details().then(|| {
            SetCurrentClientCertDetails {
                subject: Some(BoolValue { value: true }),
                cert: true,
                dns: true,
                uri: true,
                ..Default::default()
            }
        }),
        generate_request_id: Some(BoolValue { value: true }),
        normalize_path: Some(BoolValue { value: true }),
        upgrade_configs: vec![UpgradeConfig {
            upgrade_type: "websocket".to_string(),
            ..Default::default()
        }],
        access_log: env.mesh().access_log_file.as_deref().map(build_access_log).into_iter().collect(),
        http3_protocol_options: http3.then(Http3ProtocolOptions::default),
        ..Default::default()
    }
}

/// Envoy `ForwardClientCertDetails` enum values
fn forward_client_cert_code(details: ForwardClientCertDetails) -> i32 {
    match details {
        ForwardClientCertDetails::Sanitize => 0,
        ForwardClientCertDetails::ForwardOnly => 1,
        ForwardClientCertDetails::AppendForward => 2,
        ForwardClientCertDetails::SanitizeSet => 3,
        ForwardClientCertDetails::AlwaysForwardOnly => 4,
    }
}

fn router_filter() -> HttpFilter {
    HttpFilter {
        name: ROUTER_FILTER_NAME.to_string(),
        is_optional: false,
        disabled: false,
        config_type: Some(HttpFilterConfigType::TypedConfig(to_any(
            ROUTER_TYPE_URL,
            &RouterFilter::default(),
        ))),
    }
}

fn build_access_log(path: &str) -> AccessLog {
    let file_log = FileAccessLog { path: path.to_string(), access_log_format: None };

    AccessLog {
        name: FILE_ACCESS_LOG_NAME.to_string(),
        filter: None,
        config_type: Some(AccessLogConfigType::TypedConfig(to_any(
            FILE_ACCESS_LOG_TYPE_URL,
            &file_log,
        ))),
    }
}
