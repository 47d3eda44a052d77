//! Match predicates shared by the listener and route builders

use super::TransportProtocol;
use crate::domain::host::{self, compare_specificity, namespace_admits, split_namespace};
use crate::domain::{Server, VirtualService};
use std::collections::BTreeMap;

/// Whether a gateway is referenced by a virtual service's gateway list.
/// An empty list binds to every gateway.
pub fn is_gateway_match(gateway: &str, gateway_names: &[String]) -> bool {
    gateway_names.is_empty() || gateway_names.iter().any(|name| name == gateway)
}

/// Whether a route clause restricted to `port` applies to the server. Port 0 matches any server.
pub fn is_port_match(port: u32, server: &Server) -> bool {
    port == 0 || port == server.port.number
}

/// Gateway references of a virtual service, qualified with its namespace
pub fn qualified_gateways(virtual_service: &VirtualService) -> Vec<String> {
    virtual_service
        .gateways
        .iter()
        .map(|gateway| {
            if gateway.contains('/') {
                gateway.clone()
            } else {
                format!("{}/{}", virtual_service.namespace, gateway)
            }
        })
        .collect()
}

/// Whether the virtual service binds to the gateway declaring `server`
pub fn binds_server(virtual_service: &VirtualService, server: &Server) -> bool {
    is_gateway_match(&server.gateway, &qualified_gateways(virtual_service))
}

/// For each virtual-service host, the most specific server host overlapping it.
/// Server hosts covering the entire virtual-service host are preferred.
///
/// Keys are virtual-service hosts, values the matching server hosts with their
/// namespace qualifier removed. Server hosts qualified with another namespace
/// never match; virtual-service hosts without a match are omitted.
pub fn pick_matching_gateway_hosts(
    server_hosts: &[String],
    virtual_service: &VirtualService,
) -> BTreeMap<String, String> {
    let admitted: Vec<&str> = server_hosts
        .iter()
        .map(|h| split_namespace(h))
        .filter(|(qualifier, _)| namespace_admits(*qualifier, &virtual_service.namespace))
        .map(|(_, hostname)| hostname)
        .collect();

    virtual_service
        .hosts
        .iter()
        .filter_map(|vs_host| {
            admitted
                .iter()
                .filter(|gw_host| host::overlaps(gw_host, vs_host))
                .min_by(|a, b| {
                    // Server hosts covering the whole VS host beat narrower ones
                    let a_narrower = !host::covers(a, vs_host);
                    let b_narrower = !host::covers(b, vs_host);
                    a_narrower.cmp(&b_narrower).then_with(|| compare_specificity(a, b))
                })
                .map(|gw_host| (vs_host.clone(), gw_host.to_string()))
        })
        .collect()
}

/// Stable listener name for a bind address, port and transport
pub fn get_listener_name(bind: &str, port: u32, transport: TransportProtocol) -> String {
    match transport {
        TransportProtocol::Tcp => format!("{bind}_{port}"),
        TransportProtocol::Quic => format!("udp_{bind}_{port}"),
    }
}
