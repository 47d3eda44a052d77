use crate::gateway::support::{
    decode_hcm, decode_tcp_proxy, Fixture, HTTP3_443, HTTPS_PASSTHROUGH_443, MIXED_TLS_443,
};
use envoy_types::pb::envoy::config::core::v3::{address::Address as AddressType, socket_address};
use envoy_types::pb::envoy::extensions::filters::network::http_connection_manager::v3::http_connection_manager::{
    CodecType, RouteSpecifier,
};
use envoy_types::pb::envoy::extensions::filters::network::tcp_proxy::v3::tcp_proxy::ClusterSpecifier;
use flowplane_gateway::domain::{GatewayProxy, Protocol, ServerPort};
use flowplane_gateway::xds::gateway::filter_chain::{
    HTTP_CONNECTION_MANAGER_FILTER_NAME, TCP_PROXY_FILTER_NAME,
};
use flowplane_gateway::xds::gateway::listener::TLS_INSPECTOR_FILTER_NAME;
use flowplane_gateway::{Error, GatewayConfigGenerator, GatewayOptions};

#[test]
fn passthrough_and_simple_share_one_listener() -> anyhow::Result<()> {
    assert_passthrough_and_simple_share_one_listener(MIXED_TLS_443)
}

#[test]
fn https_passthrough_and_simple_share_one_listener() -> anyhow::Result<()> {
    assert_passthrough_and_simple_share_one_listener(HTTPS_PASSTHROUGH_443)
}

fn assert_passthrough_and_simple_share_one_listener(yaml: &str) -> anyhow::Result<()> {
    let fixture = Fixture::from_yaml(yaml)?;
    let context = fixture.context();
    let generator = GatewayConfigGenerator::new(&context, GatewayOptions::default());

    let listeners = generator.build_gateway_listeners(&fixture.proxy())?;
    assert_eq!(listeners.len(), 1);

    let listener = &listeners[0];
    assert_eq!(listener.name, "_443");
    assert_eq!(listener.filter_chains.len(), 2);
    assert!(listener.listener_filters.iter().any(|f| f.name == TLS_INSPECTOR_FILTER_NAME));

    let terminated = &listener.filter_chains[0];
    let terminated_match = terminated.filter_chain_match.as_ref().expect("terminated chain match");
    assert_eq!(terminated_match.server_names, vec!["a.example.com"]);
    assert_eq!(terminated_match.transport_protocol, "tls");
    assert_eq!(
        terminated.transport_socket.as_ref().map(|s| s.name.as_str()),
        Some("envoy.transport_sockets.tls")
    );
    assert_eq!(terminated.filters[0].name, HTTP_CONNECTION_MANAGER_FILTER_NAME);
    let hcm = decode_hcm(&terminated.filters[0]);
    match hcm.route_specifier {
        Some(RouteSpecifier::Rds(rds)) => assert_eq!(rds.route_config_name, "https.443.a"),
        other => panic!("expected RDS, got {other:?}"),
    }

    let passthrough = &listener.filter_chains[1];
    let passthrough_match = passthrough.filter_chain_match.as_ref().expect("passthrough chain match");
    assert_eq!(passthrough_match.server_names, vec!["b.example.com"]);
    assert!(passthrough.transport_socket.is_none());
    assert_eq!(passthrough.filters[0].name, TCP_PROXY_FILTER_NAME);
    let tcp_proxy = decode_tcp_proxy(&passthrough.filters[0]);
    assert_eq!(
        tcp_proxy.cluster_specifier,
        Some(ClusterSpecifier::Cluster("outbound|8443||b-backend".to_string()))
    );
    Ok(())
}

#[test]
fn http3_server_adds_quic_listener() -> anyhow::Result<()> {
    let fixture = Fixture::from_yaml(HTTP3_443)?;
    let context = fixture.context();
    let generator = GatewayConfigGenerator::new(&context, GatewayOptions::default());

    let listeners = generator.build_gateway_listeners(&fixture.proxy())?;
    let names: Vec<&str> = listeners.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["_443", "udp__443"]);

    let quic = &listeners[1];
    let Some(AddressType::SocketAddress(address)) =
        quic.address.as_ref().and_then(|a| a.address.clone())
    else {
        panic!("QUIC listener without socket address");
    };
    assert_eq!(address.protocol, socket_address::Protocol::Udp as i32);
    assert_eq!(address.address, "0.0.0.0");
    assert!(quic.udp_listener_config.is_some());

    let chain = &quic.filter_chains[0];
    assert_eq!(
        chain.filter_chain_match.as_ref().map(|m| m.transport_protocol.as_str()),
        Some("quic")
    );
    assert_eq!(
        chain.transport_socket.as_ref().map(|s| s.name.as_str()),
        Some("envoy.transport_sockets.quic")
    );
    let hcm = decode_hcm(&chain.filters[0]);
    assert_eq!(hcm.codec_type, CodecType::Http3 as i32);
    assert!(hcm.http3_protocol_options.is_some());
    Ok(())
}

#[test]
fn http3_passthrough_is_rejected() -> anyhow::Result<()> {
    let mut fixture = Fixture::from_yaml(HTTP3_443)?;
    if let Some(tls) = fixture.servers[0].tls.as_mut() {
        tls.mode = flowplane_gateway::domain::TlsMode::Passthrough;
    }
    let context = fixture.context();
    let generator = GatewayConfigGenerator::new(&context, GatewayOptions::default());

    let err = generator.build_gateway_listeners(&fixture.proxy()).unwrap_err();
    assert!(matches!(err, Error::Config(_)), "unexpected error: {err}");
    Ok(())
}

#[test]
fn proxy_without_gateway_has_no_listeners() {
    let context = flowplane_gateway::InMemoryRoutingContext::default();
    let generator = GatewayConfigGenerator::new(&context, GatewayOptions::default());

    let listeners = generator
        .build_gateway_listeners(&GatewayProxy::new("sidecar~10.0.0.9", None))
        .expect("no gateway is not an error");
    assert!(listeners.is_empty());
}

#[test]
fn bind_addresses_produce_separate_listeners() -> anyhow::Result<()> {
    let mut fixture = Fixture::from_yaml(crate::gateway::support::HTTP_80)?;
    let mut internal = fixture.servers[0].clone();
    internal.port = ServerPort::new(80, Protocol::Http).with_bind("10.0.0.3");
    fixture.servers.push(internal);

    let context = fixture.context();
    let generator = GatewayConfigGenerator::new(&context, GatewayOptions::default());

    let listeners = generator.build_gateway_listeners(&fixture.proxy())?;
    let names: Vec<&str> = listeners.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["_80", "10.0.0.3_80"]);
    assert!(listeners.iter().all(|l| l.listener_filters.is_empty()));
    Ok(())
}
