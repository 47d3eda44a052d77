use anyhow::Context;
use envoy_types::pb::envoy::config::listener::v3::{filter::ConfigType, Filter};
use envoy_types::pb::envoy::extensions::filters::network::http_connection_manager::v3::HttpConnectionManager;
use envoy_types::pb::envoy::extensions::filters::network::tcp_proxy::v3::TcpProxy;
use flowplane_gateway::domain::{
    GatewayProxy, MergedGateway, Server, ServiceIdentity, VirtualService,
};
use flowplane_gateway::InMemoryRoutingContext;
use prost::Message;
use serde::Deserialize;

/// A gateway proxy and the routing state it sees, loaded from YAML.
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub proxy_id: String,
    pub servers: Vec<Server>,
    #[serde(default)]
    pub virtual_services: Vec<VirtualService>,
    #[serde(default)]
    pub services: Vec<ServiceIdentity>,
}

impl Fixture {
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("parse gateway fixture")
    }

    pub fn proxy(&self) -> GatewayProxy {
        GatewayProxy::new(
            self.proxy_id.clone(),
            Some(MergedGateway::from_servers(self.servers.iter().cloned())),
        )
    }

    pub fn context(&self) -> InMemoryRoutingContext {
        let mut context = InMemoryRoutingContext::default();
        for vs in &self.virtual_services {
            context.add_virtual_service(vs.clone());
        }
        for service in &self.services {
            context.add_service(service.clone());
        }
        context
    }
}

/// HTTPS passthrough and SIMPLE termination sharing port 443.
pub const MIXED_TLS_443: &str = r#"
proxy_id: router~10.0.0.1~ingress.istio-system
servers:
  - port: { number: 443, protocol: HTTPS }
    hosts: ["a.example.com"]
    tls: { mode: SIMPLE, credential_name: a-cert }
    route_name: https.443.a
    gateway: istio-system/ingress
  - port: { number: 443, protocol: TLS }
    hosts: ["b.example.com"]
    tls: { mode: PASSTHROUGH }
    gateway: istio-system/ingress
virtual_services:
  - name: b-passthrough
    namespace: default
    hosts: ["b.example.com"]
    gateways: ["istio-system/ingress"]
    tls:
      - sni_hosts: ["b.example.com"]
        route:
          - destination: { host: b-backend, port: 8443 }
"#;

/// The same port with the passthrough server declared as HTTPS.
pub const HTTPS_PASSTHROUGH_443: &str = r#"
proxy_id: router~10.0.0.1~ingress.istio-system
servers:
  - port: { number: 443, protocol: HTTPS }
    hosts: ["a.example.com"]
    tls: { mode: SIMPLE, credential_name: a-cert }
    route_name: https.443.a
    gateway: istio-system/ingress
  - port: { number: 443, protocol: HTTPS }
    hosts: ["b.example.com"]
    tls: { mode: PASSTHROUGH }
    gateway: istio-system/ingress
virtual_services:
  - name: b-passthrough
    namespace: default
    hosts: ["b.example.com"]
    gateways: ["istio-system/ingress"]
    tls:
      - sni_hosts: ["b.example.com"]
        route:
          - destination: { host: b-backend, port: 8443 }
"#;

/// HTTP/3 server terminating with certificate files.
pub const HTTP3_443: &str = r#"
proxy_id: router~10.0.0.2~ingress.istio-system
servers:
  - port: { number: 443, protocol: HTTP3 }
    hosts: ["*.example.com"]
    tls:
      mode: SIMPLE
      server_certificate: /etc/certs/cert.pem
      private_key: /etc/certs/key.pem
    route_name: https.443
    gateway: istio-system/ingress
"#;

/// HTTP server on port 80 with two virtual services sharing hosts.
pub const HTTP_80: &str = r#"
proxy_id: router~10.0.0.3~ingress.istio-system
servers:
  - port: { number: 80, protocol: HTTP }
    hosts: ["*"]
    route_name: http.80
    gateway: istio-system/ingress
virtual_services:
  - name: site
    namespace: default
    hosts: ["a.com", "www.a.com"]
    gateways: ["istio-system/ingress"]
    http:
      - name: site
        route:
          - destination: { host: site }
  - name: reviews
    namespace: bookinfo
    hosts: ["reviews.example.com"]
    gateways: ["istio-system/ingress"]
    http:
      - name: v2
        match:
          - uri: { prefix: /v2 }
        route:
          - destination: { host: reviews, subset: v2 }
      - name: default
        route:
          - destination: { host: reviews, subset: v1 }
            weight: 80
          - destination: { host: reviews, subset: v2 }
            weight: 20
  - name: unbound
    namespace: default
    hosts: ["c.com"]
    gateways: ["ingress"]
    http:
      - route:
          - destination: { host: c }
services:
  - hostname: reviews.bookinfo.svc.cluster.local
    namespace: bookinfo
    ports:
      - { port: 9080, protocol: HTTP }
"#;

/// Decode the typed config of a network filter.
pub fn decode_filter<M: Message + Default>(filter: &Filter) -> M {
    match &filter.config_type {
        Some(ConfigType::TypedConfig(any)) => {
            M::decode(any.value.as_slice()).expect("decode filter config")
        }
        other => panic!("filter {} has no typed config: {other:?}", filter.name),
    }
}

pub fn decode_hcm(filter: &Filter) -> HttpConnectionManager {
    decode_filter(filter)
}

pub fn decode_tcp_proxy(filter: &Filter) -> TcpProxy {
    decode_filter(filter)
}
