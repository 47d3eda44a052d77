//! Downstream TLS contexts for gateway servers

use super::TransportProtocol;
use crate::domain::{MeshConfig, Protocol, Server, TlsMode, TlsPolicy, TlsProtocolVersion};
use crate::errors::{Error, Result};
use crate::xds::{to_any, DOWNSTREAM_TLS_CONTEXT_TYPE_URL, QUIC_DOWNSTREAM_TRANSPORT_TYPE_URL};
use envoy_types::pb::envoy::config::core::v3::{
    config_source::ConfigSourceSpecifier, data_source,
    transport_socket::ConfigType as TransportSocketConfigType, AggregatedConfigSource, ApiVersion,
    ConfigSource, DataSource, TransportSocket,
};
use envoy_types::pb::envoy::extensions::transport_sockets::quic::v3::QuicDownstreamTransport;
use envoy_types::pb::envoy::extensions::transport_sockets::tls::v3::{
    common_tls_context::ValidationContextType, tls_parameters::TlsProtocol,
    CertificateValidationContext, CommonTlsContext, DownstreamTlsContext, SdsSecretConfig,
    TlsCertificate, TlsParameters,
};
use envoy_types::pb::google::protobuf::BoolValue;

/// SDS resource holding the proxy's own mesh certificate
pub const SDS_DEFAULT_RESOURCE_NAME: &str = "default";
/// SDS resource holding the mesh root certificate
pub const SDS_ROOT_RESOURCE_NAME: &str = "ROOTCA";
/// Prefix for secret-store references
pub const KUBERNETES_SECRET_PREFIX: &str = "kubernetes://";
/// Suffix of the SDS resource holding a credential's CA bundle
pub const CA_CERT_SUFFIX: &str = "-cacert";

pub const ALPN_H3: &[&str] = &["h3"];
pub const ALPN_HTTP: &[&str] = &["h2", "http/1.1"];

/// Build the downstream TLS context of a server, or `None` when the server does not terminate TLS.
///
/// A terminating server without credential or certificate files serves the
/// proxy's default SDS certificate. Fails on a certificate without its key
/// (or the reverse), MUTUAL without a CA reference, or a minimum protocol
/// version above the maximum.
pub fn build_gateway_listener_tls_context(
    mesh: &MeshConfig,
    server: &Server,
    transport: TransportProtocol,
) -> Result<Option<DownstreamTlsContext>> {
    let Some(tls) = &server.tls else {
        return Ok(None);
    };
    if !tls.mode.terminates() {
        return Ok(None);
    }

    let mut common = CommonTlsContext {
        tls_params: Some(build_tls_params(mesh, tls, transport)?),
        alpn_protocols: alpn_protocols(server.protocol(), transport),
        ..Default::default()
    };

    match tls.mode {
        TlsMode::IstioMutual => {
            common.tls_certificate_sds_secret_configs =
                vec![sds_secret_config(SDS_DEFAULT_RESOURCE_NAME)];
            common.validation_context_type = Some(ValidationContextType::ValidationContextSdsSecretConfig(
                sds_secret_config(SDS_ROOT_RESOURCE_NAME),
            ));
        }
        mode => {
            attach_server_certificate(&mut common, server, tls)?;
            if mode == TlsMode::Mutual {
                common.validation_context_type = Some(client_validation_context(server, tls)?);
            }
        }
    }

    Ok(Some(DownstreamTlsContext {
        common_tls_context: Some(common),
        require_client_certificate: Some(BoolValue { value: tls.mode != TlsMode::Simple }),
        ..Default::default()
    }))
}

fn attach_server_certificate(
    common: &mut CommonTlsContext,
    server: &Server,
    tls: &TlsPolicy,
) -> Result<()> {
    if let Some(credential) = &tls.credential_name {
        common.tls_certificate_sds_secret_configs =
            vec![sds_secret_config(&format!("{KUBERNETES_SECRET_PREFIX}{credential}"))];
        return Ok(());
    }

    match (&tls.server_certificate, &tls.private_key) {
        (Some(certificate), Some(key)) => {
            common.tls_certificates = vec![TlsCertificate {
                certificate_chain: Some(data_source_from_path(certificate)),
                private_key: Some(data_source_from_path(key)),
                ..Default::default()
            }];
            Ok(())
        }
        (Some(_), None) => Err(Error::config(format!(
            "server {} has a server certificate without a private key",
            server.display_name()
        ))),
        (None, Some(_)) => Err(Error::config(format!(
            "server {} has a private key without a server certificate",
            server.display_name()
        ))),
        // No reference at all: serve the proxy's own certificate
        (None, None) => {
            common.tls_certificate_sds_secret_configs = vec![sds_secret_config(SDS_DEFAULT_RESOURCE_NAME)];
            Ok(())
        }
    }
}

fn client_validation_context(server: &Server, tls: &TlsPolicy) -> Result<ValidationContextType> {
    if let Some(credential) = &tls.credential_name {
        return Ok(ValidationContextType::ValidationContextSdsSecretConfig(sds_secret_config(
            &format!("{KUBERNETES_SECRET_PREFIX}{credential}{CA_CERT_SUFFIX}"),
        )));
    }

    let ca_certificates = tls.ca_certificates.as_ref().ok_or_else(|| {
        Error::config(format!(
            "server {} in MUTUAL mode requires a CA certificate reference",
            server.display_name()
        ))
    })?;

    Ok(ValidationContextType::ValidationContext(CertificateValidationContext {
        trusted_ca: Some(data_source_from_path(ca_certificates)),
        ..Default::default()
    }))
}

fn build_tls_params(
    mesh: &MeshConfig,
    tls: &TlsPolicy,
    transport: TransportProtocol,
) -> Result<TlsParameters> {
    let defaults = &mesh.tls_defaults;
    let min = tls.min_protocol_version.or(defaults.min_protocol_version).unwrap_or(TlsProtocolVersion::Auto);
    let max = tls.max_protocol_version.unwrap_or(TlsProtocolVersion::Auto);

    if min != TlsProtocolVersion::Auto && max != TlsProtocolVersion::Auto && min > max {
        return Err(Error::config(format!(
            "minimum TLS protocol version {min:?} is above maximum {max:?}"
        )));
    }

    // QUIC only runs TLS 1.3
    let (min, max) = match transport {
        TransportProtocol::Quic => (TlsProtocolVersion::V1_3, TlsProtocolVersion::V1_3),
        TransportProtocol::Tcp => (min, max),
    };

    let cipher_suites =
        if tls.cipher_suites.is_empty() { defaults.cipher_suites.clone() } else { tls.cipher_suites.clone() };

    Ok(TlsParameters {
        tls_minimum_protocol_version: tls_protocol(min) as i32,
        tls_maximum_protocol_version: tls_protocol(max) as i32,
        cipher_suites,
        ecdh_curves: defaults.ecdh_curves.clone(),
        ..Default::default()
    })
}

fn tls_protocol(version: TlsProtocolVersion) -> TlsProtocol {
    match version {
        TlsProtocolVersion::Auto => TlsProtocol::TlsAuto,
        TlsProtocolVersion::V1_0 => TlsProtocol::TlSv10,
        TlsProtocolVersion::V1_1 => TlsProtocol::TlSv11,
        TlsProtocolVersion::V1_2 => TlsProtocol::TlSv12,
        TlsProtocolVersion::V1_3 => TlsProtocol::TlSv13,
    }
}

fn alpn_protocols(protocol: Protocol, transport: TransportProtocol) -> Vec<String> {
    let alpn = match transport {
        TransportProtocol::Quic => ALPN_H3,
        TransportProtocol::Tcp if protocol.is_http_capable() => ALPN_HTTP,
        TransportProtocol::Tcp => &[],
    };
    alpn.iter().map(|p| p.to_string()).collect()
}

/// SDS reference to a secret delivered over ADS
fn sds_secret_config(name: &str) -> SdsSecretConfig {
    SdsSecretConfig {
        name: name.to_string(),
        sds_config: Some(ConfigSource {
            config_source_specifier: Some(ConfigSourceSpecifier::Ads(
                AggregatedConfigSource::default(),
            )),
            resource_api_version: ApiVersion::V3 as i32,
            ..Default::default()
        }),
    }
}

fn data_source_from_path(path: &str) -> DataSource {
    DataSource {
        watched_directory: None,
        specifier: Some(data_source::Specifier::Filename(path.to_string())),
    }
}

/// Wrap a TLS context in a TCP transport socket
pub fn tls_transport_socket(context: DownstreamTlsContext) -> TransportSocket {
    TransportSocket {
        name: "envoy.transport_sockets.tls".to_string(),
        config_type: Some(TransportSocketConfigType::TypedConfig(to_any(
            DOWNSTREAM_TLS_CONTEXT_TYPE_URL,
            &context,
        ))),
    }
}

/// Wrap a TLS context in a QUIC transport socket
pub fn quic_transport_socket(context: DownstreamTlsContext) -> TransportSocket {
    let quic = QuicDownstreamTransport { downstream_tls_context: Some(context), ..Default::default() };
    TransportSocket {
        name: "envoy.transport_sockets.quic".to_string(),
        config_type: Some(TransportSocketConfigType::TypedConfig(to_any(
            QUIC_DOWNSTREAM_TRANSPORT_TYPE_URL,
            &quic,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ServerPort, TlsDefaults};

    fn server(protocol: Protocol, tls: Option<TlsPolicy>) -> Server {
        Server {
            port: ServerPort::new(443, protocol),
            hosts: vec!["a.example.com".to_string()],
            tls,
            route_name: "https.443".to_string(),
            gateway: "istio-system/ingress".to_string(),
            name: None,
        }
    }

    fn common(context: &DownstreamTlsContext) -> &CommonTlsContext {
        context.common_tls_context.as_ref().unwrap()
    }

    #[test]
    fn absent_for_non_terminating_servers() {
        let mesh = MeshConfig::default();
        for tls in [
            None,
            Some(TlsPolicy::new(TlsMode::Disable)),
            Some(TlsPolicy::new(TlsMode::Passthrough)),
            Some(TlsPolicy::new(TlsMode::AutoPassthrough)),
        ] {
            let result = build_gateway_listener_tls_context(
                &mesh,
                &server(Protocol::Https, tls),
                TransportProtocol::Tcp,
            );
            assert_eq!(result, Ok(None));
        }
    }

    #[test]
    fn simple_with_credential_uses_sds() {
        let tls = TlsPolicy::with_credential(TlsMode::Simple, "ingress-cert");
        let context = build_gateway_listener_tls_context(
            &MeshConfig::default(),
            &server(Protocol::Https, Some(tls)),
            TransportProtocol::Tcp,
        )
        .unwrap()
        .unwrap();

        let common = common(&context);
        assert_eq!(common.tls_certificate_sds_secret_configs[0].name, "kubernetes://ingress-cert");
        assert!(common.validation_context_type.is_none());
        assert_eq!(common.alpn_protocols, vec!["h2", "http/1.1"]);
        assert_eq!(context.require_client_certificate, Some(BoolValue { value: false }));
    }

    #[test]
    fn simple_with_files() {
        let tls = TlsPolicy::with_files(TlsMode::Simple, "/etc/certs/cert.pem", "/etc/certs/key.pem");
        let context = build_gateway_listener_tls_context(
            &MeshConfig::default(),
            &server(Protocol::Tls, Some(tls)),
            TransportProtocol::Tcp,
        )
        .unwrap()
        .unwrap();

        let common = common(&context);
        assert_eq!(
            common.tls_certificates[0].certificate_chain,
            Some(data_source_from_path("/etc/certs/cert.pem"))
        );
        assert!(common.alpn_protocols.is_empty());
    }

    #[test]
    fn simple_without_certificate_uses_default_secret() {
        let context = build_gateway_listener_tls_context(
            &MeshConfig::default(),
            &server(Protocol::Https, Some(TlsPolicy::new(TlsMode::Simple))),
            TransportProtocol::Tcp,
        )
        .unwrap()
        .expect("SIMPLE always yields a context");

        let common = context.common_tls_context.unwrap();
        let names: Vec<&str> =
            common.tls_certificate_sds_secret_configs.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec![SDS_DEFAULT_RESOURCE_NAME]);
        assert!(common.tls_certificates.is_empty());
        assert_eq!(context.require_client_certificate, Some(BoolValue { value: false }));
    }

    #[test]
    fn certificate_without_key_fails() {
        let half = TlsPolicy { server_certificate: Some("/cert.pem".into()), ..TlsPolicy::new(TlsMode::Simple) };
        let result = build_gateway_listener_tls_context(
            &MeshConfig::default(),
            &server(Protocol::Https, Some(half)),
            TransportProtocol::Tcp,
        );
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("private key")));
    }

    #[test]
    fn mutual_requires_ca() {
        let tls = TlsPolicy::with_files(TlsMode::Mutual, "/cert.pem", "/key.pem");
        let result = build_gateway_listener_tls_context(
            &MeshConfig::default(),
            &server(Protocol::Https, Some(tls.clone())),
            TransportProtocol::Tcp,
        );
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("CA certificate")));

        let with_ca = TlsPolicy { ca_certificates: Some("/ca.pem".into()), ..tls };
        let context = build_gateway_listener_tls_context(
            &MeshConfig::default(),
            &server(Protocol::Https, Some(with_ca)),
            TransportProtocol::Tcp,
        )
        .unwrap()
        .unwrap();
        assert!(matches!(
            common(&context).validation_context_type,
            Some(ValidationContextType::ValidationContext(_))
        ));
        assert_eq!(context.require_client_certificate, Some(BoolValue { value: true }));
    }

    #[test]
    fn mutual_with_credential_uses_cacert_secret() {
        let tls = TlsPolicy::with_credential(TlsMode::Mutual, "ingress-cert");
        let context = build_gateway_listener_tls_context(
            &MeshConfig::default(),
            &server(Protocol::Https, Some(tls)),
            TransportProtocol::Tcp,
        )
        .unwrap()
        .unwrap();

        match &common(&context).validation_context_type {
            Some(ValidationContextType::ValidationContextSdsSecretConfig(sds)) => {
                assert_eq!(sds.name, "kubernetes://ingress-cert-cacert")
            }
            other => panic!("unexpected validation context {other:?}"),
        }
    }

    #[test]
    fn istio_mutual_uses_workload_certificate() {
        let context = build_gateway_listener_tls_context(
            &MeshConfig::default(),
            &server(Protocol::Https, Some(TlsPolicy::new(TlsMode::IstioMutual))),
            TransportProtocol::Tcp,
        )
        .unwrap()
        .unwrap();

        let common = common(&context);
        assert_eq!(common.tls_certificate_sds_secret_configs[0].name, "default");
        assert!(matches!(
            &common.validation_context_type,
            Some(ValidationContextType::ValidationContextSdsSecretConfig(sds)) if sds.name == "ROOTCA"
        ));
        assert_eq!(context.require_client_certificate, Some(BoolValue { value: true }));
    }

    #[test]
    fn server_parameters_override_mesh_defaults() {
        let mesh = MeshConfig {
            tls_defaults: TlsDefaults {
                min_protocol_version: Some(TlsProtocolVersion::V1_2),
                cipher_suites: vec!["ECDHE-RSA-AES256-GCM-SHA384".to_string()],
                ecdh_curves: vec!["P-256".to_string()],
            },
            access_log_file: None,
        };

        let inherited = build_tls_params(
            &mesh,
            &TlsPolicy::with_credential(TlsMode::Simple, "c"),
            TransportProtocol::Tcp,
        )
        .unwrap();
        assert_eq!(inherited.tls_minimum_protocol_version, TlsProtocol::TlSv12 as i32);
        assert_eq!(inherited.cipher_suites, vec!["ECDHE-RSA-AES256-GCM-SHA384"]);
        assert_eq!(inherited.ecdh_curves, vec!["P-256"]);

        let overridden = TlsPolicy {
            min_protocol_version: Some(TlsProtocolVersion::V1_3),
            cipher_suites: vec!["ECDHE-ECDSA-AES128-GCM-SHA256".to_string()],
            ..TlsPolicy::with_credential(TlsMode::Simple, "c")
        };
        let params = build_tls_params(&mesh, &overridden, TransportProtocol::Tcp).unwrap();
        assert_eq!(params.tls_minimum_protocol_version, TlsProtocol::TlSv13 as i32);
        assert_eq!(params.cipher_suites, vec!["ECDHE-ECDSA-AES128-GCM-SHA256"]);
    }

    #[test]
    fn min_above_max_fails() {
        let tls = TlsPolicy {
            min_protocol_version: Some(TlsProtocolVersion::V1_3),
            max_protocol_version: Some(TlsProtocolVersion::V1_2),
            ..TlsPolicy::with_credential(TlsMode::Simple, "c")
        };
        assert!(matches!(
            build_tls_params(&MeshConfig::default(), &tls, TransportProtocol::Tcp),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn quic_forces_tls13_and_h3() {
        let tls = TlsPolicy::with_credential(TlsMode::Simple, "c");
        let context = build_gateway_listener_tls_context(
            &MeshConfig::default(),
            &server(Protocol::Http3, Some(tls)),
            TransportProtocol::Quic,
        )
        .unwrap()
        .unwrap();

        let common = common(&context);
        let params = common.tls_params.as_ref().unwrap();
        assert_eq!(params.tls_minimum_protocol_version, TlsProtocol::TlSv13 as i32);
        assert_eq!(params.tls_maximum_protocol_version, TlsProtocol::TlSv13 as i32);
        assert_eq!(common.alpn_protocols, vec!["h3"]);

        let socket = quic_transport_socket(context);
        assert_eq!(socket.name, "envoy.transport_sockets.quic");
    }
}
