use crate::gateway::support::{Fixture, HTTP_80, MIXED_TLS_443};
use flowplane_gateway::domain::MergedGateway;
use flowplane_gateway::{GatewayConfigGenerator, GatewayOptions};
use prost::Message;
use std::thread;

/// Encoded listeners and route configuration for one compilation
fn compile(generator: &GatewayConfigGenerator<'_>, fixture: &Fixture) -> Vec<Vec<u8>> {
    let proxy = fixture.proxy();
    let mut encoded: Vec<Vec<u8>> = generator
        .build_gateway_listeners(&proxy)
        .expect("listeners build")
        .iter()
        .map(Message::encode_to_vec)
        .collect();

    let route_names: Vec<String> = proxy
        .merged_gateway
        .as_ref()
        .map(|merged| merged.servers_by_route_name.keys().cloned().collect())
        .unwrap_or_default();
    for name in route_names {
        encoded.push(generator.build_gateway_http_route_config(&proxy, &name).encode_to_vec());
    }
    encoded
}

#[test]
fn repeated_compilation_is_byte_identical() -> anyhow::Result<()> {
    for yaml in [HTTP_80, MIXED_TLS_443] {
        let fixture = Fixture::from_yaml(yaml)?;
        let context = fixture.context();
        let generator = GatewayConfigGenerator::new(&context, GatewayOptions::default());

        assert_eq!(compile(&generator, &fixture), compile(&generator, &fixture));
    }
    Ok(())
}

#[test]
fn concurrent_compilation_matches_sequential() -> anyhow::Result<()> {
    let fixture = Fixture::from_yaml(HTTP_80)?;
    let context = fixture.context();
    let generator = GatewayConfigGenerator::new(&context, GatewayOptions::default());
    let expected = compile(&generator, &fixture);

    let results: Vec<Vec<Vec<u8>>> = thread::scope(|scope| {
        let handles: Vec<_> =
            (0..4).map(|_| scope.spawn(|| compile(&generator, &fixture))).collect();
        handles.into_iter().map(|h| h.join().expect("compile thread")).collect()
    });

    for result in results {
        assert_eq!(result, expected);
    }
    Ok(())
}

#[test]
fn server_declaration_order_does_not_change_listeners() -> anyhow::Result<()> {
    let fixture = Fixture::from_yaml(MIXED_TLS_443)?;
    let context = fixture.context();
    let generator = GatewayConfigGenerator::new(&context, GatewayOptions::default());

    let mut reversed = fixture.proxy();
    reversed.merged_gateway = Some(MergedGateway::from_servers(fixture.servers.iter().rev().cloned()));

    let forward = generator.build_gateway_listeners(&fixture.proxy())?;
    let backward = generator.build_gateway_listeners(&reversed)?;
    assert_eq!(forward, backward);
    Ok(())
}
