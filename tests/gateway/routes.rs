use crate::gateway::support::{Fixture, HTTP_80};
use envoy_types::pb::envoy::config::route::v3::{
    route, route_action::ClusterSpecifier, route_match::PathSpecifier, Route, RouteConfiguration,
};
use flowplane_gateway::{GatewayConfigGenerator, GatewayOptions};

fn build(options: GatewayOptions) -> anyhow::Result<RouteConfiguration> {
    let fixture = Fixture::from_yaml(HTTP_80)?;
    let context = fixture.context();
    let generator = GatewayConfigGenerator::new(&context, options);
    Ok(generator.build_gateway_http_route_config(&fixture.proxy(), "http.80"))
}

fn cluster_specifier(route: &Route) -> &ClusterSpecifier {
    match &route.action {
        Some(route::Action::Route(action)) => {
            action.cluster_specifier.as_ref().expect("cluster specifier")
        }
        other => panic!("expected route action, got {other:?}"),
    }
}

#[test]
fn identical_hosts_collapse_into_one_virtual_host() -> anyhow::Result<()> {
    let rc = build(GatewayOptions::default())?;

    let names: Vec<&str> = rc.virtual_hosts.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["a.com:80", "reviews.example.com:80"]);
    assert_eq!(rc.virtual_hosts[0].domains, vec!["a.com", "www.a.com"]);
    assert_eq!(
        cluster_specifier(&rc.virtual_hosts[0].routes[0]),
        &ClusterSpecifier::Cluster("outbound|80||site".to_string())
    );
    Ok(())
}

#[test]
fn collapse_disabled_keeps_every_domain_separate() -> anyhow::Result<()> {
    let rc = build(GatewayOptions { enable_route_collapse: false, ..GatewayOptions::default() })?;

    let names: Vec<&str> = rc.virtual_hosts.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["a.com:80", "reviews.example.com:80", "www.a.com:80"]);
    Ok(())
}

#[test]
fn routes_keep_declaration_order_and_resolve_clusters() -> anyhow::Result<()> {
    let rc = build(GatewayOptions::default())?;
    let reviews = rc
        .virtual_hosts
        .iter()
        .find(|v| v.name == "reviews.example.com:80")
        .expect("reviews virtual host");

    assert_eq!(reviews.routes.len(), 2);
    assert_eq!(reviews.routes[0].name, "v2");
    assert_eq!(
        reviews.routes[0].r#match.as_ref().and_then(|m| m.path_specifier.clone()),
        Some(PathSpecifier::Prefix("/v2".to_string()))
    );
    assert_eq!(
        cluster_specifier(&reviews.routes[0]),
        &ClusterSpecifier::Cluster("outbound|9080|v2|reviews.bookinfo.svc.cluster.local".to_string())
    );

    assert_eq!(reviews.routes[1].name, "default");
    let ClusterSpecifier::WeightedClusters(weighted) = cluster_specifier(&reviews.routes[1]) else {
        panic!("expected weighted clusters");
    };
    let split: Vec<(&str, u32)> = weighted
        .clusters
        .iter()
        .map(|c| (c.name.as_str(), c.weight.as_ref().map(|w| w.value).unwrap_or_default()))
        .collect();
    assert_eq!(
        split,
        vec![
            ("outbound|9080|v1|reviews.bookinfo.svc.cluster.local", 80),
            ("outbound|9080|v2|reviews.bookinfo.svc.cluster.local", 20),
        ]
    );
    Ok(())
}

#[test]
fn gateway_references_are_namespace_qualified() -> anyhow::Result<()> {
    let rc = build(GatewayOptions::default())?;
    assert!(rc.virtual_hosts.iter().all(|v| !v.domains.iter().any(|d| d == "c.com")));
    Ok(())
}

#[test]
fn unknown_route_name_yields_empty_configuration() -> anyhow::Result<()> {
    let fixture = Fixture::from_yaml(HTTP_80)?;
    let context = fixture.context();
    let generator = GatewayConfigGenerator::new(&context, GatewayOptions::default());

    let rc = generator.build_gateway_http_route_config(&fixture.proxy(), "http.8080");
    assert_eq!(rc.name, "http.8080");
    assert!(rc.virtual_hosts.is_empty());
    Ok(())
}
