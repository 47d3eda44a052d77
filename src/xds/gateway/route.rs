//! HTTP route configuration for gateway servers
//!
//! One [`RouteConfiguration`] is built per RDS route name. Every server using
//! that name contributes virtual hosts for the virtual services bound to its
//! gateway; each host pairing becomes a domain whose routes are the virtual
//! service's HTTP rules translated in declaration order.

use super::collapse::collapse_duplicate_routes;
use super::predicates::{binds_server, is_port_match, pick_matching_gateway_hosts};
use super::{BuildEnv, GatewayConfigGenerator};
use crate::domain::host::more_specific;
use crate::domain::{
    GatewayProxy, HttpMatchRequest, HttpRedirect, HttpRetry, HttpRoute, HttpRouteDestination,
    Server, StringMatch, VirtualService,
};
use envoy_types::pb::envoy::config::route::v3::{
    header_matcher, redirect_action, route, route_action::ClusterSpecifier,
    route_match::PathSpecifier, virtual_host, weighted_cluster, HeaderMatcher, RedirectAction,
    RetryPolicy, Route, RouteAction, RouteConfiguration, RouteMatch, VirtualHost, WeightedCluster,
};
use envoy_types::pb::envoy::r#type::matcher::v3::{string_matcher, RegexMatcher, StringMatcher};
use envoy_types::pb::google::protobuf::{BoolValue, Duration, UInt32Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Retry conditions used when a retry policy names none
pub const DEFAULT_RETRY_ON: &str = "connect-failure,refused-stream,unavailable,cancelled,retriable-status-codes";

/// Routes accumulated for one domain
#[derive(Debug)]
struct DomainRoutes {
    port: u32,
    routes: Vec<Route>,
    contributors: BTreeSet<String>,
    require_tls: bool,
}

impl DomainRoutes {
    fn new(port: u32) -> Self {
        Self { port, routes: Vec::new(), contributors: BTreeSet::new(), require_tls: false }
    }

    fn into_virtual_host(self, domain: String) -> VirtualHost {
        let require_tls = if self.require_tls {
            virtual_host::TlsRequirementType::All
        } else {
            virtual_host::TlsRequirementType::None
        };

        VirtualHost {
            name: format!("{}:{}", domain, self.port),
            domains: vec![domain],
            routes: self.routes,
            include_request_attempt_count: true,
            require_tls: require_tls as i32,
            ..Default::default()
        }
    }
}

impl GatewayConfigGenerator<'_> {
    /// Build the route configuration named `route_name` for a proxy.
    ///
    /// Unknown route names and proxies without a merged gateway yield an
    /// empty configuration rather than an error.
    pub fn build_gateway_http_route_config(
        &self,
        proxy: &GatewayProxy,
        route_name: &str,
    ) -> RouteConfiguration {
        let span = crate::gateway_span!("build_route_config", proxy.id, route_name = %route_name);
        let _guard = span.enter();

        let servers = proxy
            .merged_gateway
            .as_ref()
            .map(|merged| merged.servers_for_route(route_name))
            .unwrap_or_default();
        if servers.is_empty() {
            debug!("No servers use this route name, emitting empty route configuration");
            return empty_route_configuration(route_name);
        }

        let env = self.env(proxy);
        let virtual_services = env.sorted_virtual_services();
        let mut domains: BTreeMap<String, DomainRoutes> = BTreeMap::new();

        for server in servers {
            for vs in virtual_services.iter().filter(|vs| !vs.http.is_empty() && binds_server(vs, server)) {
                let matched = pick_matching_gateway_hosts(&server.hosts, vs);
                if matched.is_empty() {
                    continue;
                }

                let routes = translate_http_routes(&env, vs, server);
                let contributor = vs.qualified_name();

                for (vs_host, gateway_host) in &matched {
                    let domain = more_specific(vs_host, gateway_host).to_string();
                    let entry = domains
                        .entry(domain)
                        .or_insert_with(|| DomainRoutes::new(server.port.number));
                    if !entry.contributors.insert(contributor.clone()) {
                        continue;
                    }
                    entry.routes.extend(routes.iter().cloned());
                    entry.require_tls |= server.https_redirect();
                }
            }
        }

        let mut virtual_hosts: Vec<VirtualHost> = domains
            .into_iter()
            .filter(|(domain, routes)| {
                if routes.routes.is_empty() {
                    debug!(domain = %domain, "Skipping domain without routes for this port");
                }
                !routes.routes.is_empty()
            })
            .map(|(domain, routes)| routes.into_virtual_host(domain))
            .collect();

        if self.options.enable_route_collapse {
            let before = virtual_hosts.len();
            virtual_hosts = collapse_duplicate_routes(virtual_hosts);
            self.metrics.record_collapse(before, virtual_hosts.len());
            debug!(before, after = virtual_hosts.len(), "Collapsed duplicate virtual hosts");
        }
        virtual_hosts.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(virtual_hosts = virtual_hosts.len(), "Built route configuration");
        RouteConfiguration {
            name: route_name.to_string(),
            virtual_hosts,
            validate_clusters: Some(BoolValue { value: false }),
            ignore_port_in_host_matching: true,
            ..Default::default()
        }
    }
}

fn empty_route_configuration(route_name: &str) -> RouteConfiguration {
    RouteConfiguration { name: route_name.to_string(), ..Default::default() }
}

/// Translate a virtual service's HTTP rules for one server, in declaration order.
///
/// A rule with match clauses yields one route per clause that applies to the
/// server port; a rule without clauses matches every path. Rules with neither
/// a redirect nor a destination are dropped.
pub fn translate_http_routes(env: &BuildEnv<'_>, vs: &VirtualService, server: &Server) -> Vec<Route> {
    let mut routes = Vec::new();

    for http in &vs.http {
        let Some(action) = translate_action(env, vs, server, http) else {
            warn!(
                virtual_service = %vs.qualified_name(),
                route = http.name.as_deref().unwrap_or_default(),
                "Dropping HTTP route without redirect or destination"
            );
            continue;
        };

        if http.matches.is_empty() {
            routes.push(Route {
                name: http.name.clone().unwrap_or_default(),
                r#match: Some(catch_all_match()),
                action: Some(action),
                ..Default::default()
            });
            continue;
        }

        for clause in http.matches.iter().filter(|m| is_port_match(m.port, server)) {
            routes.push(Route {
                name: clause.name.clone().or_else(|| http.name.clone()).unwrap_or_default(),
                r#match: Some(translate_match(clause)),
                action: Some(action.clone()),
                ..Default::default()
            });
        }
    }

    routes
}

fn catch_all_match() -> RouteMatch {
    RouteMatch { path_specifier: Some(PathSpecifier::Prefix("/".to_string())), ..Default::default() }
}

fn translate_match(clause: &HttpMatchRequest) -> RouteMatch {
    let path_specifier = match &clause.uri {
        Some(StringMatch::Exact(path)) => PathSpecifier::Path(path.clone()),
        Some(StringMatch::Prefix(prefix)) => PathSpecifier::Prefix(prefix.clone()),
        Some(StringMatch::Regex(regex)) => {
            PathSpecifier::SafeRegex(RegexMatcher { regex: regex.clone(), ..Default::default() })
        }
        None => PathSpecifier::Prefix("/".to_string()),
    };

    let headers = clause
        .headers
        .iter()
        .map(|(name, value)| HeaderMatcher {
            name: name.clone(),
            header_match_specifier: Some(header_matcher::HeaderMatchSpecifier::StringMatch(
                to_string_matcher(value),
            )),
            ..Default::default()
        })
        .collect();

    RouteMatch { path_specifier: Some(path_specifier), headers, ..Default::default() }
}

fn to_string_matcher(value: &StringMatch) -> StringMatcher {
    let pattern = match value {
        StringMatch::Exact(exact) => string_matcher::MatchPattern::Exact(exact.clone()),
        StringMatch::Prefix(prefix) => string_matcher::MatchPattern::Prefix(prefix.clone()),
        StringMatch::Regex(regex) => string_matcher::MatchPattern::SafeRegex(RegexMatcher {
            regex: regex.clone(),
            ..Default::default()
        }),
    };
    StringMatcher { match_pattern: Some(pattern), ..Default::default() }
}

fn translate_action(
    env: &BuildEnv<'_>,
    vs: &VirtualService,
    server: &Server,
    http: &HttpRoute,
) -> Option<route::Action> {
    if let Some(redirect) = &http.redirect {
        return Some(route::Action::Redirect(to_redirect_action(redirect)));
    }

    let cluster_specifier = cluster_specifier(env, vs, server, &http.route)?;

    #[allow(deprecated)]
    let mut action = RouteAction {
        cluster_specifier: Some(cluster_specifier),
        timeout: http.timeout_ms.map(duration_from_millis),
        retry_policy: http.retries.as_ref().and_then(retry_policy),
        ..Default::default()
    };

    if let Some(rewrite) = &http.rewrite {
        action.prefix_rewrite = rewrite.uri.clone();
    }

    Some(route::Action::Route(action))
}

fn cluster_specifier(
    env: &BuildEnv<'_>,
    vs: &VirtualService,
    server: &Server,
    destinations: &[HttpRouteDestination],
) -> Option<ClusterSpecifier> {
    let cluster = |d: &HttpRouteDestination| env.cluster_name(&d.destination, &vs.namespace, server.port.number);

    match destinations {
        [] => None,
        [single] => Some(ClusterSpecifier::Cluster(cluster(single))),
        many => {
            // All-zero weights split traffic evenly
            let even = many.iter().all(|d| d.weight == 0);
            let clusters = many
                .iter()
                .map(|d| weighted_cluster::ClusterWeight {
                    name: cluster(d),
                    weight: Some(UInt32Value { value: if even { 1 } else { d.weight } }),
                    ..Default::default()
                })
                .collect();
            Some(ClusterSpecifier::WeightedClusters(WeightedCluster { clusters, ..Default::default() }))
        }
    }
}

fn to_redirect_action(redirect: &HttpRedirect) -> RedirectAction {
    RedirectAction {
        host_redirect: redirect.authority.clone().unwrap_or_default(),
        path_rewrite_specifier: redirect.uri.clone().map(redirect_action::PathRewriteSpecifier::PathRedirect),
        response_code: redirect_response_code(redirect.redirect_code) as i32,
        ..Default::default()
    }
}

/// Map an HTTP redirect status onto Envoy's response code enum. Unknown or unset codes use 301.
pub fn redirect_response_code(code: Option<u32>) -> redirect_action::RedirectResponseCode {
    use redirect_action::RedirectResponseCode;

    match code {
        Some(302) => RedirectResponseCode::Found,
        Some(303) => RedirectResponseCode::SeeOther,
        Some(307) => RedirectResponseCode::TemporaryRedirect,
        Some(308) => RedirectResponseCode::PermanentRedirect,
        _ => RedirectResponseCode::MovedPermanently,
    }
}

fn retry_policy(retry: &HttpRetry) -> Option<RetryPolicy> {
    if retry.attempts == 0 {
        return None;
    }

    Some(RetryPolicy {
        retry_on: retry.retry_on.clone().unwrap_or_else(|| DEFAULT_RETRY_ON.to_string()),
        num_retries: Some(UInt32Value { value: retry.attempts }),
        per_try_timeout: retry.per_try_timeout_ms.map(duration_from_millis),
        ..Default::default()
    })
}

fn duration_from_millis(millis: u64) -> Duration {
    Duration { seconds: (millis / 1000) as i64, nanos: ((millis % 1000) * 1_000_000) as i32 }
}
