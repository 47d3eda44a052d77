//! Virtual host deduplication
//!
//! Domains frequently resolve to identical route lists (`a.com` and
//! `www.a.com` both sending everything to one service). Collapsing those
//! virtual hosts into one with a union of domains keeps the route table small.

use envoy_types::pb::envoy::config::route::v3::{Route, VirtualHost};
use prost::Message;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Order-sensitive hash of a route list.
///
/// Only a grouping key: equal lists hash equal, but equal hashes are always
/// confirmed with [`routes_equal`].
pub fn hash_route_list(routes: &[Route]) -> u64 {
    let mut hasher = Sha256::new();
    for route in routes {
        let encoded = route.encode_to_vec();
        hasher.update((encoded.len() as u64).to_be_bytes());
        hasher.update(&encoded);
    }

    let digest = hasher.finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// Positionwise structural equality of two route lists
pub fn routes_equal(a: &[Route], b: &[Route]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(left, right)| left == right)
}

/// Whether two virtual hosts differ only in their domains
pub fn vhost_mergeable(a: &VirtualHost, b: &VirtualHost) -> bool {
    routes_equal(&a.routes, &b.routes)
        && a.include_request_attempt_count == b.include_request_attempt_count
        && a.require_tls == b.require_tls
}

/// Merge virtual hosts with identical routes and flags into one carrying the union of their domains.
///
/// The first member of each merged set keeps its name, routes and flags.
/// Domains are sorted and deduplicated; output is sorted by name.
pub fn collapse_duplicate_routes(vhosts: Vec<VirtualHost>) -> Vec<VirtualHost> {
    let mut buckets: BTreeMap<u64, Vec<VirtualHost>> = BTreeMap::new();

    for vhost in vhosts {
        let bucket = buckets.entry(hash_route_list(&vhost.routes)).or_default();
        match bucket.iter_mut().find(|kept| vhost_mergeable(kept, &vhost)) {
            Some(kept) => kept.domains.extend(vhost.domains),
            None => bucket.push(vhost),
        }
    }

    let mut collapsed: Vec<VirtualHost> = buckets
        .into_values()
        .flatten()
        .map(|mut vhost| {
            vhost.domains.sort();
            vhost.domains.dedup();
            vhost
        })
        .collect();
    collapsed.sort_by(|a, b| a.name.cmp(&b.name));
    collapsed
}
