//! Read-only view of mesh state used during compilation
//!
//! Builders never enumerate the control plane's snapshot directly; they go
//! through [`RoutingContext`] so the snapshot can be swapped for a fixture in
//! tests.

use crate::domain::{MeshConfig, ServiceIdentity, VirtualService};
use std::collections::BTreeMap;

/// Routing state visible to the proxy being compiled
pub trait RoutingContext: Send + Sync {
    /// Virtual services visible to the proxy, in any order
    fn virtual_services(&self) -> &[VirtualService];

    /// Resolve a destination host, as written in a route, to a service.
    /// `namespace` is the namespace of the referencing virtual service.
    fn resolve_service(&self, host: &str, namespace: &str) -> Option<&ServiceIdentity>;

    fn mesh_config(&self) -> &MeshConfig;
}

/// Routing context backed by owned collections
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoutingContext {
    virtual_services: Vec<VirtualService>,
    services: BTreeMap<String, ServiceIdentity>,
    mesh_config: MeshConfig,
}

impl InMemoryRoutingContext {
    pub fn new(mesh_config: MeshConfig) -> Self {
        Self { mesh_config, ..Self::default() }
    }

    pub fn with_virtual_service(mut self, virtual_service: VirtualService) -> Self {
        self.virtual_services.push(virtual_service);
        self
    }

    pub fn with_service(mut self, service: ServiceIdentity) -> Self {
        self.services.insert(service.hostname.clone(), service);
        self
    }

    pub fn add_virtual_service(&mut self, virtual_service: VirtualService) {
        self.virtual_services.push(virtual_service);
    }

    pub fn add_service(&mut self, service: ServiceIdentity) {
        self.services.insert(service.hostname.clone(), service);
    }
}

impl RoutingContext for InMemoryRoutingContext {
    fn virtual_services(&self) -> &[VirtualService] {
        &self.virtual_services
    }

    /// Exact hostname first, then the short name qualified with the
    /// referencing namespace (`reviews` in `default` resolves
    /// `reviews.default.svc.cluster.local`).
    fn resolve_service(&self, host: &str, namespace: &str) -> Option<&ServiceIdentity> {
        self.services.get(host).or_else(|| {
            if host.contains('.') {
                return None;
            }
            let qualified = format!("{host}.{namespace}.");
            self.services
                .range(qualified.clone()..)
                .take_while(|(hostname, _)| hostname.starts_with(&qualified))
                .map(|(_, service)| service)
                .next()
        })
    }

    fn mesh_config(&self) -> &MeshConfig {
        &self.mesh_config
    }
}
