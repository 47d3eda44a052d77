//! Resolved backend service identities

use super::gateway::Protocol;
use serde::{Deserialize, Serialize};

/// A named port exposed by a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePort {
    #[serde(default)]
    pub name: Option<String>,
    pub port: u32,
    pub protocol: Protocol,
}

/// A backend service that route destinations resolve to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIdentity {
    /// Fully qualified hostname, e.g. `reviews.default.svc.cluster.local`
    pub hostname: String,
    pub namespace: String,
    #[serde(default)]
    pub ports: Vec<ServicePort>,
}

impl ServiceIdentity {
    /// The port number when the service exposes exactly one port
    pub fn single_port(&self) -> Option<u32> {
        match self.ports.as_slice() {
            [only] => Some(only.port),
            _ => None,
        }
    }
}
