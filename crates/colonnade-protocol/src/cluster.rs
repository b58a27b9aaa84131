//! Host distance classification for load-balancing collaborators
//!
//! The decoder itself never consults distance; the type lives here because
//! it is part of the protocol crate's public contract to the policy layer.

use serde::{Deserialize, Serialize};

/// Classification of a cluster peer relative to this client.
///
/// Exactly one of the three predicates holds for any variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostDistance {
    /// Peer in the client's own datacenter; preferred for routing.
    Local,
    /// Reachable peer in a remote datacenter.
    Remote,
    /// Peer the policy layer has excluded from routing entirely.
    Ignore,
}

impl HostDistance {
    pub fn is_local(self) -> bool {
        matches!(self, HostDistance::Local)
    }

    pub fn is_remote(self) -> bool {
        matches!(self, HostDistance::Remote)
    }

    pub fn is_ignore(self) -> bool {
        matches!(self, HostDistance::Ignore)
    }
}

impl std::fmt::Display for HostDistance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HostDistance::Local => "local",
            HostDistance::Remote => "remote",
            HostDistance::Ignore => "ignore",
        };
        write!(f, "{name}")
    }
}
