//! Topology entries.

use crate::metadata::{Container, Host};
use serde::{Deserialize, Serialize};

/// Mask carried by host-level entries
pub const HOST_PREFIX: &str = "/32";

/// One unit of topology knowledge: a host endpoint or a workload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Routable identity in CIDR notation
    pub address: String,
    /// Agent address of the host that owns this entry
    pub host_ip_address: String,
    pub is_self: bool,
    pub is_peer: bool,
}

impl Entry {
    /// Build the peer entry for a host
    pub fn from_host(host: &Host, self_host_uuid: &str) -> Self {
        Entry {
            address: format!("{}{}", host.agent_ip, HOST_PREFIX),
            host_ip_address: host.agent_ip.clone(),
            is_self: host.uuid == self_host_uuid,
            is_peer: true,
        }
    }

    /// Build the entry for a workload owned by the host at `host_ip_address`
    pub fn from_container(container: &Container, host_ip_address: &str, subnet_prefix: &str) -> Self {
        Entry {
            address: format!("{}{}", container.primary_ip, subnet_prefix),
            host_ip_address: host_ip_address.to_string(),
            is_self: false,
            is_peer: false,
        }
    }

    /// Address with the mask stripped
    pub fn bare_ip(&self) -> &str {
        bare_ip(&self.address)
    }
}

/// Strip the "/N" suffix from an address, if any
pub fn bare_ip(address: &str) -> &str {
    address.split('/').next().unwrap_or(address)
}
