//! Inventory record types.
//!
//! These mirror the records served by the inventory (metadata) service.
//! Field names follow the service's snake_case JSON keys so a raw dump can
//! be deserialized without renaming.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle states in which a container is considered reachable
pub const ACTIVE_STATES: [&str; 2] = ["running", "starting"];

/// A host known to the inventory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    /// Address on which the host's agent is reachable
    #[serde(default)]
    pub agent_ip: String,
}

/// A container (workload) record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub host_uuid: String,
    #[serde(default)]
    pub network_uuid: String,
    #[serde(default)]
    pub primary_ip: String,
    #[serde(default)]
    pub state: String,
    /// Set when the container shares the network namespace of another container
    #[serde(default)]
    pub network_from_container_uuid: String,
    #[serde(default)]
    pub system: bool,
}

impl Container {
    /// Returns true if the container is running or starting
    pub fn is_active(&self) -> bool {
        ACTIVE_STATES.contains(&self.state.as_str())
    }

    /// Returns true if the container borrows its network namespace
    pub fn shares_network_namespace(&self) -> bool {
        !self.network_from_container_uuid.is_empty()
    }
}

/// A service record with its embedded containers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub stack_name: String,
    #[serde(default)]
    pub system: bool,
    /// Outgoing links: qualified "stack/service" name -> alias
    #[serde(default)]
    pub links: BTreeMap<String, String>,
    #[serde(default)]
    pub containers: Vec<Container>,
}

impl Service {
    /// Qualified name in the form "stack/service"
    pub fn qualified_name(&self) -> String {
        qualified_name(&self.stack_name, &self.name)
    }

    /// Names of the services this service links to
    pub fn linked_service_names(&self) -> impl Iterator<Item = &str> {
        self.links.keys().map(String::as_str)
    }
}

/// A network record with its loosely structured metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Build a "stack/service" name
pub fn qualified_name(stack_name: &str, service_name: &str) -> String {
    format!("{}/{}", stack_name, service_name)
}

/// One complete inventory dump, as read by [`crate::metadata::FileSource`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub self_host: Host,
    #[serde(default)]
    pub hosts: Vec<Host>,
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub networks: Vec<Network>,
}
