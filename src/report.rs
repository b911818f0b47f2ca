//! Serializable view of a published topology.

use crate::topology::{Entry, Topology};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Report written by the `topostore` binary
#[derive(Debug, Serialize)]
pub struct TopologyReport {
    pub self_entry: Entry,
    pub subnet_prefix: String,
    pub subnet_prefix_fallback: bool,
    pub entries: Vec<Entry>,
    pub local: BTreeMap<String, Entry>,
    pub remote: BTreeMap<String, Entry>,
    pub peers: BTreeMap<String, Entry>,
    pub remote_non_peers: BTreeMap<String, Entry>,
    pub linked_peer_networks: BTreeSet<String>,
    pub linked_peer_containers: Vec<String>,
}

impl From<&Topology> for TopologyReport {
    fn from(topology: &Topology) -> Self {
        TopologyReport {
            self_entry: topology.self_entry().clone(),
            subnet_prefix: topology.subnet_prefix().as_str().to_string(),
            subnet_prefix_fallback: topology.subnet_prefix().is_fallback(),
            entries: topology.entries().to_vec(),
            local: topology.local().clone(),
            remote: topology.remote().clone(),
            peers: topology.peers().clone(),
            remote_non_peers: topology.remote_non_peers().clone(),
            linked_peer_networks: topology.linked_peers().networks.clone(),
            linked_peer_containers: topology
                .linked_peers()
                .containers
                .iter()
                .map(|c| c.uuid.clone())
                .collect(),
        }
    }
}

impl TopologyReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the report as pretty JSON
    pub fn write_to(&self, path: &Path) -> color_eyre::Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
