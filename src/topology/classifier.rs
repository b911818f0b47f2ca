//! Entry classification.
//!
//! Turns hosts into peer entries and visible workloads into local or remote
//! entries keyed by bare IP.

use crate::metadata::Container;
use crate::topology::entry::Entry;
use crate::topology::snapshot::Snapshot;
use log::debug;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Why a workload contributed no entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotRunning,
    NoPrimaryIp,
    SharedNetworkNamespace,
    OtherNetwork,
    SelfHostAddress,
    OwnHostAddress,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::NotRunning => "not running or starting",
            SkipReason::NoPrimaryIp => "no primary IP",
            SkipReason::SharedNetworkNamespace => "network namespace shared from another container",
            SkipReason::OtherNetwork => "not on the self network",
            SkipReason::SelfHostAddress => "primary IP is the self host address",
            SkipReason::OwnHostAddress => "primary IP is its host's address",
        };
        f.write_str(reason)
    }
}

/// Maps produced by one classification pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub self_entry: Entry,
    pub entries: Vec<Entry>,
    pub local: BTreeMap<String, Entry>,
    pub remote: BTreeMap<String, Entry>,
    pub peers: BTreeMap<String, Entry>,
    pub remote_non_peers: BTreeMap<String, Entry>,
}

/// Peer entry for every known host, keyed by agent IP
pub fn build_peers_map(snapshot: &Snapshot) -> BTreeMap<String, Entry> {
    let self_uuid = &snapshot.self_host().uuid;
    snapshot
        .hosts()
        .iter()
        .map(|host| (host.agent_ip.clone(), Entry::from_host(host, self_uuid)))
        .collect()
}

/// Apply the visibility filter, returning the agent IP of the workload's host
///
/// A host missing from the inventory yields an empty agent IP.
pub fn visible_host_ip<'a>(container: &Container, snapshot: &'a Snapshot) -> Result<&'a str, SkipReason> {
    if !container.is_active() {
        return Err(SkipReason::NotRunning);
    }
    if container.primary_ip.is_empty() {
        return Err(SkipReason::NoPrimaryIp);
    }
    if container.shares_network_namespace() {
        return Err(SkipReason::SharedNetworkNamespace);
    }
    match snapshot.self_network() {
        Some(network) if network.uuid == container.network_uuid => {}
        _ => return Err(SkipReason::OtherNetwork),
    }
    if container.primary_ip == snapshot.self_host().agent_ip {
        return Err(SkipReason::SelfHostAddress);
    }
    let host_ip = snapshot
        .host(&container.host_uuid)
        .map_or("", |host| host.agent_ip.as_str());
    if container.primary_ip == host_ip {
        return Err(SkipReason::OwnHostAddress);
    }
    Ok(host_ip)
}

/// Classify every workload of the snapshot
///
/// Workloads are visited in snapshot order and the first one claiming a
/// bare IP keeps it.
pub fn classify(snapshot: &Snapshot, subnet_prefix: &str) -> Classification {
    let self_entry = Entry::from_host(snapshot.self_host(), &snapshot.self_host().uuid);
    let peers = build_peers_map(snapshot);

    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    let mut local = BTreeMap::new();
    let mut remote = BTreeMap::new();
    let mut remote_non_peers = BTreeMap::new();

    for container in snapshot.containers() {
        let host_ip = match visible_host_ip(container, snapshot) {
            Ok(host_ip) => host_ip,
            Err(reason) => {
                debug!("Skipping container {}: {}", container.uuid, reason);
                continue;
            }
        };

        let entry = Entry::from_container(container, host_ip, subnet_prefix);
        let ip = entry.bare_ip().to_string();
        if !seen.insert(ip.clone()) {
            debug!("Skipping container {}: {} already seen", container.uuid, ip);
            continue;
        }

        if entry.host_ip_address == self_entry.host_ip_address {
            local.insert(ip, entry.clone());
        } else {
            if !entry.is_peer {
                remote_non_peers.insert(ip.clone(), entry.clone());
            }
            remote.insert(ip, entry.clone());
        }

        debug!("entry: {:?}", entry);
        entries.push(entry);
    }

    debug!(
        "Classified {} entries: {} local, {} remote, {} peers",
        entries.len(),
        local.len(),
        remote.len(),
        peers.len()
    );

    Classification {
        self_entry,
        entries,
        local,
        remote,
        peers,
        remote_non_peers,
    }
}
