//! Cross-environment peers discovered through service links.
//!
//! When environments are linked, their overlay-management services link to
//! each other. Starting from the self service this follows one hop of the
//! link graph: the services it links to or, if it declares no links, the
//! system services linking to it. Only running workloads on a network named
//! like the self network are kept.

use crate::metadata::Container;
use crate::topology::snapshot::Snapshot;
use log::{debug, error, warn};
use std::collections::{BTreeSet, HashSet};

/// Result of linked-service resolution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkedPeers {
    /// Network ids hosting linked peers
    pub networks: BTreeSet<String>,
    pub containers: Vec<Container>,
}

impl LinkedPeers {
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

/// Resolve the peers reachable through links to or from `self_service`
pub fn resolve_linked_peers(snapshot: &Snapshot, self_service: &str) -> LinkedPeers {
    let mut peers = LinkedPeers::default();

    let Some(&self_position) = snapshot.services_named(self_service).first() else {
        warn!("Service {} not found in inventory, skipping linked peers", self_service);
        return peers;
    };

    let links = snapshot.links();
    let linked: Vec<usize> = if links.has_links(self_position) {
        for name in links.dangling(self_position) {
            error!(
                "Current service is linked to service: {}, but cannot find it in inventory",
                name
            );
        }
        links.outgoing(self_position).to_vec()
    } else {
        linking_services(snapshot, self_position)
    };

    let self_network_name = snapshot.self_network().map(|n| n.name.as_str());

    for service in linked.iter().filter_map(|&i| snapshot.service(i)) {
        debug!("Linked service: {}", service.qualified_name());
        for container in &service.containers {
            if !container.is_active() {
                continue;
            }
            let network_name = snapshot.network(&container.network_uuid).map(|n| n.name.as_str());
            if network_name.is_none() || network_name != self_network_name {
                continue;
            }
            peers.networks.insert(container.network_uuid.clone());
            peers.containers.push(container.clone());
        }
    }

    debug!("Linked peer networks: {:?}", peers.networks);
    debug!("Linked peer containers: {}", peers.containers.len());
    peers
}

/// Services linking to `target`, widened to every system service sharing a
/// linker's "stack/service" name
fn linking_services(snapshot: &Snapshot, target: usize) -> Vec<usize> {
    let mut seen = HashSet::new();
    let mut positions = Vec::new();
    for linker in snapshot.links().incoming(target).iter().filter_map(|&i| snapshot.service(i)) {
        for &position in snapshot.services_named(&linker.qualified_name()) {
            if seen.insert(position) {
                positions.push(position);
            }
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Host, Network, Service};

    fn network(uuid: &str, name: &str) -> Network {
        Network {
            uuid: uuid.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn container(uuid: &str, network_uuid: &str, state: &str) -> Container {
        Container {
            uuid: uuid.to_string(),
            network_uuid: network_uuid.to_string(),
            primary_ip: "10.42.1.1".to_string(),
            state: state.to_string(),
            ..Default::default()
        }
    }

    fn service(stack: &str, links: &[&str], containers: Vec<Container>) -> Service {
        Service {
            uuid: format!("{}-svc", stack),
            name: "ipsec".to_string(),
            stack_name: stack.to_string(),
            system: true,
            links: links.iter().map(|l| (l.to_string(), String::new())).collect(),
            containers,
        }
    }

    fn snapshot(services: Vec<Service>) -> Snapshot {
        let networks = vec![
            network("net-local", "ipsec"),
            network("net-env2", "ipsec"),
            network("net-bridge", "bridge"),
        ];
        Snapshot::new(Host::default(), Vec::new(), Vec::new(), services, networks, "ipsec")
    }

    #[test]
    fn test_outgoing_links() {
        let snap = snapshot(vec![
            service("ipsec", &["env2/ipsec", "gone/ipsec"], Vec::new()),
            service(
                "env2",
                &[],
                vec![
                    container("c1", "net-env2", "running"),
                    container("c2", "net-env2", "stopped"),
                    container("c3", "net-bridge", "running"),
                ],
            ),
        ]);

        let peers = resolve_linked_peers(&snap, "ipsec/ipsec");
        assert_eq!(peers.containers.len(), 1);
        assert_eq!(peers.containers[0].uuid, "c1");
        assert_eq!(peers.networks, BTreeSet::from(["net-env2".to_string()]));
    }

    #[test]
    fn test_incoming_links_when_self_has_none() {
        let snap = snapshot(vec![
            service("ipsec", &[], Vec::new()),
            service("env2", &["ipsec/ipsec"], vec![container("c1", "net-env2", "starting")]),
            service("env3", &[], vec![container("c9", "net-env2", "running")]),
        ]);

        let peers = resolve_linked_peers(&snap, "ipsec/ipsec");
        assert_eq!(peers.containers.len(), 1);
        assert_eq!(peers.containers[0].uuid, "c1");
    }

    #[test]
    fn test_incoming_links_include_same_named_services() {
        // Two env2/ipsec records; only the first declares the link
        let snap = snapshot(vec![
            service("ipsec", &[], Vec::new()),
            service("env2", &["ipsec/ipsec"], vec![container("c1", "net-env2", "running")]),
            service("env2", &[], vec![container("c2", "net-env2", "running")]),
        ]);

        let peers = resolve_linked_peers(&snap, "ipsec/ipsec");
        let uuids: Vec<&str> = peers.containers.iter().map(|c| c.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["c1", "c2"]);
    }

    #[test]
    fn test_only_one_hop() {
        // env2 links onwards to env3, which must not be reached
        let snap = snapshot(vec![
            service("ipsec", &["env2/ipsec"], Vec::new()),
            service("env2", &["env3/ipsec"], Vec::new()),
            service("env3", &[], vec![container("c3", "net-env2", "running")]),
        ]);

        assert!(resolve_linked_peers(&snap, "ipsec/ipsec").is_empty());
    }

    #[test]
    fn test_missing_self_service() {
        let snap = snapshot(vec![service("env2", &[], vec![container("c1", "net-env2", "running")])]);
        assert_eq!(resolve_linked_peers(&snap, "ipsec/ipsec"), LinkedPeers::default());
    }
}
