//! Point-in-time inventory snapshot with lookup indexes.
//!
//! A snapshot is built once per refresh and never mutated afterwards. The
//! indexes store positions into the owned record vectors.

use crate::metadata::{Container, Host, Network, Service};
use log::debug;
use std::collections::HashMap;

/// Directed service link graph over system services
///
/// Edges point from a service to the services it links to. Both directions
/// are indexed so outgoing and incoming traversals are plain lookups.
#[derive(Debug, Default)]
pub struct LinkGraph {
    outgoing: HashMap<usize, Vec<usize>>,
    incoming: HashMap<usize, Vec<usize>>,
    /// Link names that matched no service, per linking service
    dangling: HashMap<usize, Vec<String>>,
}

impl LinkGraph {
    fn build(services: &[Service], services_by_name: &HashMap<String, Vec<usize>>) -> Self {
        let mut graph = LinkGraph::default();

        for (from, service) in services.iter().enumerate() {
            if !service.system {
                continue;
            }
            for name in service.linked_service_names() {
                match services_by_name.get(name) {
                    Some(targets) => {
                        for &to in targets {
                            graph.outgoing.entry(from).or_default().push(to);
                            graph.incoming.entry(to).or_default().push(from);
                        }
                    }
                    None => graph.dangling.entry(from).or_default().push(name.to_string()),
                }
            }
        }

        graph
    }

    /// Services that `service` links to
    pub fn outgoing(&self, service: usize) -> &[usize] {
        self.outgoing.get(&service).map_or(&[], Vec::as_slice)
    }

    /// Services that link to `service`
    pub fn incoming(&self, service: usize) -> &[usize] {
        self.incoming.get(&service).map_or(&[], Vec::as_slice)
    }

    /// Link names declared by `service` that matched nothing
    pub fn dangling(&self, service: usize) -> &[String] {
        self.dangling.get(&service).map_or(&[], Vec::as_slice)
    }

    /// Returns true if `service` declares any link, resolved or not
    pub fn has_links(&self, service: usize) -> bool {
        !self.outgoing(service).is_empty() || !self.dangling(service).is_empty()
    }
}

/// One consistent pull of inventory records
#[derive(Debug)]
pub struct Snapshot {
    self_host: Host,
    hosts: Vec<Host>,
    containers: Vec<Container>,
    services: Vec<Service>,
    networks: Vec<Network>,
    hosts_by_uuid: HashMap<String, usize>,
    networks_by_uuid: HashMap<String, usize>,
    services_by_name: HashMap<String, Vec<usize>>,
    self_network: Option<usize>,
    links: LinkGraph,
}

impl Snapshot {
    pub fn new(
        self_host: Host,
        hosts: Vec<Host>,
        containers: Vec<Container>,
        services: Vec<Service>,
        networks: Vec<Network>,
        self_network_name: &str,
    ) -> Self {
        let hosts_by_uuid = index_by_uuid(hosts.iter().map(|h| h.uuid.as_str()));
        let networks_by_uuid = index_by_uuid(networks.iter().map(|n| n.uuid.as_str()));
        let services_by_name = index_services_by_name(&services);
        let self_network = networks.iter().position(|n| n.name == self_network_name);
        let links = LinkGraph::build(&services, &services_by_name);

        debug!(
            "Snapshot: {} hosts, {} containers, {} services, {} networks, self network {:?}",
            hosts.len(),
            containers.len(),
            services.len(),
            networks.len(),
            self_network.map(|i| &networks[i].uuid)
        );

        Snapshot {
            self_host,
            hosts,
            containers,
            services,
            networks,
            hosts_by_uuid,
            networks_by_uuid,
            services_by_name,
            self_network,
            links,
        }
    }

    pub fn self_host(&self) -> &Host {
        &self.self_host
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    pub fn host(&self, uuid: &str) -> Option<&Host> {
        self.hosts_by_uuid.get(uuid).map(|&i| &self.hosts[i])
    }

    pub fn network(&self, uuid: &str) -> Option<&Network> {
        self.networks_by_uuid.get(uuid).map(|&i| &self.networks[i])
    }

    pub fn service(&self, position: usize) -> Option<&Service> {
        self.services.get(position)
    }

    /// Positions of the system services registered under "stack/service"
    pub fn services_named(&self, qualified_name: &str) -> &[usize] {
        self.services_by_name.get(qualified_name).map_or(&[], Vec::as_slice)
    }

    /// The overlay network this agent participates in
    pub fn self_network(&self) -> Option<&Network> {
        self.self_network.map(|i| &self.networks[i])
    }

    pub fn links(&self) -> &LinkGraph {
        &self.links
    }
}

/// Last record wins on duplicate ids
fn index_by_uuid<'a>(uuids: impl Iterator<Item = &'a str>) -> HashMap<String, usize> {
    uuids
        .enumerate()
        .map(|(i, uuid)| (uuid.to_string(), i))
        .collect()
}

/// Index system services by "stack/service"
///
/// Names aren't unique, so every match is kept.
fn index_services_by_name(services: &[Service]) -> HashMap<String, Vec<usize>> {
    let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, service) in services.iter().enumerate() {
        if !service.system {
            continue;
        }
        by_name.entry(service.qualified_name()).or_default().push(i);
    }
    by_name
}
