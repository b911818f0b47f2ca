//! Topology store.
//!
//! Owns an inventory source and the currently published [`Topology`].
//! `reload` builds a complete new topology and swaps it in atomically;
//! readers keep answering from the previous one until then, and a failed
//! reload never replaces it.

use crate::config::StoreConfig;
use crate::metadata::{MetadataError, MetadataSource};
use crate::topology::classifier::{classify, Classification};
use crate::topology::entry::{bare_ip, Entry};
use crate::topology::linked::{resolve_linked_peers, LinkedPeers};
use crate::topology::snapshot::Snapshot;
use crate::topology::subnet::{resolve_subnet_prefix, SubnetPrefix};
use arc_swap::ArcSwap;
use log::{debug, error, info};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One fully built topology
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topology {
    classification: Classification,
    subnet_prefix: SubnetPrefix,
    linked_peers: LinkedPeers,
}

impl Topology {
    /// Resolve a topology from a snapshot
    pub fn build(snapshot: &Snapshot, config: &StoreConfig) -> Self {
        let subnet_prefix = resolve_subnet_prefix(snapshot.self_network(), &config.default_subnet_prefix);
        let classification = classify(snapshot, subnet_prefix.as_str());
        // Kept for inspection; not merged into the maps
        let linked_peers = resolve_linked_peers(snapshot, &config.self_service);

        Topology {
            classification,
            subnet_prefix,
            linked_peers,
        }
    }

    pub fn self_entry(&self) -> &Entry {
        &self.classification.self_entry
    }

    pub fn entries(&self) -> &[Entry] {
        &self.classification.entries
    }

    pub fn local(&self) -> &BTreeMap<String, Entry> {
        &self.classification.local
    }

    pub fn remote(&self) -> &BTreeMap<String, Entry> {
        &self.classification.remote
    }

    pub fn peers(&self) -> &BTreeMap<String, Entry> {
        &self.classification.peers
    }

    pub fn remote_non_peers(&self) -> &BTreeMap<String, Entry> {
        &self.classification.remote_non_peers
    }

    pub fn subnet_prefix(&self) -> &SubnetPrefix {
        &self.subnet_prefix
    }

    pub fn linked_peers(&self) -> &LinkedPeers {
        &self.linked_peers
    }

    /// Unknown addresses are not remote
    pub fn is_remote(&self, ip: &str) -> bool {
        if self.local().contains_key(ip) {
            debug!("Local: {}", ip);
            return false;
        }
        let remote = self.remote().contains_key(ip);
        if remote {
            debug!("Remote: {}", ip);
        }
        remote
    }
}

/// Topology store over an inventory source
pub struct TopologyStore<S> {
    source: S,
    config: StoreConfig,
    published: ArcSwap<Topology>,
    reload_lock: Mutex<()>,
}

impl<S: MetadataSource> TopologyStore<S> {
    pub fn new(source: S, config: StoreConfig) -> Self {
        TopologyStore {
            source,
            config,
            published: ArcSwap::from_pointee(Topology::default()),
            reload_lock: Mutex::new(()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Refresh the topology from the source
    ///
    /// Concurrent calls run one after the other. On error the previously
    /// published topology stays in place.
    pub fn reload(&self) -> Result<(), MetadataError> {
        let _guard = self.reload_lock.lock();
        debug!("Reloading ...");

        let snapshot = self.fetch_snapshot().map_err(|e| {
            error!("{}", e);
            e
        })?;
        let topology = Topology::build(&snapshot, &self.config);

        info!(
            "Topology reloaded: {} entries, {} local, {} remote, {} peers, subnet prefix {}",
            topology.entries().len(),
            topology.local().len(),
            topology.remote().len(),
            topology.peers().len(),
            topology.subnet_prefix().as_str()
        );

        self.published.store(Arc::new(topology));
        Ok(())
    }

    fn fetch_snapshot(&self) -> Result<Snapshot, MetadataError> {
        let self_host = self.source.self_host()?;
        let hosts = self.source.hosts()?;
        let containers = self.source.containers()?;
        let services = self.source.services()?;
        let networks = self.source.networks()?;

        Ok(Snapshot::new(
            self_host,
            hosts,
            containers,
            services,
            networks,
            &self.config.self_network_name,
        ))
    }

    /// The currently published topology
    pub fn current(&self) -> Arc<Topology> {
        self.published.load_full()
    }

    /// Agent IP of the host this store runs on
    pub fn local_host_ip_address(&self) -> String {
        self.published.load().self_entry().host_ip_address.clone()
    }

    /// Own address without its mask
    pub fn local_ip_address(&self) -> String {
        bare_ip(&self.published.load().self_entry().address).to_string()
    }

    pub fn is_remote(&self, ip: &str) -> bool {
        self.published.load().is_remote(ip)
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.published.load().entries().to_vec()
    }

    pub fn local_entries_map(&self) -> BTreeMap<String, Entry> {
        self.published.load().local().clone()
    }

    pub fn remote_entries_map(&self) -> BTreeMap<String, Entry> {
        self.published.load().remote().clone()
    }

    pub fn peer_entries_map(&self) -> BTreeMap<String, Entry> {
        self.published.load().peers().clone()
    }

    pub fn remote_non_peer_entries_map(&self) -> BTreeMap<String, Entry> {
        self.published.load().remote_non_peers().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Container, Host, Inventory, Network, Resource, StaticSource};

    fn inventory() -> Inventory {
        let h1 = Host {
            uuid: "h1".to_string(),
            agent_ip: "10.0.0.1".to_string(),
            ..Default::default()
        };
        Inventory {
            self_host: h1.clone(),
            hosts: vec![h1],
            containers: vec![Container {
                uuid: "c1".to_string(),
                host_uuid: "h1".to_string(),
                network_uuid: "n1".to_string(),
                primary_ip: "10.42.0.5".to_string(),
                state: "running".to_string(),
                ..Default::default()
            }],
            services: Vec::new(),
            networks: vec![Network {
                uuid: "n1".to_string(),
                name: "ipsec".to_string(),
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_empty_before_first_reload() {
        let store = TopologyStore::new(StaticSource::new(inventory()), StoreConfig::default());
        assert!(store.entries().is_empty());
        assert_eq!(store.local_host_ip_address(), "");
        assert_eq!(store.local_ip_address(), "");
        assert!(!store.is_remote("10.42.0.5"));
    }

    #[test]
    fn test_reload_publishes() {
        let store = TopologyStore::new(StaticSource::new(inventory()), StoreConfig::default());
        store.reload().unwrap();

        assert_eq!(store.local_host_ip_address(), "10.0.0.1");
        assert_eq!(store.local_ip_address(), "10.0.0.1");
        assert_eq!(store.entries().len(), 1);
        assert!(store.local_entries_map().contains_key("10.42.0.5"));
        assert!(!store.is_remote("10.42.0.5"));
        assert!(store.current().subnet_prefix().is_fallback());
    }

    #[test]
    fn test_failed_reload_keeps_previous() {
        let store = TopologyStore::new(StaticSource::new(inventory()), StoreConfig::default());
        store.reload().unwrap();
        let before = store.current();

        store.source().replace(Inventory::default());
        store.source().fail_on(Some(Resource::Networks));
        let err = store.reload().unwrap_err();
        assert!(matches!(err, MetadataError::Injected { resource: Resource::Networks }));

        assert_eq!(*store.current(), *before);
    }
}
