//! # Topostore - overlay network topology store
//!
//! This library keeps a derived view of overlay-network topology for a
//! tunnel agent. Given periodic inventory snapshots of hosts, containers,
//! services and networks, it classifies every reachable workload as local
//! (same host) or remote (other host, same overlay network), builds the
//! host-level peer set used for tunnel establishment, and resolves extra
//! peers introduced by service links between environments.
//!
//! ## Architecture
//!
//! - `metadata`: inventory records and the [`metadata::MetadataSource`] trait
//! - `topology`: snapshot indexing, subnet resolution, classification,
//!   linked-service resolution and the [`topology::TopologyStore`]
//! - `config`: well-known names and defaults, loaded from YAML
//! - `report`: JSON view of a published topology
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use topostore::config::StoreConfig;
//! use topostore::metadata::FileSource;
//! use topostore::topology::TopologyStore;
//!
//! let store = TopologyStore::new(FileSource::new("inventory.yaml"), StoreConfig::default());
//! store.reload()?;
//!
//! for (ip, entry) in store.remote_entries_map() {
//!     println!("{} via {}", ip, entry.host_ip_address);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Refresh Semantics
//!
//! `reload` is driven by the caller; the store has no timer. A reload either
//! publishes a complete new topology in one atomic swap or fails and leaves
//! the previous one in place. Query accessors never block on a reload.
//!
//! ## Error Handling
//!
//! Fetch failures surface as [`metadata::MetadataError`]. Anomalies in
//! individual records never fail a reload; the record is skipped and logged.

pub mod config;
pub mod metadata;
pub mod report;
pub mod topology;
