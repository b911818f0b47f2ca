//! Overlay topology resolution.
//!
//! A refresh flows one way: inventory [`Snapshot`] → subnet prefix →
//! per-host and per-workload [`Entry`] classification → published
//! [`Topology`]. Linked-service peers are resolved alongside.

pub mod classifier;
pub mod entry;
pub mod linked;
pub mod snapshot;
pub mod store;
pub mod subnet;

// Re-export key types for easier access
pub use classifier::{classify, Classification, SkipReason};
pub use entry::{bare_ip, Entry};
pub use linked::{resolve_linked_peers, LinkedPeers};
pub use snapshot::{LinkGraph, Snapshot};
pub use store::{Topology, TopologyStore};
pub use subnet::{resolve_subnet_prefix, FallbackReason, SubnetPrefix};
