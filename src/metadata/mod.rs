//! Inventory records and the sources they are fetched from.
//!
//! The network client for the real inventory service lives outside this
//! crate; it only has to implement [`MetadataSource`].

pub mod source;
pub mod types;

pub use source::{load_inventory, FileSource, MetadataError, MetadataSource, Resource, StaticSource};
pub use types::{qualified_name, Container, Host, Inventory, Network, Service, ACTIVE_STATES};
