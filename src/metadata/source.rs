//! Inventory sources.
//!
//! A [`MetadataSource`] answers the five fetches a refresh needs. Each fetch
//! can fail on its own; the store aborts the refresh on the first failure.

use crate::metadata::types::{Container, Host, Inventory, Network, Service};
use log::debug;
use parking_lot::Mutex;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The inventory collections a source can be asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    SelfHost,
    Hosts,
    Containers,
    Services,
    Networks,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::SelfHost => "self host",
            Resource::Hosts => "hosts",
            Resource::Containers => "containers",
            Resource::Services => "services",
            Resource::Networks => "networks",
        };
        f.write_str(name)
    }
}

/// Errors returned by inventory sources
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("couldn't get {resource} from metadata: {reason}")]
    Fetch { resource: Resource, reason: String },

    #[error("couldn't read inventory file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't parse inventory file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("injected failure fetching {resource}")]
    Injected { resource: Resource },
}

/// Client side of the inventory service
pub trait MetadataSource {
    fn self_host(&self) -> Result<Host, MetadataError>;
    fn hosts(&self) -> Result<Vec<Host>, MetadataError>;
    fn containers(&self) -> Result<Vec<Container>, MetadataError>;
    fn services(&self) -> Result<Vec<Service>, MetadataError>;
    fn networks(&self) -> Result<Vec<Network>, MetadataError>;
}

impl<S: MetadataSource + ?Sized> MetadataSource for std::sync::Arc<S> {
    fn self_host(&self) -> Result<Host, MetadataError> {
        (**self).self_host()
    }

    fn hosts(&self) -> Result<Vec<Host>, MetadataError> {
        (**self).hosts()
    }

    fn containers(&self) -> Result<Vec<Container>, MetadataError> {
        (**self).containers()
    }

    fn services(&self) -> Result<Vec<Service>, MetadataError> {
        (**self).services()
    }

    fn networks(&self) -> Result<Vec<Network>, MetadataError> {
        (**self).networks()
    }
}

#[derive(Debug, Default)]
struct StaticState {
    inventory: Inventory,
    failing: Option<Resource>,
}

/// In-memory source holding a replaceable inventory
///
/// A single resource can be marked as failing to exercise the refresh
/// error path.
#[derive(Debug, Default)]
pub struct StaticSource {
    state: Mutex<StaticState>,
}

impl StaticSource {
    pub fn new(inventory: Inventory) -> Self {
        StaticSource {
            state: Mutex::new(StaticState { inventory, failing: None }),
        }
    }

    /// Swap in a new inventory for subsequent fetches
    pub fn replace(&self, inventory: Inventory) {
        self.state.lock().inventory = inventory;
    }

    /// Make fetches of `resource` fail until cleared with `None`
    pub fn fail_on(&self, resource: Option<Resource>) {
        self.state.lock().failing = resource;
    }

    fn fetch<T>(&self, resource: Resource, pick: impl FnOnce(&Inventory) -> T) -> Result<T, MetadataError> {
        let state = self.state.lock();
        if state.failing == Some(resource) {
            return Err(MetadataError::Injected { resource });
        }
        Ok(pick(&state.inventory))
    }
}

impl MetadataSource for StaticSource {
    fn self_host(&self) -> Result<Host, MetadataError> {
        self.fetch(Resource::SelfHost, |inv| inv.self_host.clone())
    }

    fn hosts(&self) -> Result<Vec<Host>, MetadataError> {
        self.fetch(Resource::Hosts, |inv| inv.hosts.clone())
    }

    fn containers(&self) -> Result<Vec<Container>, MetadataError> {
        self.fetch(Resource::Containers, |inv| inv.containers.clone())
    }

    fn services(&self) -> Result<Vec<Service>, MetadataError> {
        self.fetch(Resource::Services, |inv| inv.services.clone())
    }

    fn networks(&self) -> Result<Vec<Network>, MetadataError> {
        self.fetch(Resource::Networks, |inv| inv.networks.clone())
    }
}

/// Source backed by an inventory dump on disk
///
/// Files ending in `.json` are parsed as JSON, anything else as YAML.
/// `self_host` is the first fetch of a refresh: it re-reads the file and
/// the remaining fetches answer from that same parse, so an edit landing
/// mid-refresh can't mix two versions of the file.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    parsed: Mutex<Option<Inventory>>,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource {
            path: path.into(),
            parsed: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Answer from the last parse, reading the file if there is none
    fn fetch<T>(&self, pick: impl FnOnce(&Inventory) -> T) -> Result<T, MetadataError> {
        let mut parsed = self.parsed.lock();
        let inventory = match parsed.take() {
            Some(inventory) => inventory,
            None => load_inventory(&self.path)?,
        };
        let picked = pick(&inventory);
        *parsed = Some(inventory);
        Ok(picked)
    }
}

impl MetadataSource for FileSource {
    fn self_host(&self) -> Result<Host, MetadataError> {
        let inventory = load_inventory(&self.path)?;
        let self_host = inventory.self_host.clone();
        *self.parsed.lock() = Some(inventory);
        Ok(self_host)
    }

    fn hosts(&self) -> Result<Vec<Host>, MetadataError> {
        self.fetch(|inv| inv.hosts.clone())
    }

    fn containers(&self) -> Result<Vec<Container>, MetadataError> {
        self.fetch(|inv| inv.containers.clone())
    }

    fn services(&self) -> Result<Vec<Service>, MetadataError> {
        self.fetch(|inv| inv.services.clone())
    }

    fn networks(&self) -> Result<Vec<Network>, MetadataError> {
        self.fetch(|inv| inv.networks.clone())
    }
}

/// Load an inventory dump from a YAML or JSON file
pub fn load_inventory(path: &Path) -> Result<Inventory, MetadataError> {
    debug!("Loading inventory from: {:?}", path);

    let file = File::open(path).map_err(|source| MetadataError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path.extension().map_or(false, |ext| ext == "json");
    let parsed = if is_json {
        serde_json::from_reader(file).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_reader(file).map_err(|e| e.to_string())
    };

    parsed.map_err(|reason| MetadataError::Parse {
        path: path.to_path_buf(),
        reason,
    })
}
