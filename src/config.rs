//! Store configuration.
//!
//! Well-known names and defaults used while resolving a topology. All fields
//! have defaults, so an empty YAML document is a valid configuration.

use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Name of the overlay network the agent participates in
pub const DEFAULT_SELF_NETWORK_NAME: &str = "ipsec";

/// Qualified name of the overlay-management service
pub const DEFAULT_SELF_SERVICE: &str = "ipsec/ipsec";

/// Subnet prefix applied when the network configuration doesn't define one
pub const DEFAULT_SUBNET_PREFIX: &str = "/16";

/// Errors raised by configuration validation
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid network configuration: {0}")]
    InvalidNetwork(String),
    #[error("Invalid service configuration: {0}")]
    InvalidService(String),
    #[error("Invalid subnet prefix: {0}")]
    InvalidSubnetPrefix(String),
}

/// Configuration for a [`crate::topology::TopologyStore`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub self_network_name: String,
    pub self_service: String,
    pub default_subnet_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            self_network_name: DEFAULT_SELF_NETWORK_NAME.to_string(),
            self_service: DEFAULT_SELF_SERVICE.to_string(),
            default_subnet_prefix: DEFAULT_SUBNET_PREFIX.to_string(),
        }
    }
}

impl StoreConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.self_network_name.is_empty() {
            return Err(ValidationError::InvalidNetwork(
                "self_network_name cannot be empty".to_string(),
            ));
        }

        match self.self_service.split_once('/') {
            Some((stack, service)) if !stack.is_empty() && !service.is_empty() => {}
            _ => {
                return Err(ValidationError::InvalidService(format!(
                    "self_service must be of the form stack/service, got '{}'",
                    self.self_service
                )));
            }
        }

        if parse_prefix_len(&self.default_subnet_prefix).is_none() {
            return Err(ValidationError::InvalidSubnetPrefix(format!(
                "default_subnet_prefix must look like /N, got '{}'",
                self.default_subnet_prefix
            )));
        }

        Ok(())
    }
}

/// Parse a "/N" prefix into its length, accepting 0..=128
pub fn parse_prefix_len(prefix: &str) -> Option<u8> {
    let len: u8 = prefix.strip_prefix('/')?.parse().ok()?;
    (len <= 128).then_some(len)
}

/// Load and validate a store configuration from a YAML file
pub fn load_config(config_path: &Path) -> color_eyre::Result<StoreConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)?;
    let config: StoreConfig = serde_yaml::from_reader(file)?;

    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = StoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.self_network_name, DEFAULT_SELF_NETWORK_NAME);
        assert_eq!(config.default_subnet_prefix, DEFAULT_SUBNET_PREFIX);
    }

    #[test]
    fn test_load_partial_config() {
        let yaml = r#"
self_network_name: overlay
default_subnet_prefix: "/24"
"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.self_network_name, "overlay");
        assert_eq!(config.default_subnet_prefix, "/24");
        assert_eq!(config.self_service, DEFAULT_SELF_SERVICE);
    }

    #[test]
    fn test_invalid_configs() {
        let config = StoreConfig {
            self_network_name: String::new(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidNetwork(_))));

        let config = StoreConfig {
            self_service: "ipsec".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidService(_))));

        let config = StoreConfig {
            default_subnet_prefix: "16".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidSubnetPrefix(_))));
    }

    #[test]
    fn test_parse_prefix_len() {
        assert_eq!(parse_prefix_len("/16"), Some(16));
        assert_eq!(parse_prefix_len("/0"), Some(0));
        assert_eq!(parse_prefix_len("/129"), None);
        assert_eq!(parse_prefix_len("/abc"), None);
        assert_eq!(parse_prefix_len("24"), None);
    }
}
