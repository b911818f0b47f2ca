//! Overlay subnet prefix resolution.
//!
//! The prefix lives deep in the network's loosely structured metadata:
//! `metadata.cniConfig.<file>.ipam.subnetPrefixSize`. Each level is a typed
//! extraction; any miss short-circuits to the configured default.

use crate::config::parse_prefix_len;
use crate::metadata::Network;
use log::warn;
use serde_json::{Map, Value};
use std::fmt;

const CNI_CONFIG_KEY: &str = "cniConfig";
const IPAM_KEY: &str = "ipam";
const SUBNET_PREFIX_SIZE_KEY: &str = "subnetPrefixSize";

/// Why the default prefix was used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    NoSelfNetwork,
    MissingCniConfig,
    MissingIpam,
    MissingSubnetPrefixSize,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::NoSelfNetwork => write!(f, "self network not found"),
            FallbackReason::MissingCniConfig => write!(f, "couldn't find {} in network metadata", CNI_CONFIG_KEY),
            FallbackReason::MissingIpam => write!(f, "couldn't find {} key in network config", IPAM_KEY),
            FallbackReason::MissingSubnetPrefixSize => {
                write!(f, "couldn't find {} in network ipam config", SUBNET_PREFIX_SIZE_KEY)
            }
        }
    }
}

/// Outcome of subnet prefix resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubnetPrefix {
    /// Read from the network configuration
    Configured(String),
    /// Default applied
    Fallback { prefix: String, reason: FallbackReason },
}

impl SubnetPrefix {
    pub fn as_str(&self) -> &str {
        match self {
            SubnetPrefix::Configured(prefix) => prefix,
            SubnetPrefix::Fallback { prefix, .. } => prefix,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, SubnetPrefix::Fallback { .. })
    }
}

impl Default for SubnetPrefix {
    fn default() -> Self {
        SubnetPrefix::Fallback {
            prefix: crate::config::DEFAULT_SUBNET_PREFIX.to_string(),
            reason: FallbackReason::NoSelfNetwork,
        }
    }
}

/// Resolve the subnet prefix of `network`, or `default` when it can't be read
pub fn resolve_subnet_prefix(network: Option<&Network>, default: &str) -> SubnetPrefix {
    let resolved = match network {
        Some(network) => lookup(&network.metadata),
        None => Err(FallbackReason::NoSelfNetwork),
    };

    match resolved {
        Ok(prefix) => SubnetPrefix::Configured(prefix),
        Err(reason) => {
            warn!("Using default subnet prefix {}: {}", default, reason);
            SubnetPrefix::Fallback {
                prefix: default.to_string(),
                reason,
            }
        }
    }
}

/// Walk the nested config; the first file entry defining a value wins
fn lookup(metadata: &Map<String, Value>) -> Result<String, FallbackReason> {
    let files = metadata
        .get(CNI_CONFIG_KEY)
        .and_then(Value::as_object)
        .ok_or(FallbackReason::MissingCniConfig)?;

    let mut reason = FallbackReason::MissingCniConfig;
    for file in files.values() {
        let Some(ipam) = file.get(IPAM_KEY).and_then(Value::as_object) else {
            reason = FallbackReason::MissingIpam;
            continue;
        };
        let Some(prefix) = ipam.get(SUBNET_PREFIX_SIZE_KEY).and_then(Value::as_str) else {
            reason = FallbackReason::MissingSubnetPrefixSize;
            continue;
        };
        if parse_prefix_len(prefix).is_none() {
            warn!("Unusual {} '{}' in network ipam config", SUBNET_PREFIX_SIZE_KEY, prefix);
        }
        return Ok(prefix.to_string());
    }

    Err(reason)
}
