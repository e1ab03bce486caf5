// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Device configuration (JSON).
//!
//! Every field has a serde default so a partial file, or `{}`, is a valid
//! configuration.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::constants::{
    NS_DPWS, NS_MDPWS, UDP_MULTICAST_DISCOVERY_IP_V4, UDP_MULTICAST_DISCOVERY_PORT,
};
use crate::discovery::DiscoveryIdentity;
use crate::soap::QName;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Discovery socket settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Multicast group to join and announce to
    #[serde(default = "default_multicast_address")]
    pub multicast_address: Ipv4Addr,

    /// UDP port (0 picks an ephemeral port, useful for tests)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Local address to bind
    #[serde(default = "default_bind_address")]
    pub bind_address: Ipv4Addr,

    /// Multicast TTL (WS-Discovery restricts announcements to the local link)
    #[serde(default = "default_multicast_ttl")]
    pub multicast_ttl: u32,

    /// Deliver our own multicast traffic back to local listeners
    #[serde(default = "default_true")]
    pub multicast_loop: bool,
}

fn default_multicast_address() -> Ipv4Addr {
    UDP_MULTICAST_DISCOVERY_IP_V4
}

fn default_port() -> u16 {
    UDP_MULTICAST_DISCOVERY_PORT
}

fn default_bind_address() -> Ipv4Addr {
    Ipv4Addr::UNSPECIFIED
}

fn default_multicast_ttl() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            multicast_address: default_multicast_address(),
            port: default_port(),
            bind_address: default_bind_address(),
            multicast_ttl: default_multicast_ttl(),
            multicast_loop: true,
        }
    }
}

/// Subscription manager settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventingConfig {
    /// Address returned in the `SubscriptionManager` reference of SubscribeResponse
    #[serde(default = "default_manager_address")]
    pub subscription_manager_address: String,

    /// Granted duration when a Subscribe carries no `Expires`
    #[serde(default = "default_expiration_secs")]
    pub default_expiration_secs: u64,

    /// Upper bound for granted durations
    #[serde(default = "default_max_expiration_secs")]
    pub max_expiration_secs: u64,

    /// Pending notifications per destination before new ones are dropped
    #[serde(default = "default_queue_depth")]
    pub delivery_queue_depth: usize,

    /// Per-request HTTP timeout (none = transport default)
    #[serde(default)]
    pub delivery_timeout_secs: Option<u64>,

    /// Period of the expired-subscription sweep
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_manager_address() -> String {
    "http://localhost:8080/StateEventService".to_string()
}

fn default_expiration_secs() -> u64 {
    3600
}

fn default_max_expiration_secs() -> u64 {
    3600
}

fn default_queue_depth() -> usize {
    64
}

fn default_sweep_interval() -> u64 {
    30
}

impl Default for EventingConfig {
    fn default() -> Self {
        Self {
            subscription_manager_address: default_manager_address(),
            default_expiration_secs: default_expiration_secs(),
            max_expiration_secs: default_max_expiration_secs(),
            delivery_queue_depth: default_queue_depth(),
            delivery_timeout_secs: None,
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl EventingConfig {
    pub fn default_expiration(&self) -> Duration {
        Duration::from_secs(self.default_expiration_secs)
    }

    pub fn max_expiration(&self) -> Duration {
        Duration::from_secs(self.max_expiration_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn delivery_timeout(&self) -> Option<Duration> {
        self.delivery_timeout_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_expiration_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "max_expiration_secs cannot be 0".into(),
            ));
        }
        if self.default_expiration_secs > self.max_expiration_secs {
            return Err(ConfigError::InvalidValue(
                "default_expiration_secs exceeds max_expiration_secs".into(),
            ));
        }
        if self.delivery_queue_depth == 0 {
            return Err(ConfigError::InvalidValue(
                "delivery_queue_depth cannot be 0".into(),
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "sweep_interval_secs cannot be 0".into(),
            ));
        }
        Ok(())
    }
}

/// Complete device configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Stable endpoint reference (`urn:uuid:...`); generated when absent
    #[serde(default)]
    pub endpoint_reference: Option<String>,

    /// Discovery types
    #[serde(default = "default_types")]
    pub types: Vec<QName>,

    #[serde(default)]
    pub scopes: Vec<String>,

    /// Transport addresses of the hosting service
    #[serde(default)]
    pub xaddrs: Vec<String>,

    #[serde(default = "default_metadata_version")]
    pub metadata_version: u32,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub eventing: EventingConfig,
}

/// `dpws:Device mdpws:MedicalDevice`
fn default_types() -> Vec<QName> {
    vec![
        QName::new(NS_DPWS, "Device"),
        QName::new(NS_MDPWS, "MedicalDevice"),
    ]
}

fn default_metadata_version() -> u32 {
    1
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            endpoint_reference: None,
            types: default_types(),
            scopes: Vec::new(),
            xaddrs: Vec::new(),
            metadata_version: default_metadata_version(),
            discovery: DiscoveryConfig::default(),
            eventing: EventingConfig::default(),
        }
    }
}

impl DeviceConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file.
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(epr) = &self.endpoint_reference {
            if epr.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "endpoint_reference cannot be empty".into(),
                ));
            }
        }
        if !self.discovery.multicast_address.is_multicast() {
            return Err(ConfigError::InvalidValue(format!(
                "{} is not a multicast address",
                self.discovery.multicast_address
            )));
        }
        self.eventing.validate()
    }

    /// Discovery identity described by this configuration.
    pub fn identity(&self) -> DiscoveryIdentity {
        let epr = self
            .endpoint_reference
            .clone()
            .unwrap_or_else(crate::messaging::new_message_id);
        DiscoveryIdentity {
            endpoint_reference: epr,
            types: self.types.clone(),
            scopes: self.scopes.clone(),
            xaddrs: self.xaddrs.clone(),
            metadata_version: self.metadata_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DeviceConfig::default();
        assert_eq!(config.discovery.port, 3702);
        assert_eq!(
            config.discovery.multicast_address,
            Ipv4Addr::new(239, 255, 255, 250)
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: DeviceConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(config.metadata_version, 1);
        assert_eq!(config.types.len(), 2);
        assert_eq!(config.eventing.default_expiration(), Duration::from_secs(3600));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("device.json");
        let config = DeviceConfig {
            endpoint_reference: Some("urn:uuid:pump-7".into()),
            xaddrs: vec!["http://10.0.0.2:8080/device".into()],
            ..Default::default()
        };
        config.to_file(&path).expect("write");
        let loaded = DeviceConfig::from_file(&path).expect("read");
        assert_eq!(loaded.endpoint_reference.as_deref(), Some("urn:uuid:pump-7"));
        assert_eq!(loaded.xaddrs, config.xaddrs);
    }

    #[test]
    fn test_validation_rejects_unicast_group() {
        let mut config = DeviceConfig::default();
        config.discovery.multicast_address = Ipv4Addr::new(10, 0, 0, 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_default_above_max() {
        let config = EventingConfig {
            default_expiration_secs: 7200,
            max_expiration_secs: 60,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_identity_generates_endpoint_reference() {
        let identity = DeviceConfig::default().identity();
        assert!(identity.endpoint_reference.starts_with("urn:uuid:"));
    }
}
