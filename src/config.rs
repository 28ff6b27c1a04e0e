//! Per-fan configuration.

use std::time::Duration;

use crate::ble::btleplug_link::DEFAULT_CONNECT_TIMEOUT;

/// Default base name for a fan.
pub const DEFAULT_NAME: &str = "LaskoBTFan";

/// Configuration for a single fan.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FanConfig {
    /// Bluetooth address of the fan, e.g. `AA:BB:CC:DD:EE:FF`.
    pub address: String,
    /// Base name; the display name appends the address.
    pub name: String,
    /// Time allowed to locate and connect to the fan.
    pub connect_timeout: Duration,
}

impl FanConfig {
    /// Create a configuration for the fan at `address`.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Set the base name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Name shown to users: `<name>-<address>`.
    pub fn display_name(&self) -> String {
        format!("{}-{}", self.name, self.address)
    }
}

impl Default for FanConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            name: DEFAULT_NAME.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}
