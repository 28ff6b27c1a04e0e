//! Transport seam between the fan core and a BLE stack.
//!
//! [`BleLink`] brings an adapter up and connects to a fan by address;
//! [`LinkConnection`] is the live GATT connection. The crate ships a
//! `btleplug` implementation in [`crate::ble::btleplug_link`].

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;

/// Callback receiving raw notification bytes.
///
/// Invoked on a transport-owned task, so it must not block for long.
pub type NotificationCallback = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// A local BLE adapter able to open connections.
#[async_trait]
pub trait BleLink: Send + Sync {
    /// Bring the adapter online.
    async fn start_adapter(&self) -> Result<()>;

    /// Take the adapter offline. Must not fail.
    fn stop_adapter(&self);

    /// Connect to the peripheral with the given address.
    async fn connect_by_address(&self, address: &str) -> Result<Box<dyn LinkConnection>>;
}

/// An established GATT connection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkConnection: Send + Sync {
    /// Subscribe to notifications from a characteristic.
    async fn subscribe(&self, characteristic: Uuid, callback: NotificationCallback) -> Result<()>;

    /// Write bytes to a characteristic.
    async fn write_characteristic(&self, characteristic: Uuid, data: &[u8]) -> Result<()>;

    /// Read a characteristic value.
    async fn read_characteristic(&self, characteristic: Uuid) -> Result<Vec<u8>>;

    /// Close the connection.
    async fn disconnect(&self) -> Result<()>;
}

/// Keeps an adapter online for as long as it is held.
///
/// Dropping the lease stops the adapter, whatever path released it.
pub struct AdapterLease {
    link: Arc<dyn BleLink>,
}

impl AdapterLease {
    /// Start the adapter and hold it.
    pub async fn acquire(link: Arc<dyn BleLink>) -> Result<Self> {
        link.start_adapter().await?;
        debug!("Adapter started");
        Ok(Self { link })
    }
}

impl Drop for AdapterLease {
    fn drop(&mut self) {
        self.link.stop_adapter();
        debug!("Adapter stopped");
    }
}

impl std::fmt::Debug for AdapterLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterLease").finish_non_exhaustive()
    }
}
