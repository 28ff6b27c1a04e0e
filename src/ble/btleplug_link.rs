//! `btleplug` implementation of the BLE link.
//!
//! Resolves the configured address to a peripheral, connects, and forwards
//! notifications from the subscribed characteristic to the registered
//! callback on a background task.

use async_trait::async_trait;
use btleplug::api::{
    BDAddr, Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::stream::StreamExt;
use parking_lot::{Mutex, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::ble::link::{BleLink, LinkConnection, NotificationCallback};
use crate::error::{Error, Result};
use crate::utils::to_hex;

/// Default time allowed to locate and connect to a fan.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval between peripheral list checks while locating a fan.
const LOCATE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// BLE link backed by the first system adapter.
pub struct BtleplugLink {
    /// The adapter, present between `start_adapter` and `stop_adapter`.
    adapter: RwLock<Option<Adapter>>,
    /// Time allowed for locating plus connecting.
    connect_timeout: Duration,
}

impl BtleplugLink {
    /// Create a link with the default connect timeout.
    pub fn new() -> Self {
        Self::with_connect_timeout(DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a link with a specific connect timeout.
    pub fn with_connect_timeout(connect_timeout: Duration) -> Self {
        Self {
            adapter: RwLock::new(None),
            connect_timeout,
        }
    }

    /// Find a peripheral by address, scanning until it shows up or the
    /// deadline passes.
    async fn locate(adapter: &Adapter, target: BDAddr, deadline: Instant) -> Result<Peripheral> {
        let mut scanning = false;

        let found = loop {
            if let Some(peripheral) = Self::known_peripheral(adapter, target).await? {
                break Some(peripheral);
            }

            if Instant::now() >= deadline {
                break None;
            }

            if !scanning {
                debug!("{} not known yet, scanning", target);
                adapter.start_scan(ScanFilter::default()).await?;
                scanning = true;
            }

            tokio::time::sleep(LOCATE_POLL_INTERVAL).await;
        };

        if scanning {
            if let Err(e) = adapter.stop_scan().await {
                debug!("Failed to stop scan: {}", e);
            }
        }

        found.ok_or_else(|| Error::DeviceNotFound {
            address: target.to_string(),
        })
    }

    async fn known_peripheral(adapter: &Adapter, target: BDAddr) -> Result<Option<Peripheral>> {
        let peripherals = adapter.peripherals().await?;
        Ok(peripherals.into_iter().find(|p| p.address() == target))
    }
}

impl Default for BtleplugLink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BleLink for BtleplugLink {
    async fn start_adapter(&self) -> Result<()> {
        if self.adapter.read().is_some() {
            return Ok(());
        }

        let manager = Manager::new()
            .await
            .map_err(|_e| Error::BluetoothUnavailable)?;

        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or(Error::BluetoothUnavailable)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        *self.adapter.write() = Some(adapter);
        Ok(())
    }

    fn stop_adapter(&self) {
        self.adapter.write().take();
    }

    async fn connect_by_address(&self, address: &str) -> Result<Box<dyn LinkConnection>> {
        let adapter = self
            .adapter
            .read()
            .clone()
            .ok_or(Error::BluetoothUnavailable)?;

        let target: BDAddr = address.parse().map_err(|_| Error::InvalidParameter {
            name: "address".to_string(),
            value: address.to_string(),
        })?;

        let deadline = Instant::now() + self.connect_timeout;
        let peripheral = Self::locate(&adapter, target, deadline).await?;

        let remaining = deadline.saturating_duration_since(Instant::now());
        tokio::time::timeout(remaining, peripheral.connect())
            .await
            .map_err(|_| Error::Timeout)??;

        if let Err(e) = peripheral.discover_services().await {
            // Without services there is no command characteristic to write to.
            if let Err(e) = peripheral.disconnect().await {
                debug!("Failed to disconnect after discovery failure: {}", e);
            }
            return Err(Error::ConnectionFailed {
                reason: format!("service discovery failed: {}", e),
            });
        }

        debug!("Connected to {}", target);

        Ok(Box::new(BtleplugConnection::new(peripheral)))
    }
}

/// A live `btleplug` connection.
pub struct BtleplugConnection {
    peripheral: Peripheral,
    /// Task forwarding notifications to the subscriber.
    listener: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl BtleplugConnection {
    fn new(peripheral: Peripheral) -> Self {
        Self {
            peripheral,
            listener: Mutex::new(None),
        }
    }

    fn characteristic(&self, uuid: Uuid) -> Result<Characteristic> {
        self.peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == uuid)
            .ok_or_else(|| Error::CharacteristicNotFound {
                uuid: uuid.to_string(),
            })
    }

    fn stop_listener(&self) {
        if let Some(handle) = self.listener.lock().take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl LinkConnection for BtleplugConnection {
    async fn subscribe(&self, characteristic: Uuid, callback: NotificationCallback) -> Result<()> {
        let target = self.characteristic(characteristic)?;

        self.peripheral.subscribe(&target).await?;
        let mut notifications = self.peripheral.notifications().await?;

        debug!("Subscribed to notifications from {}", characteristic);

        let handle = tokio::spawn(async move {
            while let Some(notification) = notifications.next().await {
                if notification.uuid != characteristic {
                    continue;
                }
                trace!(
                    "Notification from {}: {}",
                    notification.uuid,
                    to_hex(&notification.value)
                );
                callback(notification.value.as_slice());
            }
            debug!("Notification stream ended");
        });

        if let Some(previous) = self.listener.lock().replace(handle) {
            previous.abort();
        }

        Ok(())
    }

    async fn write_characteristic(&self, characteristic: Uuid, data: &[u8]) -> Result<()> {
        let target = self.characteristic(characteristic)?;

        self.peripheral
            .write(&target, data, WriteType::WithResponse)
            .await?;

        trace!("Wrote {} to {}", to_hex(data), characteristic);
        Ok(())
    }

    async fn read_characteristic(&self, characteristic: Uuid) -> Result<Vec<u8>> {
        let target = self.characteristic(characteristic)?;
        let data = self.peripheral.read(&target).await?;

        trace!("Read {} bytes from {}", data.len(), characteristic);
        Ok(data)
    }

    async fn disconnect(&self) -> Result<()> {
        self.stop_listener();

        if let Err(e) = self.peripheral.disconnect().await {
            warn!("Peripheral disconnect failed: {}", e);
            return Err(Error::Bluetooth(e));
        }
        Ok(())
    }
}

impl Drop for BtleplugConnection {
    fn drop(&mut self) {
        self.stop_listener();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout() {
        let link = BtleplugLink::default();
        assert_eq!(link.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert!(link.adapter.read().is_none());
    }

    #[tokio::test]
    async fn test_connect_requires_started_adapter() {
        let link = BtleplugLink::with_connect_timeout(Duration::from_millis(10));
        let result = link.connect_by_address("AA:BB:CC:DD:EE:FF").await;
        assert!(matches!(result, Err(Error::BluetoothUnavailable)));
    }

    #[test]
    fn test_stop_without_start_is_harmless() {
        let link = BtleplugLink::new();
        link.stop_adapter();
        link.stop_adapter();
        assert!(link.adapter.read().is_none());
    }
}
