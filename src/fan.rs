//! Fan struct and methods.
//!
//! Represents a single Lasko W9560 fan.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::ble::btleplug_link::BtleplugLink;
use crate::ble::connection::{CommandOutcome, ConnectionEvent, ConnectionState, LinkSession};
use crate::ble::link::BleLink;
use crate::config::FanConfig;
use crate::data::{DeviceInfo, DeviceInfoField, DeviceState, Direction, FanSpeed, Speed};
use crate::dispatcher::{NotificationDispatcher, StateStore};
use crate::error::{Error, Result};
use crate::protocol::Command;

/// Represents a single fan.
///
/// Commands never fail loudly: a fan that cannot be reached is logged and
/// reported through [`CommandOutcome::Lost`], and its state stays at the
/// last known values.
pub struct FanDevice {
    /// Fan configuration.
    config: FanConfig,
    /// Last-known state, shared with the notification dispatcher.
    store: Arc<StateStore>,
    /// BLE session.
    session: LinkSession,
    /// Identification strings, factory defaults until read.
    device_info: RwLock<DeviceInfo>,
}

impl FanDevice {
    /// Create a fan for `address` using the system Bluetooth adapter.
    ///
    /// Does not connect.
    pub fn new(address: impl Into<String>) -> Self {
        Self::with_config(FanConfig::new(address))
    }

    /// Create a fan from a configuration using the system Bluetooth adapter.
    pub fn with_config(config: FanConfig) -> Self {
        let link = Arc::new(BtleplugLink::with_connect_timeout(config.connect_timeout));
        Self::with_link(config, link)
    }

    /// Create a fan that talks through the given link.
    pub fn with_link(config: FanConfig, link: Arc<dyn BleLink>) -> Self {
        let store = Arc::new(StateStore::new());
        let dispatcher = Arc::new(NotificationDispatcher::new(
            config.address.clone(),
            store.clone(),
        ));
        let session = LinkSession::new(config.address.clone(), link, dispatcher);

        Self {
            config,
            store,
            session,
            device_info: RwLock::new(DeviceInfo::default()),
        }
    }

    // === Identification ===

    /// Get the Bluetooth address.
    pub fn address(&self) -> &str {
        &self.config.address
    }

    /// Get the display name, `<name>-<address>`.
    pub fn name(&self) -> String {
        self.config.display_name()
    }

    /// Get the configuration.
    pub fn config(&self) -> &FanConfig {
        &self.config
    }

    /// Get the last device information read from the fan.
    pub fn device_info(&self) -> DeviceInfo {
        self.device_info.read().clone()
    }

    /// Read manufacturer, serial, model and name from the fan.
    ///
    /// Connects first if needed. A field that cannot be read keeps its
    /// previous value.
    pub async fn read_device_info(&self) -> Result<DeviceInfo> {
        if !self.session.is_connected() && !self.session.connect().await.is_connected() {
            return Err(Error::NotConnected);
        }

        let mut info = self.device_info();

        for field in DeviceInfoField::ALL {
            match self.session.read_characteristic(field.uuid()).await {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(value) => info.set(field, value),
                    Err(_) => warn!("{}: {} is not valid UTF-8", self.address(), field.name()),
                },
                Err(Error::NotConnected) => return Err(Error::NotConnected),
                Err(e) => warn!("{}: Failed to read {}: {}", self.address(), field.name(), e),
            }
        }

        *self.device_info.write() = info.clone();
        Ok(info)
    }

    // === Connection ===

    /// Connect to the fan and request its state.
    ///
    /// Failures are logged; the returned state tells whether it worked.
    pub async fn connect(&self) -> ConnectionState {
        self.session.connect().await
    }

    /// Disconnect from the fan.
    pub async fn disconnect(&self) {
        self.session.disconnect().await
    }

    /// Get the current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.session.state()
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// Subscribe to connection state changes.
    pub fn subscribe_connection_events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.session.subscribe()
    }

    // === Commands ===

    /// Send a raw command.
    pub async fn send_command(&self, command: Command) -> CommandOutcome {
        self.session.send_command(command).await
    }

    /// Ask the fan to report its state.
    pub async fn refresh_state(&self) -> CommandOutcome {
        self.send_command(Command::RequestState).await
    }

    /// Turn the fan on.
    pub async fn turn_on(&self) -> CommandOutcome {
        let outcome = self.send_command(Command::PowerOn).await;
        if outcome.is_delivered() {
            self.store.update(|state| state.power_on = true);
            info!("{}: on", self.address());
        }
        outcome
    }

    /// Turn the fan off. Stored speed and direction are kept.
    pub async fn turn_off(&self) -> CommandOutcome {
        let outcome = self.send_command(Command::PowerOff).await;
        if outcome.is_delivered() {
            self.store.update(|state| state.power_on = false);
            info!("{}: off", self.address());
        }
        outcome
    }

    /// Turn the fan on if needed, then set the speed.
    pub async fn turn_on_at(&self, speed: Speed) -> CommandOutcome {
        if !self.power_on() {
            let outcome = self.turn_on().await;
            if !outcome.is_delivered() {
                return outcome;
            }
        }
        self.set_speed(speed.into()).await
    }

    /// Set the speed. [`FanSpeed::Off`] turns the fan off.
    pub async fn set_speed(&self, speed: FanSpeed) -> CommandOutcome {
        let Some(level) = speed.level() else {
            return self.turn_off().await;
        };

        let outcome = self.send_command(Command::SetSpeed(level)).await;
        if outcome.is_delivered() {
            self.store.update(|state| state.speed = level);
        }
        outcome
    }

    /// Set the airflow direction.
    pub async fn set_direction(&self, direction: Direction) -> CommandOutcome {
        let outcome = self.send_command(Command::SetDirection(direction)).await;
        if outcome.is_delivered() {
            self.store.update(|state| state.direction = direction);
        }
        outcome
    }

    // === State ===

    /// Get a copy of the last-known state.
    pub fn state(&self) -> DeviceState {
        self.store.snapshot()
    }

    /// Check if the fan is running.
    pub fn power_on(&self) -> bool {
        self.store.snapshot().power_on
    }

    /// Get the speed as callers see it: `Off` while the fan is off.
    pub fn speed(&self) -> FanSpeed {
        self.store.snapshot().reported_speed()
    }

    /// Get the stored speed level, kept while the fan is off.
    pub fn stored_speed(&self) -> Speed {
        self.store.snapshot().speed
    }

    /// Get the airflow direction.
    pub fn direction(&self) -> Direction {
        self.store.snapshot().direction
    }

    /// Get the last temperature reading.
    pub fn temperature(&self) -> u8 {
        self.store.snapshot().temperature
    }

    /// Check if a button on the fan took control away from the app.
    pub fn alternate_control(&self) -> bool {
        self.store.snapshot().alternate_control
    }

    /// Register the observer called after every notification.
    ///
    /// Only one observer is kept; registering replaces the previous one.
    pub fn register_observer<F>(&self, observer: F)
    where
        F: Fn(&DeviceState) + Send + Sync + 'static,
    {
        self.store.set_observer(Arc::new(observer));
    }

    /// Remove the observer.
    pub fn clear_observer(&self) {
        self.store.clear_observer();
    }
}

impl std::fmt::Display for FanDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Mac:{}", self.device_info.read(), self.address())
    }
}

impl std::fmt::Debug for FanDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanDevice")
            .field("address", &self.address())
            .field("connection_state", &self.connection_state())
            .field("state", &self.state())
            .finish()
    }
}
