// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # lasko-fan-ble
//!
//! A Rust library for controlling Lasko W9560 tower fans over Bluetooth
//! Low Energy.
//!
//! The fan speaks a small proprietary protocol: fixed command frames written
//! to one characteristic, and variable-length state frames delivered as
//! notifications on another. This library wraps the protocol in a
//! [`FanDevice`] that keeps the last-known state and reconnects on demand.
//!
//! ## Features
//!
//! - **Commands**: Power, speed and airflow direction
//! - **State Tracking**: Power, speed, direction, temperature and alternate control
//! - **Observer**: A single callback fired after every state notification
//! - **Recovery**: One reconnect and state request per failed command
//! - **Device Information**: Manufacturer, model, serial and name strings
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lasko_fan_ble::{FanDevice, FanSpeed, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let fan = FanDevice::new("AA:BB:CC:DD:EE:FF");
//!
//!     fan.register_observer(|state| println!("{}", state));
//!
//!     if !fan.connect().await.is_connected() {
//!         eprintln!("fan not reachable");
//!         return Ok(());
//!     }
//!
//!     fan.set_speed(FanSpeed::Medium).await;
//!     println!("{}", fan.read_device_info().await?);
//!
//!     fan.disconnect().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Platform Notes
//!
//! ### macOS
//! Requires Bluetooth permission. Add `NSBluetoothAlwaysUsageDescription`
//! to your Info.plist for bundled apps.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

// Public modules
pub mod ble;
pub mod config;
pub mod data;
pub mod dispatcher;
pub mod error;
pub mod fan;
pub mod protocol;
pub mod utils;

// Re-exports for convenience
pub use config::FanConfig;
pub use error::{Error, Result};
pub use fan::FanDevice;
pub use utils::{from_hex, to_hex};

// Re-export commonly used types from submodules
pub use ble::{
    BleLink, BtleplugLink, CommandOutcome, ConnectionEvent, ConnectionState, LinkConnection,
    NotificationCallback,
};
pub use data::{DeviceInfo, DeviceInfoField, DeviceState, Direction, FanSpeed, Speed};
pub use dispatcher::{NotificationDispatcher, StateObserver, StateStore};
pub use protocol::{decode_frame, ActionReport, Command, DecodeError, FanEvent, StateReport};
