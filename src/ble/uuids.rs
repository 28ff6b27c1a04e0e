//! BLE Service and Characteristic UUIDs.
//!
//! Contains all UUID constants used for fan communication.

use uuid::Uuid;

// Generic Access / Device Information (Standard BLE)
/// Device Name characteristic UUID.
pub const DEVICE_NAME_UUID: Uuid = Uuid::from_u128(0x0000_2a00_0000_1000_8000_00805f9b34fb);
/// Manufacturer Name characteristic UUID.
pub const MANUFACTURER_NAME_UUID: Uuid = Uuid::from_u128(0x0000_2a29_0000_1000_8000_00805f9b34fb);
/// Model Number characteristic UUID.
pub const MODEL_NUMBER_UUID: Uuid = Uuid::from_u128(0x0000_2a24_0000_1000_8000_00805f9b34fb);
/// Serial Number characteristic UUID.
pub const SERIAL_NUMBER_UUID: Uuid = Uuid::from_u128(0x0000_2a25_0000_1000_8000_00805f9b34fb);

// Fan control (vendor)
/// Notification characteristic UUID (state reports from the fan).
pub const NOTIFY_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x0000_fff1_0000_1000_8000_00805f9b34fb);
/// Command characteristic UUID (write to the fan).
pub const COMMAND_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x0000_fff2_0000_1000_8000_00805f9b34fb);

/// Lowercase substring of the manufacturer name reported by supported fans.
pub const FAN_MANUFACTURER_MARKER: &str = "chipsea";
