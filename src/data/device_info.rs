//! Device information read from the standard GATT characteristics.

use std::fmt;

use uuid::Uuid;

use crate::ble::uuids::{
    DEVICE_NAME_UUID, FAN_MANUFACTURER_MARKER, MANUFACTURER_NAME_UUID, MODEL_NUMBER_UUID,
    SERIAL_NUMBER_UUID,
};

/// Identification strings reported by the fan.
///
/// Defaults are the values the W9560 ships with, so a field that cannot be
/// read still holds something sensible.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceInfo {
    /// Manufacturer name (`2a29`).
    pub manufacturer: String,
    /// Serial number (`2a25`).
    pub serial_number: String,
    /// Model number (`2a24`).
    pub model_number: String,
    /// GAP device name (`2a00`).
    pub device_name: String,
}

/// A device information field and the characteristic it is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceInfoField {
    /// Manufacturer name.
    Manufacturer,
    /// Serial number.
    SerialNumber,
    /// Model number.
    ModelNumber,
    /// Device name.
    DeviceName,
}

impl DeviceInfoField {
    /// All fields, in the order they are read.
    pub const ALL: [DeviceInfoField; 4] = [
        Self::Manufacturer,
        Self::SerialNumber,
        Self::ModelNumber,
        Self::DeviceName,
    ];

    /// The characteristic holding this field.
    pub fn uuid(&self) -> Uuid {
        match self {
            Self::Manufacturer => MANUFACTURER_NAME_UUID,
            Self::SerialNumber => SERIAL_NUMBER_UUID,
            Self::ModelNumber => MODEL_NUMBER_UUID,
            Self::DeviceName => DEVICE_NAME_UUID,
        }
    }

    /// Short name used in log messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Manufacturer => "manufacturer",
            Self::SerialNumber => "serial_nr",
            Self::ModelNumber => "model_nr",
            Self::DeviceName => "device_name",
        }
    }
}

impl DeviceInfo {
    /// Set a field from its string value.
    pub fn set(&mut self, field: DeviceInfoField, value: String) {
        match field {
            DeviceInfoField::Manufacturer => self.manufacturer = value,
            DeviceInfoField::SerialNumber => self.serial_number = value,
            DeviceInfoField::ModelNumber => self.model_number = value,
            DeviceInfoField::DeviceName => self.device_name = value,
        }
    }

    /// Check whether the manufacturer string identifies a supported fan.
    pub fn is_supported_fan(&self) -> bool {
        self.manufacturer
            .to_lowercase()
            .contains(FAN_MANUFACTURER_MARKER)
    }
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            manufacturer: "Chipsea".to_string(),
            serial_number: "com3".to_string(),
            model_number: "CSM92P10".to_string(),
            device_name: "Chipsea9210         ".to_string(),
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Manufacturer: {} Model: {} Serial: {} Device:{}",
            self.manufacturer, self.model_number, self.serial_number, self.device_name
        )
    }
}
