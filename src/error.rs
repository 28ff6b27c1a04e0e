//! Error types for the lasko-fan-ble crate.

use thiserror::Error;

use crate::protocol::DecodeError;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    BluetoothUnavailable,

    /// No peripheral with the configured address could be located.
    #[error("Fan not found: {address}")]
    DeviceNotFound {
        /// The address that was searched for.
        address: String,
    },

    /// Operation requires a connection but the fan is not connected.
    #[error("Fan not connected")]
    NotConnected,

    /// Failed to establish a connection to the fan.
    #[error("Connection failed: {reason}")]
    ConnectionFailed {
        /// Description of why the connection failed.
        reason: String,
    },

    /// The transport did not complete in time.
    #[error("Link operation timed out")]
    Timeout,

    /// Characteristic not found on the device.
    #[error("Characteristic not found: {uuid}")]
    CharacteristicNotFound {
        /// The UUID of the characteristic that was not found.
        uuid: String,
    },

    /// A notification frame could not be decoded.
    #[error("Invalid frame: {0}")]
    Decode(#[from] DecodeError),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter {
        /// The name of the parameter.
        name: String,
        /// The invalid value that was provided.
        value: String,
    },
}

impl Error {
    /// Check if this error came from the BLE link.
    ///
    /// Link failures, missing connections and timeouts are all handled the
    /// same way by the session: log, then follow the retry/cleanup policy.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Bluetooth(_)
                | Self::BluetoothUnavailable
                | Self::DeviceNotFound { .. }
                | Self::NotConnected
                | Self::ConnectionFailed { .. }
                | Self::Timeout
                | Self::CharacteristicNotFound { .. }
        )
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
