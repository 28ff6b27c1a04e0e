//! Data structures for fan data.
//!
//! This module contains the core data types used to represent the
//! fan's settings, its last-known state and its identification strings.

pub mod device_info;
pub mod state;

pub use device_info::{DeviceInfo, DeviceInfoField};
pub use state::{DeviceState, Direction, FanSpeed, Speed};
