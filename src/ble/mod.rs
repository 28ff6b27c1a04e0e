//! BLE communication module.
//!
//! This module provides the Bluetooth Low Energy plumbing for talking to
//! a fan: the link traits, the `btleplug` link, and the session that owns
//! one fan's connection.

pub mod btleplug_link;
pub mod connection;
pub mod link;
pub mod uuids;

pub use btleplug_link::BtleplugLink;
pub use connection::{CommandOutcome, ConnectionEvent, ConnectionState, LinkSession};
pub use link::{AdapterLease, BleLink, LinkConnection, NotificationCallback};
pub use uuids::*;
