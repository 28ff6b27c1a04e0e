//! Protocol module for encoding commands and decoding notifications.
//!
//! This module contains the implementations for:
//! - Command frame encoding
//! - Notification frame decoding

pub mod command;
pub mod frame;

pub use command::Command;
pub use frame::{decode_frame, ActionReport, DecodeError, FanEvent, StateReport};
