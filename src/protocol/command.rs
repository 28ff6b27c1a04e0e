//! Command frames written to the fan.
//!
//! Every command is a fixed byte sequence. The trailing byte of the
//! five-byte frames is not computed here: the firmware expects exactly
//! these values, so they are kept as a literal table.

use std::fmt;

use crate::data::{Direction, Speed};

/// Power the fan on.
pub const POWER_ON_FRAME: [u8; 5] = [0x04, 0x03, 0x04, 0x01, 0x08];
/// Power the fan off.
pub const POWER_OFF_FRAME: [u8; 5] = [0x04, 0x03, 0x04, 0x00, 0x07];
/// Set speed 1.
pub const SPEED_LOW_FRAME: [u8; 5] = [0x04, 0x03, 0x07, 0x01, 0x0B];
/// Set speed 2.
pub const SPEED_MEDIUM_FRAME: [u8; 5] = [0x04, 0x03, 0x07, 0x02, 0x0C];
/// Set speed 3.
pub const SPEED_HIGH_FRAME: [u8; 5] = [0x04, 0x03, 0x07, 0x03, 0x0D];
/// Blow forward.
pub const DIRECTION_FORWARD_FRAME: [u8; 5] = [0x04, 0x03, 0x08, 0x01, 0x0C];
/// Blow in reverse.
pub const DIRECTION_REVERSE_FRAME: [u8; 5] = [0x04, 0x03, 0x08, 0x00, 0x0B];
/// Alternate between forward and reverse.
pub const DIRECTION_MIXED_FRAME: [u8; 5] = [0x04, 0x03, 0x08, 0x02, 0x0D];
/// Ask the fan to report its full state.
pub const REQUEST_STATE_FRAME: [u8; 4] = [0x03, 0x03, 0x03, 0x06];

/// A command the fan understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Turn the fan on.
    PowerOn,
    /// Turn the fan off.
    PowerOff,
    /// Change the speed level.
    SetSpeed(Speed),
    /// Change the airflow direction.
    SetDirection(Direction),
    /// Request a full state report.
    RequestState,
}

impl Command {
    /// Encode the command as the bytes written to the command characteristic.
    pub fn frame(&self) -> &'static [u8] {
        match self {
            Self::PowerOn => &POWER_ON_FRAME,
            Self::PowerOff => &POWER_OFF_FRAME,
            Self::SetSpeed(Speed::Low) => &SPEED_LOW_FRAME,
            Self::SetSpeed(Speed::Medium) => &SPEED_MEDIUM_FRAME,
            Self::SetSpeed(Speed::High) => &SPEED_HIGH_FRAME,
            Self::SetDirection(Direction::Forward) => &DIRECTION_FORWARD_FRAME,
            Self::SetDirection(Direction::Reverse) => &DIRECTION_REVERSE_FRAME,
            Self::SetDirection(Direction::Mixed) => &DIRECTION_MIXED_FRAME,
            Self::RequestState => &REQUEST_STATE_FRAME,
        }
    }

    /// Check whether this command is the state poll.
    pub fn is_state_request(&self) -> bool {
        matches!(self, Self::RequestState)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PowerOn => write!(f, "power on"),
            Self::PowerOff => write!(f, "power off"),
            Self::SetSpeed(speed) => write!(f, "set speed {}", speed),
            Self::SetDirection(direction) => write!(f, "set direction {}", direction),
            Self::RequestState => write!(f, "request state"),
        }
    }
}
