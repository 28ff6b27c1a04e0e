//! Notification frame decoding.
//!
//! Notifications arrive on the `fff1` characteristic. Byte 0 tags the frame:
//! - `0x0B`: full state report (power at byte 3, speed at 5, direction at 7,
//!   temperature at 9)
//! - `0x06`: sensor report (temperature at byte 4)
//! - `0x04`: single action report (action code at byte 2, value at byte 3)

use thiserror::Error;

use crate::data::{Direction, Speed};

/// Full state report tag.
pub const KIND_STATE: u8 = 11;
/// Sensor report tag.
pub const KIND_SENSOR: u8 = 6;
/// Single action report tag.
pub const KIND_ACTION: u8 = 4;

/// Action code for a power change.
pub const ACTION_POWER: u8 = 4;
/// Action code for a speed change.
pub const ACTION_SPEED: u8 = 7;
/// Action code for a direction change.
pub const ACTION_DIRECTION: u8 = 8;

/// Error decoding a notification frame.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The notification carried no bytes.
    #[error("empty frame")]
    Empty,

    /// The frame is shorter than its kind requires.
    #[error("frame kind {kind} too short: {len} bytes (need at least {required})")]
    TooShort {
        /// The frame kind tag.
        kind: u8,
        /// Bytes received.
        len: usize,
        /// Bytes required for this kind.
        required: usize,
    },

    /// The kind tag is not one the fan is known to send.
    #[error("unknown frame kind {0}")]
    UnknownKind(u8),
}

/// Complete state carried by a full state report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateReport {
    /// Power flag.
    pub power_on: bool,
    /// Speed level.
    pub speed: Speed,
    /// Airflow direction.
    pub direction: Direction,
    /// Temperature reading.
    pub temperature: u8,
}

/// A single setting change reported by the fan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionReport {
    /// Power turned on or off.
    Power(bool),
    /// Speed level changed.
    Speed(Speed),
    /// Direction changed.
    Direction(Direction),
    /// A timer or thermostat button on the fan was used.
    ///
    /// The fan stops accepting app control until it is power cycled.
    AlternateControl {
        /// The unrecognized action code.
        code: u8,
        /// The action's value byte.
        value: u8,
    },
}

impl ActionReport {
    fn from_raw(code: u8, value: u8) -> Self {
        match code {
            ACTION_POWER => Self::Power(value != 0),
            ACTION_SPEED => Self::Speed(Speed::from_raw(value)),
            ACTION_DIRECTION => Self::Direction(Direction::from_raw(value)),
            _ => Self::AlternateControl { code, value },
        }
    }
}

/// A decoded notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanEvent {
    /// Full state report.
    State(StateReport),
    /// Sensor-only report.
    Sensor {
        /// Temperature reading.
        temperature: u8,
    },
    /// Single action report.
    Action(ActionReport),
}

/// Decode a notification frame.
///
/// Trailing bytes beyond the fields of a kind are ignored.
pub fn decode_frame(data: &[u8]) -> Result<FanEvent, DecodeError> {
    let kind = *data.first().ok_or(DecodeError::Empty)?;

    let required = match kind {
        KIND_STATE => 10,
        KIND_SENSOR => 5,
        KIND_ACTION => 4,
        _ => return Err(DecodeError::UnknownKind(kind)),
    };

    if data.len() < required {
        return Err(DecodeError::TooShort {
            kind,
            len: data.len(),
            required,
        });
    }

    let event = match kind {
        KIND_STATE => FanEvent::State(StateReport {
            power_on: data[3] != 0,
            speed: Speed::from_raw(data[5]),
            direction: Direction::from_raw(data[7]),
            temperature: data[9],
        }),
        KIND_SENSOR => FanEvent::Sensor {
            temperature: data[4],
        },
        _ => FanEvent::Action(ActionReport::from_raw(data[2], data[3])),
    };

    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DeviceState;
    use crate::protocol::Command;
    use crate::utils::from_hex;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_decode_state_report() {
        let frame = from_hex("0B 00 00 01 00 02 00 01 00 2A").unwrap();
        let event = decode_frame(&frame).unwrap();

        let mut state = DeviceState::default();
        state.apply(&event);

        assert_eq!(
            state,
            DeviceState {
                power_on: true,
                speed: Speed::Medium,
                direction: Direction::Forward,
                temperature: 42,
                alternate_control: false,
            }
        );
    }

    #[test]
    fn test_decode_state_report_off() {
        let frame = [0x0B, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00, 0x02, 0x00, 0x15];
        assert_eq!(
            decode_frame(&frame).unwrap(),
            FanEvent::State(StateReport {
                power_on: false,
                speed: Speed::High,
                direction: Direction::Mixed,
                temperature: 0x15,
            })
        );
    }

    #[test]
    fn test_decode_sensor_report() {
        let frame = [0x06, 0x00, 0x00, 0x00, 0x4D, 0x00];
        assert_eq!(
            decode_frame(&frame).unwrap(),
            FanEvent::Sensor { temperature: 0x4D }
        );
    }

    #[test]
    fn test_decode_actions() {
        assert_eq!(
            decode_frame(&[0x04, 0x03, 0x04, 0x01]).unwrap(),
            FanEvent::Action(ActionReport::Power(true))
        );
        assert_eq!(
            decode_frame(&[0x04, 0x03, 0x04, 0x00, 0x07]).unwrap(),
            FanEvent::Action(ActionReport::Power(false))
        );
        assert_eq!(
            decode_frame(&[0x04, 0x03, 0x08, 0x00]).unwrap(),
            FanEvent::Action(ActionReport::Direction(Direction::Reverse))
        );
        assert_eq!(
            decode_frame(&[0x04, 0x03, 0x0A, 0x02]).unwrap(),
            FanEvent::Action(ActionReport::AlternateControl {
                code: 0x0A,
                value: 0x02
            })
        );
    }

    #[test]
    fn test_set_speed_then_action_report() {
        let sent = Command::SetSpeed(Speed::Medium).frame();
        // The fan echoes the action as a kind-4 frame with the same code/value.
        let echoed = [KIND_ACTION, 0x03, sent[2], sent[3]];

        let mut state = DeviceState::default();
        state.apply(&decode_frame(&echoed).unwrap());
        assert_eq!(state.speed, Speed::Medium);
    }

    #[test]
    fn test_decode_short_frames() {
        assert_eq!(decode_frame(&[]), Err(DecodeError::Empty));
        assert_eq!(
            decode_frame(&[0x0B, 0x00, 0x00, 0x01]),
            Err(DecodeError::TooShort {
                kind: 11,
                len: 4,
                required: 10
            })
        );
        assert_eq!(
            decode_frame(&[0x06, 0x00, 0x00, 0x00]),
            Err(DecodeError::TooShort {
                kind: 6,
                len: 4,
                required: 5
            })
        );
        assert_eq!(
            decode_frame(&[0x04, 0x03, 0x07]),
            Err(DecodeError::TooShort {
                kind: 4,
                len: 3,
                required: 4
            })
        );
    }

    #[test]
    fn test_decode_unknown_kind() {
        assert_eq!(
            decode_frame(&[99, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
            Err(DecodeError::UnknownKind(99))
        );
    }

    proptest! {
        #[test]
        fn decode_never_panics(data in proptest::collection::vec(any::<u8>(), 0..24)) {
            let _ = decode_frame(&data);
        }

        #[test]
        fn action_frames_always_decode(code in any::<u8>(), value in any::<u8>()) {
            let event = decode_frame(&[KIND_ACTION, 0x03, code, value]).unwrap();
            prop_assert!(matches!(event, FanEvent::Action(_)));
        }

        #[test]
        fn state_reports_carry_temperature(temperature in any::<u8>(), tail in proptest::collection::vec(any::<u8>(), 0..4)) {
            let mut frame = vec![KIND_STATE, 0, 0, 1, 0, 1, 0, 0, 0, temperature];
            frame.extend(tail);
            match decode_frame(&frame).unwrap() {
                FanEvent::State(report) => prop_assert_eq!(report.temperature, temperature),
                other => prop_assert!(false, "unexpected event {:?}", other),
            }
        }
    }
}
