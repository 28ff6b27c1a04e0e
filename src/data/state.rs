//! Fan state data structures.
//!
//! Contains the speed and direction settings and the last-known state
//! of a fan.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::protocol::{ActionReport, FanEvent};

/// Fan speed level as stored by the fan firmware.
///
/// The firmware keeps the level across power cycles, so a fan that is
/// off still has a speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Speed {
    /// Speed 1.
    #[default]
    Low,
    /// Speed 2.
    Medium,
    /// Speed 3.
    High,
}

impl Speed {
    /// Create from the ordinal reported by the fan.
    ///
    /// Anything other than 1 or 2 is treated as high.
    pub fn from_raw(value: u8) -> Self {
        match value {
            1 => Self::Low,
            2 => Self::Medium,
            _ => Self::High,
        }
    }

    /// Convert to the wire ordinal.
    pub fn to_raw(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Speed {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(Error::InvalidParameter {
                name: "speed".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Airflow direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Direction 0.
    #[default]
    Reverse,
    /// Direction 1.
    Forward,
    /// Direction 2, alternating between forward and reverse.
    Mixed,
}

impl Direction {
    /// Create from the ordinal reported by the fan.
    ///
    /// Anything other than 0 or 1 is treated as mixed.
    pub fn from_raw(value: u8) -> Self {
        match value {
            0 => Self::Reverse,
            1 => Self::Forward,
            _ => Self::Mixed,
        }
    }

    /// Convert to the wire ordinal.
    pub fn to_raw(&self) -> u8 {
        match self {
            Self::Reverse => 0,
            Self::Forward => 1,
            Self::Mixed => 2,
        }
    }

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reverse => "reverse",
            Self::Forward => "forward",
            Self::Mixed => "mixed",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reverse" => Ok(Self::Reverse),
            "forward" => Ok(Self::Forward),
            "mixed" => Ok(Self::Mixed),
            _ => Err(Error::InvalidParameter {
                name: "direction".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Speed as presented to callers, where a powered-off fan reads as `Off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FanSpeed {
    /// The fan is powered off.
    #[default]
    Off,
    /// Running at low speed.
    Low,
    /// Running at medium speed.
    Medium,
    /// Running at high speed.
    High,
}

impl FanSpeed {
    /// Every selectable speed, in the order a speed picker lists them.
    pub const ALL: [FanSpeed; 4] = [Self::Off, Self::Low, Self::Medium, Self::High];

    /// The fan level, or `None` for `Off`.
    pub fn level(&self) -> Option<Speed> {
        match self {
            Self::Off => None,
            Self::Low => Some(Speed::Low),
            Self::Medium => Some(Speed::Medium),
            Self::High => Some(Speed::High),
        }
    }

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl From<Speed> for FanSpeed {
    fn from(speed: Speed) -> Self {
        match speed {
            Speed::Low => Self::Low,
            Speed::Medium => Self::Medium,
            Speed::High => Self::High,
        }
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FanSpeed {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("off") {
            return Ok(Self::Off);
        }
        s.parse::<Speed>().map(Self::from)
    }
}

/// Last-known state of a fan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceState {
    /// Whether the fan is running.
    pub power_on: bool,
    /// Stored speed level. Kept while the fan is off.
    pub speed: Speed,
    /// Stored airflow direction. Kept while the fan is off.
    pub direction: Direction,
    /// Temperature reading from the fan's sensor.
    pub temperature: u8,
    /// A timer or thermostat button was pressed on the fan itself.
    ///
    /// The fan ignores app control until it is power cycled.
    pub alternate_control: bool,
}

impl DeviceState {
    /// Speed as callers should see it: `Off` whenever the fan is not running.
    pub fn reported_speed(&self) -> FanSpeed {
        if self.power_on {
            self.speed.into()
        } else {
            FanSpeed::Off
        }
    }

    /// Apply a decoded notification.
    pub fn apply(&mut self, event: &FanEvent) {
        match event {
            FanEvent::State(report) => {
                self.power_on = report.power_on;
                self.speed = report.speed;
                self.direction = report.direction;
                self.temperature = report.temperature;
                if !report.power_on {
                    self.alternate_control = false;
                }
            }
            FanEvent::Sensor { temperature } => {
                self.temperature = *temperature;
            }
            FanEvent::Action(action) => match *action {
                ActionReport::Power(on) => {
                    self.power_on = on;
                    if !on {
                        self.alternate_control = false;
                    }
                }
                ActionReport::Speed(speed) => self.speed = speed,
                ActionReport::Direction(direction) => self.direction = direction,
                ActionReport::AlternateControl { .. } => self.alternate_control = true,
            },
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "power_on {} speed {} direction {} temp {}",
            self.power_on, self.speed, self.direction, self.temperature
        )
    }
}
