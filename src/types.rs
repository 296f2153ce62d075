//! Physical output identifiers shared by sessions and the output service

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DisplayError;

/// Physical video output a session renders to
///
/// The discriminants are the firmware display identifiers and are
/// stable across process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i32)]
pub enum DisplayTarget {
    /// Integrated LCD panel
    Lcd = 4,
    /// External HDMI monitor
    #[default]
    Hdmi = 5,
}

impl DisplayTarget {
    /// All known outputs, in firmware identifier order
    pub const ALL: [DisplayTarget; 2] = [DisplayTarget::Lcd, DisplayTarget::Hdmi];

    /// Firmware display identifier
    pub fn id(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for DisplayTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayTarget::Lcd => write!(f, "LCD"),
            DisplayTarget::Hdmi => write!(f, "HDMI"),
        }
    }
}

impl TryFrom<i32> for DisplayTarget {
    type Error = DisplayError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(DisplayTarget::Lcd),
            5 => Ok(DisplayTarget::Hdmi),
            other => Err(DisplayError::invalid_value("display target", other.to_string())),
        }
    }
}

impl FromStr for DisplayTarget {
    type Err = DisplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("lcd") {
            Ok(DisplayTarget::Lcd)
        } else if s.eq_ignore_ascii_case("hdmi") {
            Ok(DisplayTarget::Hdmi)
        } else {
            Err(DisplayError::invalid_value("display target", s))
        }
    }
}

/// Output power/signal state as reported by the hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerState {
    /// Output is driving a signal
    On,
    /// Output power and signal are disabled
    Off,
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerState::On => write!(f, "on"),
            PowerState::Off => write!(f, "off"),
        }
    }
}
