//! Common types shared across hub implementations.
//!
//! This module defines the hub's motor ports, its indicator light palette,
//! the sensor-change events it reports, and generic device metadata.

use serde::{Deserialize, Serialize};
use std::fmt;
use turnlock_core::Color;

/// Generic device information.
///
/// Contains metadata about a hub such as name, model, and firmware version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "Move Hub", "Mock Hub").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// Optional firmware version string.
    pub firmware_version: Option<String>,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            firmware_version: None,
        }
    }

    /// Set the firmware version.
    pub fn with_firmware_version(mut self, firmware_version: impl Into<String>) -> Self {
        self.firmware_version = Some(firmware_version.into());
        self
    }
}

/// Motor port on the hub.
///
/// The key motor and the thumbturn motor each have a built-in rotation
/// encoder; the key encoder doubles as the key position sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorPort {
    /// Motor turning the key.
    Key,

    /// Motor turning the thumbturn.
    ThumbTurn,
}

impl fmt::Display for MotorPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key => write!(f, "key"),
            Self::ThumbTurn => write!(f, "thumb turn"),
        }
    }
}

/// Sensor change reported by the hub.
///
/// Every event carries the previous and the new reading so that consumers
/// can detect edges without keeping their own copy of the last value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SensorEvent {
    /// The key motor encoder moved.
    KeyAngleChanged { old: i32, new: i32 },

    /// The thumbturn motor encoder moved.
    ThumbTurnAngleChanged { old: i32, new: i32 },

    /// The color seen on the thumbturn changed.
    ColorChanged { old: Color, new: Color },
}

/// Hub indicator light colors.
///
/// This is the fixed palette of the hub's RGB light; it cannot show
/// arbitrary colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedColor {
    /// LED off.
    Off,

    /// Pink LED.
    Pink,

    /// Purple LED.
    Purple,

    /// Blue LED, the hub's color at power-on.
    #[default]
    Blue,

    /// Light blue LED.
    LightBlue,

    /// Cyan LED.
    Cyan,

    /// Green LED.
    Green,

    /// Yellow LED.
    Yellow,

    /// Orange LED.
    Orange,

    /// Red LED.
    Red,

    /// White LED.
    White,
}

impl LedColor {
    /// Every color of the palette, in hub index order.
    pub const ALL: [LedColor; 11] = [
        Self::Off,
        Self::Pink,
        Self::Purple,
        Self::Blue,
        Self::LightBlue,
        Self::Cyan,
        Self::Green,
        Self::Yellow,
        Self::Orange,
        Self::Red,
        Self::White,
    ];

    /// Palette index used by the hub's light port.
    pub fn index(&self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Pink => 1,
            Self::Purple => 2,
            Self::Blue => 3,
            Self::LightBlue => 4,
            Self::Cyan => 5,
            Self::Green => 6,
            Self::Yellow => 7,
            Self::Orange => 8,
            Self::Red => 9,
            Self::White => 10,
        }
    }

    /// Upper-case name of the color.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Pink => "PINK",
            Self::Purple => "PURPLE",
            Self::Blue => "BLUE",
            Self::LightBlue => "LIGHT_BLUE",
            Self::Cyan => "CYAN",
            Self::Green => "GREEN",
            Self::Yellow => "YELLOW",
            Self::Orange => "ORANGE",
            Self::Red => "RED",
            Self::White => "WHITE",
        }
    }
}

impl fmt::Display for LedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for LedColor {
    type Err = crate::HardwareError;

    fn from_str(s: &str) -> crate::Result<Self> {
        let name = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|color| color.name() == name)
            .ok_or_else(|| crate::HardwareError::invalid_data(format!("Unknown LED color: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_device_info_builder() {
        let info = DeviceInfo::new("Move Hub", "LEGO Boost")
            .with_firmware_version("v2.0.00.0017");

        assert_eq!(info.name, "Move Hub");
        assert_eq!(info.model, "LEGO Boost");
        assert_eq!(info.firmware_version, Some("v2.0.00.0017".to_string()));
    }

    #[test]
    fn test_device_info_minimal() {
        let info = DeviceInfo::new("Mock Hub", "Mock");

        assert_eq!(info.firmware_version, None);
    }

    #[rstest]
    #[case("BLUE", LedColor::Blue)]
    #[case("red", LedColor::Red)]
    #[case("light_blue", LedColor::LightBlue)]
    #[case("Light-Blue", LedColor::LightBlue)]
    #[case(" off ", LedColor::Off)]
    fn test_led_color_parse(#[case] input: &str, #[case] expected: LedColor) {
        assert_eq!(input.parse::<LedColor>().unwrap(), expected);
    }

    #[test]
    fn test_led_color_parse_unknown() {
        assert!("MAUVE".parse::<LedColor>().is_err());
    }

    #[test]
    fn test_led_color_indices_are_palette_order() {
        for (i, color) in LedColor::ALL.iter().enumerate() {
            assert_eq!(color.index() as usize, i);
        }
    }

    #[test]
    fn test_led_color_default_is_blue() {
        assert_eq!(LedColor::default(), LedColor::Blue);
    }

    #[test]
    fn test_led_color_serialization() {
        let json = serde_json::to_string(&LedColor::LightBlue).unwrap();
        assert_eq!(json, "\"LIGHT_BLUE\"");
        let deserialized: LedColor = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, LedColor::LightBlue);
    }

    #[test]
    fn test_motor_port_display() {
        assert_eq!(MotorPort::Key.to_string(), "key");
        assert_eq!(MotorPort::ThumbTurn.to_string(), "thumb turn");
    }
}
