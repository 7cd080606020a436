use crate::{
    Result,
    constants::{KEY_CLOSED_ANGLE, KEY_EPS_ANGLE, KEY_OPEN_ANGLE},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical state of a mechanism, derived from its latest sensor reading.
///
/// `Unknown` is a regular value: it means the reading does not correspond to
/// any known target position (mid-motion, hand-turned halfway, sensor noise).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LockStatus {
    Open,
    Closed,
    Unknown,
}

impl LockStatus {
    /// Derive the key mechanism status from a key motor angle.
    ///
    /// The key is open strictly inside `KEY_OPEN_ANGLE ± KEY_EPS_ANGLE` and
    /// closed strictly inside `KEY_CLOSED_ANGLE ± KEY_EPS_ANGLE`.
    ///
    /// # Examples
    ///
    /// ```
    /// use turnlock_core::LockStatus;
    ///
    /// assert_eq!(LockStatus::from_key_angle(-50), LockStatus::Open);
    /// assert_eq!(LockStatus::from_key_angle(3), LockStatus::Closed);
    /// assert_eq!(LockStatus::from_key_angle(-25), LockStatus::Unknown);
    /// assert_eq!(LockStatus::from_key_angle(15), LockStatus::Unknown);
    /// ```
    #[must_use]
    pub fn from_key_angle(angle: i32) -> Self {
        if within(angle, KEY_OPEN_ANGLE) {
            LockStatus::Open
        } else if within(angle, KEY_CLOSED_ANGLE) {
            LockStatus::Closed
        } else {
            LockStatus::Unknown
        }
    }

    /// Derive the thumbturn status from the color sensor reading.
    ///
    /// ```
    /// use turnlock_core::{Color, LockStatus};
    ///
    /// assert_eq!(LockStatus::from_color(Color::Blue), LockStatus::Closed);
    /// assert_eq!(LockStatus::from_color(Color::Red), LockStatus::Open);
    /// assert_eq!(LockStatus::from_color(Color::Other), LockStatus::Unknown);
    /// ```
    #[must_use]
    pub fn from_color(color: Color) -> Self {
        match color {
            Color::Blue => LockStatus::Closed,
            Color::Red => LockStatus::Open,
            Color::Other => LockStatus::Unknown,
        }
    }

    /// Key motor angle that realizes this status, if any.
    #[must_use]
    pub fn key_target_angle(&self) -> Option<i32> {
        match self {
            LockStatus::Open => Some(KEY_OPEN_ANGLE),
            LockStatus::Closed => Some(KEY_CLOSED_ANGLE),
            LockStatus::Unknown => None,
        }
    }

    /// Color the thumbturn shows in this status, if any.
    #[must_use]
    pub fn color(&self) -> Option<Color> {
        match self {
            LockStatus::Open => Some(Color::Red),
            LockStatus::Closed => Some(Color::Blue),
            LockStatus::Unknown => None,
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, LockStatus::Unknown)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LockStatus::Open => "OPEN",
            LockStatus::Closed => "CLOSED",
            LockStatus::Unknown => "UNKNOWN",
        }
    }
}

fn within(angle: i32, target: i32) -> bool {
    angle > target - KEY_EPS_ANGLE && angle < target + KEY_EPS_ANGLE
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LockStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(LockStatus::Open),
            "CLOSED" => Ok(LockStatus::Closed),
            "UNKNOWN" => Ok(LockStatus::Unknown),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// Reading of the color sensor facing the thumbturn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Color {
    Blue,
    Red,
    /// Anything that is neither blue nor red, including "no color".
    Other,
}

impl Color {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Blue => "BLUE",
            Color::Red => "RED",
            Color::Other => "OTHER",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a color name as reported by the sensor.
///
/// Any non-empty name other than blue or red is a valid reading of
/// [`Color::Other`]; only blank input is rejected.
impl std::str::FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        if name.is_empty() {
            return Err(Error::InvalidColor("empty color name".to_string()));
        }

        Ok(match name.to_ascii_uppercase().as_str() {
            "BLUE" => Color::Blue,
            "RED" => Color::Red,
            _ => Color::Other,
        })
    }
}

/// An OPEN/CLOSED edge on the thumbturn status.
///
/// Only transitions into or out of `Closed` are edges; everything else
/// (OPEN ↔ UNKNOWN, repeated readings) is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusEdge {
    /// The lock left the closed state.
    Opened,
    /// The lock entered the closed state.
    Closed,
}

impl StatusEdge {
    /// Classify a status transition.
    ///
    /// ```
    /// use turnlock_core::{LockStatus, StatusEdge};
    ///
    /// assert_eq!(
    ///     StatusEdge::between(LockStatus::Closed, LockStatus::Unknown),
    ///     Some(StatusEdge::Opened)
    /// );
    /// assert_eq!(
    ///     StatusEdge::between(LockStatus::Open, LockStatus::Closed),
    ///     Some(StatusEdge::Closed)
    /// );
    /// assert_eq!(StatusEdge::between(LockStatus::Open, LockStatus::Unknown), None);
    /// ```
    #[must_use]
    pub fn between(old: LockStatus, new: LockStatus) -> Option<Self> {
        match (old, new) {
            (LockStatus::Closed, new) if new != LockStatus::Closed => Some(StatusEdge::Opened),
            (old, LockStatus::Closed) if old != LockStatus::Closed => Some(StatusEdge::Closed),
            _ => None,
        }
    }
}

impl fmt::Display for StatusEdge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StatusEdge::Opened => write!(f, "opened"),
            StatusEdge::Closed => write!(f, "closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(-50, LockStatus::Open)]
    #[case(-64, LockStatus::Open)]
    #[case(-36, LockStatus::Open)]
    #[case(-65, LockStatus::Unknown)]
    #[case(-35, LockStatus::Unknown)]
    #[case(0, LockStatus::Closed)]
    #[case(14, LockStatus::Closed)]
    #[case(-14, LockStatus::Closed)]
    #[case(15, LockStatus::Unknown)]
    #[case(-15, LockStatus::Unknown)]
    #[case(-25, LockStatus::Unknown)]
    #[case(90, LockStatus::Unknown)]
    fn test_key_status_boundaries(#[case] angle: i32, #[case] expected: LockStatus) {
        assert_eq!(LockStatus::from_key_angle(angle), expected);
    }

    #[test]
    fn test_key_target_angles_derive_back() {
        for status in [LockStatus::Open, LockStatus::Closed] {
            let angle = status.key_target_angle().unwrap();
            assert_eq!(LockStatus::from_key_angle(angle), status);
        }
        assert_eq!(LockStatus::Unknown.key_target_angle(), None);
    }

    #[test]
    fn test_status_color_matches_derivation() {
        for status in [LockStatus::Open, LockStatus::Closed] {
            let color = status.color().unwrap();
            assert_eq!(LockStatus::from_color(color), status);
        }
        assert_eq!(LockStatus::Unknown.color(), None);
    }

    #[rstest]
    #[case("OPEN", LockStatus::Open)]
    #[case("closed", LockStatus::Closed)]
    #[case(" Unknown ", LockStatus::Unknown)]
    fn test_status_parse(#[case] input: &str, #[case] expected: LockStatus) {
        assert_eq!(input.parse::<LockStatus>().unwrap(), expected);
    }

    #[test]
    fn test_status_parse_invalid() {
        let result: Result<LockStatus> = "AJAR".parse();
        assert_eq!(result, Err(Error::InvalidStatus("AJAR".to_string())));
    }

    #[rstest]
    #[case("BLUE", Color::Blue)]
    #[case("red", Color::Red)]
    #[case("GREEN", Color::Other)]
    #[case("NONE", Color::Other)]
    fn test_color_parse(#[case] input: &str, #[case] expected: Color) {
        assert_eq!(input.parse::<Color>().unwrap(), expected);
    }

    #[test]
    fn test_color_parse_blank() {
        assert!("  ".parse::<Color>().is_err());
    }

    #[test]
    fn test_status_display_round_trips_through_parse() {
        for status in [LockStatus::Open, LockStatus::Closed, LockStatus::Unknown] {
            assert_eq!(status.to_string().parse::<LockStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&LockStatus::Closed).unwrap();
        assert_eq!(json, "\"CLOSED\"");
        let color: Color = serde_json::from_str("\"RED\"").unwrap();
        assert_eq!(color, Color::Red);
    }

    #[rstest]
    #[case(LockStatus::Closed, LockStatus::Open, Some(StatusEdge::Opened))]
    #[case(LockStatus::Closed, LockStatus::Unknown, Some(StatusEdge::Opened))]
    #[case(LockStatus::Open, LockStatus::Closed, Some(StatusEdge::Closed))]
    #[case(LockStatus::Unknown, LockStatus::Closed, Some(StatusEdge::Closed))]
    #[case(LockStatus::Open, LockStatus::Unknown, None)]
    #[case(LockStatus::Unknown, LockStatus::Open, None)]
    #[case(LockStatus::Closed, LockStatus::Closed, None)]
    #[case(LockStatus::Open, LockStatus::Open, None)]
    fn test_status_edges(
        #[case] old: LockStatus,
        #[case] new: LockStatus,
        #[case] expected: Option<StatusEdge>,
    ) {
        assert_eq!(StatusEdge::between(old, new), expected);
    }
}
