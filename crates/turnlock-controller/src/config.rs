//! Controller settings.
//!
//! All settings deserialize from TOML (or any serde format) with every field
//! optional; missing fields take the defaults below. Durations are plain
//! integers in milliseconds or seconds, as their names say.
//!
//! ```
//! use turnlock_controller::LockConfig;
//!
//! let config: LockConfig = toml::from_str(r#"
//!     max_reconciliation_depth = 3
//!
//!     [reminder]
//!     timeout_secs = 600
//!     channel = "door"
//! "#).unwrap();
//!
//! assert_eq!(config.reminder.timeout_secs, 600);
//! assert_eq!(config.key.settle_ms, 1000);
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use turnlock_core::constants::{
    DEFAULT_MOTOR_SPEED, KEY_SETTLE_MS, MAX_MOTOR_SPEED, MAX_RECONCILIATION_DEPTH,
    MAX_REMINDER_TIMEOUT_SECS, MAX_SETTLE_MS, REMINDER_TIMEOUT_SECS, THUMB_TURN_OVERSHOOT_ANGLE,
    THUMB_TURN_SETTLE_MS,
};
use turnlock_core::{Error, Result};

/// Default reminder channel.
pub const DEFAULT_REMINDER_CHANNEL: &str = "general";

/// Default text sent when the door has been open too long.
pub const DEFAULT_STILL_OPEN_MESSAGE: &str =
    "The door has been unlocked for a while. Please lock it.";

/// Default text sent when the door is closed after a reminder.
pub const DEFAULT_CLOSED_MESSAGE: &str = "The door is locked now. Thanks!";

/// Key mechanism settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeySettings {
    /// Wait between the drive command and the stop, in milliseconds.
    pub settle_ms: u64,

    /// Motor speed magnitude, 1-100.
    pub speed: i8,
}

impl Default for KeySettings {
    fn default() -> Self {
        Self {
            settle_ms: KEY_SETTLE_MS,
            speed: DEFAULT_MOTOR_SPEED,
        }
    }
}

impl KeySettings {
    /// Settle time, capped at [`MAX_SETTLE_MS`].
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms.min(MAX_SETTLE_MS))
    }
}

/// Thumbturn mechanism settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbTurnSettings {
    /// Motor angle driven to before returning to rest, in degrees.
    pub overshoot_angle: i32,

    /// Wait after each drive command, in milliseconds.
    pub settle_ms: u64,

    /// Motor speed magnitude, 1-100.
    pub speed: i8,
}

impl Default for ThumbTurnSettings {
    fn default() -> Self {
        Self {
            overshoot_angle: THUMB_TURN_OVERSHOOT_ANGLE,
            settle_ms: THUMB_TURN_SETTLE_MS,
            speed: DEFAULT_MOTOR_SPEED,
        }
    }
}

impl ThumbTurnSettings {
    /// Settle time of each leg, capped at [`MAX_SETTLE_MS`].
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms.min(MAX_SETTLE_MS))
    }
}

/// Open-door reminder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    /// How long the door may stay open before the reminder, in seconds.
    pub timeout_secs: u64,

    /// Channel the reminders are posted to.
    pub channel: String,

    /// Text of the reminder.
    pub still_open_message: String,

    /// Text sent when the door is closed after a reminder.
    pub closed_message: String,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            timeout_secs: REMINDER_TIMEOUT_SECS,
            channel: DEFAULT_REMINDER_CHANNEL.to_string(),
            still_open_message: DEFAULT_STILL_OPEN_MESSAGE.to_string(),
            closed_message: DEFAULT_CLOSED_MESSAGE.to_string(),
        }
    }
}

impl ReminderSettings {
    /// Reminder timeout, capped at [`MAX_REMINDER_TIMEOUT_SECS`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.min(MAX_REMINDER_TIMEOUT_SECS))
    }
}

/// Complete controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    pub key: KeySettings,
    pub thumb_turn: ThumbTurnSettings,
    pub reminder: ReminderSettings,

    /// Rechecks allowed per sensor change before giving up.
    pub max_reconciliation_depth: usize,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            key: KeySettings::default(),
            thumb_turn: ThumbTurnSettings::default(),
            reminder: ReminderSettings::default(),
            max_reconciliation_depth: MAX_RECONCILIATION_DEPTH,
        }
    }
}

impl LockConfig {
    /// Check that every value can be used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        validate_speed("key.speed", self.key.speed)?;
        validate_speed("thumb_turn.speed", self.thumb_turn.speed)?;
        validate_max("key.settle_ms", self.key.settle_ms, MAX_SETTLE_MS)?;
        validate_max("thumb_turn.settle_ms", self.thumb_turn.settle_ms, MAX_SETTLE_MS)?;
        validate_max(
            "reminder.timeout_secs",
            self.reminder.timeout_secs,
            MAX_REMINDER_TIMEOUT_SECS,
        )?;

        if self.thumb_turn.overshoot_angle <= 0 {
            return Err(Error::Config(format!(
                "thumb_turn.overshoot_angle must be positive, got {}",
                self.thumb_turn.overshoot_angle
            )));
        }
        if self.reminder.channel.trim().is_empty() {
            return Err(Error::Config("reminder.channel must not be empty".to_string()));
        }
        Ok(())
    }
}

fn validate_speed(field: &str, speed: i8) -> Result<()> {
    if speed <= 0 || speed > MAX_MOTOR_SPEED {
        return Err(Error::Config(format!(
            "{field} must be between 1 and {MAX_MOTOR_SPEED}, got {speed}"
        )));
    }
    Ok(())
}

fn validate_max(field: &str, value: u64, max: u64) -> Result<()> {
    if value > max {
        return Err(Error::Config(format!("{field} must be at most {max}, got {value}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = LockConfig::default();

        assert_eq!(config.key.settle(), Duration::from_secs(1));
        assert_eq!(config.key.speed, 100);
        assert_eq!(config.thumb_turn.overshoot_angle, 1200);
        assert_eq!(config.thumb_turn.settle(), Duration::from_millis(1500));
        assert_eq!(config.reminder.timeout(), Duration::from_secs(300));
        assert_eq!(config.reminder.channel, "general");
        assert_eq!(config.max_reconciliation_depth, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: LockConfig = toml::from_str("").unwrap();
        assert_eq!(config, LockConfig::default());
    }

    #[test]
    fn test_partial_section() {
        let config: LockConfig = toml::from_str(
            r#"
            [thumb_turn]
            settle_ms = 2000
            "#,
        )
        .unwrap();

        assert_eq!(config.thumb_turn.settle_ms, 2000);
        assert_eq!(config.thumb_turn.overshoot_angle, 1200);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = LockConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: LockConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[rstest]
    #[case(0)]
    #[case(-20)]
    fn test_invalid_speed(#[case] speed: i8) {
        let mut config = LockConfig::default();
        config.key.speed = speed;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_overshoot() {
        let mut config = LockConfig::default();
        config.thumb_turn.overshoot_angle = 0;
        assert!(config.validate().is_err());
    }

    #[rstest]
    #[case::key_settle(|c: &mut LockConfig| c.key.settle_ms = MAX_SETTLE_MS + 1)]
    #[case::thumb_turn_settle(|c: &mut LockConfig| c.thumb_turn.settle_ms = u64::MAX)]
    #[case::reminder_timeout(|c: &mut LockConfig| c.reminder.timeout_secs = u64::MAX)]
    fn test_out_of_range_duration(#[case] tweak: fn(&mut LockConfig)) {
        let mut config = LockConfig::default();
        tweak(&mut config);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_durations_are_capped() {
        let mut config = LockConfig::default();
        config.key.settle_ms = u64::MAX;
        config.thumb_turn.settle_ms = u64::MAX;
        config.reminder.timeout_secs = u64::MAX;

        assert_eq!(config.key.settle(), Duration::from_millis(MAX_SETTLE_MS));
        assert_eq!(config.thumb_turn.settle(), Duration::from_millis(MAX_SETTLE_MS));
        assert_eq!(
            config.reminder.timeout(),
            Duration::from_secs(MAX_REMINDER_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_blank_channel() {
        let mut config = LockConfig::default();
        config.reminder.channel = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
