//! Mechanical constants for the key and thumbturn mechanisms.
//!
//! These values describe the physical lock assembly: where the key motor sits
//! when the lock is open or closed, how far the thumbturn motor has to throw
//! to move the bolt, and how long each motion needs before the motor can be
//! stopped. The hub offers no "motion complete" notification, so every motor
//! sequence is a timed pulse built from these constants.
//!
//! # Usage
//!
//! ```
//! use turnlock_core::constants::*;
//!
//! // The key counts as open anywhere strictly inside OPEN_ANGLE ± EPS.
//! let open_range = (KEY_OPEN_ANGLE - KEY_EPS_ANGLE)..(KEY_OPEN_ANGLE + KEY_EPS_ANGLE);
//! assert!(open_range.contains(&-50));
//!
//! use std::time::Duration;
//! let settle = Duration::from_millis(KEY_SETTLE_MS);
//! assert_eq!(settle, Duration::from_secs(1));
//! ```

// ============================================================================
// Key Mechanism
// ============================================================================

/// Key motor angle, in degrees, at which the lock is open.
pub const KEY_OPEN_ANGLE: i32 = -50;

/// Key motor angle, in degrees, at which the lock is closed.
pub const KEY_CLOSED_ANGLE: i32 = 0;

/// Tolerance around a key target angle, in degrees.
///
/// A reading counts as "at" a target only when it lies strictly inside
/// `target ± KEY_EPS_ANGLE`.
pub const KEY_EPS_ANGLE: i32 = 15;

/// Time to let the key motor run before stopping it, in milliseconds.
pub const KEY_SETTLE_MS: u64 = 1_000;

// ============================================================================
// Thumbturn Mechanism
// ============================================================================

/// Thumbturn motor overshoot used to throw the bolt, in degrees.
///
/// Opening drives to `+THUMB_TURN_OVERSHOOT_ANGLE`, closing drives to
/// `-THUMB_TURN_OVERSHOOT_ANGLE`; both return to 0 afterwards.
pub const THUMB_TURN_OVERSHOOT_ANGLE: i32 = 1_200;

/// Thumbturn motor rest angle between motions, in degrees.
pub const THUMB_TURN_REST_ANGLE: i32 = 0;

/// Time allowed for each leg of a thumbturn motion, in milliseconds.
pub const THUMB_TURN_SETTLE_MS: u64 = 1_500;

/// Longest accepted settle time for either mechanism, in milliseconds.
pub const MAX_SETTLE_MS: u64 = 60_000;

// ============================================================================
// Motors
// ============================================================================

/// Default motor speed, as a percentage of full power.
pub const DEFAULT_MOTOR_SPEED: i8 = 100;

/// Maximum absolute motor speed accepted by the hub.
pub const MAX_MOTOR_SPEED: i8 = 100;

// ============================================================================
// Reminder
// ============================================================================

/// Time the lock may stay open before a reminder is sent, in seconds.
pub const REMINDER_TIMEOUT_SECS: u64 = 5 * 60;

/// Longest accepted reminder timeout, in seconds (one week).
pub const MAX_REMINDER_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

// ============================================================================
// Reconciliation
// ============================================================================

/// Maximum number of rechecks a single sensor event may trigger before the
/// mechanisms are reported as not converging.
pub const MAX_RECONCILIATION_DEPTH: usize = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_targets_do_not_overlap() {
        // The open and closed tolerance windows must be disjoint.
        assert!(KEY_OPEN_ANGLE + KEY_EPS_ANGLE <= KEY_CLOSED_ANGLE - KEY_EPS_ANGLE);
    }

    #[test]
    fn test_motor_speed_bounds() {
        assert!(DEFAULT_MOTOR_SPEED <= MAX_MOTOR_SPEED);
        assert!(DEFAULT_MOTOR_SPEED > 0);
    }

    #[test]
    fn test_reminder_timeout_is_five_minutes() {
        assert_eq!(REMINDER_TIMEOUT_SECS, 300);
        assert!(REMINDER_TIMEOUT_SECS <= MAX_REMINDER_TIMEOUT_SECS);
    }

    #[test]
    fn test_settle_bounds() {
        assert!(KEY_SETTLE_MS <= MAX_SETTLE_MS);
        assert!(THUMB_TURN_SETTLE_MS <= MAX_SETTLE_MS);
    }
}
