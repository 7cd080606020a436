//! Error types for lock control.

use std::fmt;
use thiserror::Error;
use turnlock_core::LockStatus;
use turnlock_hardware::HardwareError;

/// Result type alias for lock control operations.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Sensor whose change started a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// The key angle changed.
    KeyAngle,

    /// The thumbturn color changed.
    Color,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyAngle => write!(f, "key angle"),
            Self::Color => write!(f, "color"),
        }
    }
}

/// Errors that can occur while controlling the lock.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The hub failed or is gone.
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    /// Invalid configuration.
    #[error(transparent)]
    Core(#[from] turnlock_core::Error),

    /// A controller or scheduler task is no longer running.
    #[error("Controller stopped")]
    ControllerStopped,

    /// The two mechanisms kept disagreeing after every allowed recheck.
    #[error("Mechanisms failed to converge after {attempts} rechecks ({trigger} trigger)")]
    NotConverged { trigger: Trigger, attempts: usize },

    /// The requested status cannot be driven to.
    #[error("Invalid target status: {0}")]
    InvalidTarget(LockStatus),

    /// The lock status could not be determined.
    #[error("Unknown status")]
    UnknownStatus,
}
