//! Lock control for turnlock.
//!
//! This crate keeps the key and the thumbturn of a door lock in agreement.
//! It provides:
//!
//! - **Controllers**: one actor per mechanism, owning its `working` flag and
//!   sequencing its timed motor pulses ([`Controller`], [`KeyMechanism`],
//!   [`ThumbTurnMechanism`])
//! - **Reconciliation**: the sensor-event pump that drives each mechanism
//!   toward the status the other one shows ([`ReconciliationRouter`])
//! - **Reminder**: the edge-triggered open-door timer ([`ReminderScheduler`])
//! - **Coordinator**: the single object a front end talks to
//!   ([`LockCoordinator`])
//!
//! All timing uses the tokio clock, so every sequence can be tested on a
//! paused runtime.

pub mod config;
pub mod controller;
pub mod coordinator;
pub mod error;
pub mod key;
pub mod reminder;
pub mod router;
pub mod thumb_turn;

pub use config::{KeySettings, LockConfig, ReminderSettings, ThumbTurnSettings};
pub use controller::{Controller, ControllerState, Mechanism, TurnOutcome};
pub use coordinator::{LockCoordinator, LockSnapshot};
pub use error::{ControlError, Result, Trigger};
pub use key::KeyMechanism;
pub use reminder::{ReminderScheduler, ReminderState};
pub use router::{Reconciliation, ReconciliationRouter, ReconciliationStats};
pub use thumb_turn::ThumbTurnMechanism;
