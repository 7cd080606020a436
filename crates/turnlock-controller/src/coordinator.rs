//! Process-wide lock coordinator.
//!
//! [`LockCoordinator`] is built once at startup. It starts the hub actor,
//! both controllers, the reminder scheduler and the reconciliation pump, and
//! exposes the control surface used by front ends: query the status, request
//! OPEN or CLOSED, and read or set the indicator light.
//!
//! # Examples
//!
//! ```no_run
//! use turnlock_controller::{LockConfig, LockCoordinator};
//! use turnlock_core::LockStatus;
//! use turnlock_hardware::mock::MockHub;
//! use turnlock_notify::{AnyMessenger, LogMessenger};
//!
//! #[tokio::main]
//! async fn main() -> turnlock_controller::Result<()> {
//!     let (hub, _handle) = MockHub::coupled();
//!     let lock = LockCoordinator::start(
//!         hub.into(),
//!         AnyMessenger::from(LogMessenger::new()),
//!         LockConfig::default(),
//!     )?;
//!
//!     lock.set_status(LockStatus::Open).await?;
//!     println!("Lock is {}", lock.require_known_status().await?);
//!
//!     lock.shutdown().await
//! }
//! ```

use crate::config::LockConfig;
use crate::controller::{Controller, ControllerState, TurnOutcome};
use crate::error::{ControlError, Result};
use crate::key::KeyMechanism;
use crate::reminder::{ReminderScheduler, ReminderState};
use crate::router::{ReconciliationRouter, ReconciliationStats};
use crate::thumb_turn::ThumbTurnMechanism;
use std::fmt;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use turnlock_core::LockStatus;
use turnlock_hardware::{AnyHubDevice, HubConfig, HubHandle, HubManager, LedColor};
use turnlock_notify::AnyMessenger;

/// Point-in-time view of the whole lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSnapshot {
    /// Lock status, as shown by the thumbturn.
    pub status: LockStatus,

    /// Status derived from the key angle.
    pub key_status: LockStatus,

    pub key: ControllerState,
    pub thumb_turn: ControllerState,
    pub reminder: ReminderState,
    pub led: LedColor,
    pub reconciliation: ReconciliationStats,
}

fn describe(state: &ControllerState) -> String {
    match state.remaining() {
        Some(remaining) if state.working => format!("working ({}ms left)", remaining.as_millis()),
        _ => "idle".to_string(),
    }
}

impl fmt::Display for LockSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "status:     {}", self.status)?;
        writeln!(f, "key:        {} [{}]", self.key_status, describe(&self.key))?;
        writeln!(f, "thumb turn: {} [{}]", self.status, describe(&self.thumb_turn))?;
        match self.reminder {
            ReminderState::Idle => writeln!(f, "reminder:   idle")?,
            ReminderState::Armed { opened_at, .. } => {
                writeln!(f, "reminder:   armed (open since {opened_at})")?
            }
            ReminderState::Notified { opened_at } => {
                writeln!(f, "reminder:   sent (open since {opened_at})")?
            }
        }
        writeln!(f, "led:        {}", self.led)?;
        write!(
            f,
            "reconciled: {} settled, {} dropped, {} deferred, {} failed (max {} rechecks)",
            self.reconciliation.settled,
            self.reconciliation.dropped,
            self.reconciliation.deferred,
            self.reconciliation.failed,
            self.reconciliation.max_rechecks
        )
    }
}

/// Owns every actor of the lock.
#[derive(Debug)]
pub struct LockCoordinator {
    hub: HubHandle,
    key: Controller,
    thumb_turn: Controller,
    reminder: ReminderScheduler,
    router: ReconciliationRouter,
    pump: JoinHandle<()>,
}

impl LockCoordinator {
    /// Start every actor on the current runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid or the hub cannot be started.
    pub fn start(device: AnyHubDevice, messenger: AnyMessenger, config: LockConfig) -> Result<Self> {
        config.validate()?;

        let mut manager = HubManager::new(HubConfig::default());
        manager.register_hub(device);
        let (hub, events) = manager.start()?;

        let key = Controller::spawn(KeyMechanism::new(config.key), hub.clone());
        let thumb_turn = Controller::spawn(ThumbTurnMechanism::new(config.thumb_turn), hub.clone());
        let reminder = ReminderScheduler::spawn(config.reminder, messenger);
        let router = ReconciliationRouter::new(
            key.clone(),
            thumb_turn.clone(),
            reminder.clone(),
            hub.clone(),
            config.max_reconciliation_depth,
        );
        let pump = tokio::spawn(router.clone().run(events));

        info!("Lock coordinator started");
        Ok(Self {
            hub,
            key,
            thumb_turn,
            reminder,
            router,
            pump,
        })
    }

    /// Lock status, as shown by the thumbturn.
    pub async fn status(&self) -> Result<LockStatus> {
        self.thumb_turn.status().await
    }

    /// Lock status, failing when it cannot be determined.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::UnknownStatus`] when the thumbturn is neither
    /// open nor closed.
    pub async fn require_known_status(&self) -> Result<LockStatus> {
        match self.status().await? {
            LockStatus::Unknown => Err(ControlError::UnknownStatus),
            status => Ok(status),
        }
    }

    /// Drive the lock to `target`.
    ///
    /// The thumbturn moves first; once its sequence completes, the key is
    /// turned to match. Nothing is sent when the thumbturn already shows
    /// `target`. Returns the thumbturn's outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::InvalidTarget`] for `UNKNOWN`, or any
    /// controller or hub error.
    pub async fn set_status(&self, target: LockStatus) -> Result<TurnOutcome> {
        if !target.is_known() {
            return Err(ControlError::InvalidTarget(target));
        }

        let outcome = self.thumb_turn.turn(target).await?;
        info!(%target, %outcome, "Thumb turn request handled");

        if outcome == TurnOutcome::Completed {
            let key_outcome = self.key.turn(target).await?;
            debug!(%target, outcome = %key_outcome, "Key followed thumb turn");
        }
        Ok(outcome)
    }

    /// Indicator light color.
    pub async fn led_color(&self) -> Result<LedColor> {
        Ok(self.hub.led_color().await?)
    }

    /// Set the indicator light color.
    pub async fn set_led_color(&self, color: LedColor) -> Result<()> {
        Ok(self.hub.set_led_color(color).await?)
    }

    /// Point-in-time view of the whole lock.
    pub async fn snapshot(&self) -> Result<LockSnapshot> {
        Ok(LockSnapshot {
            status: self.thumb_turn.status().await?,
            key_status: self.key.status().await?,
            key: self.key.state().await?,
            thumb_turn: self.thumb_turn.state().await?,
            reminder: self.reminder.state().await?,
            led: self.hub.led_color().await?,
            reconciliation: self.router.stats(),
        })
    }

    /// Stop the motors and every actor.
    pub async fn shutdown(self) -> Result<()> {
        self.pump.abort();
        self.hub.shutdown().await?;
        info!("Lock coordinator stopped");
        Ok(())
    }
}
