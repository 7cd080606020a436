//! Reconciliation between the key and the thumbturn.
//!
//! The two mechanisms act on the same bolt, so turning one eventually moves
//! the other's sensor. The router listens to sensor changes and drives the
//! *opposite* mechanism toward the status the changed sensor now shows:
//!
//! - color change: turn the key to the thumbturn's status, then re-read the
//!   color; if it drifted away from the target, go again with the new color;
//! - key angle change: turn the thumbturn to the key's status, then re-read
//!   the key angle; if it drifted, go again with the new angle.
//!
//! A handler does nothing while the mechanism whose sensor changed is itself
//! moving (its own motion produces the change). Each round trip that finds
//! the sensors still disagreeing is one recheck; after the configured number
//! of rechecks the handler gives up with [`ControlError::NotConverged`].
//!
//! Every OPEN/CLOSED edge of the thumbturn status is also forwarded to the
//! [`ReminderScheduler`], by the event pump only and in event order. The
//! recheck loops never report edges themselves: every color they observe
//! also arrives as its own event.

use crate::controller::Controller;
use crate::error::{ControlError, Result, Trigger};
use crate::reminder::ReminderScheduler;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinSet;
use tracing::{debug, error, trace, warn};
use turnlock_core::{Color, LockStatus};
use turnlock_hardware::{HubHandle, SensorEvent, SensorEvents};

/// Result of handling one sensor change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reconciliation {
    /// The mechanism whose sensor changed was moving; nothing was done.
    Deferred,

    /// The sensors agree after `rechecks` extra round trips.
    Settled { rechecks: usize },

    /// The opposite controller was busy or refused; nothing more was done.
    Dropped { rechecks: usize },
}

/// Running totals of reconciliation results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconciliationStats {
    pub settled: u64,
    pub deferred: u64,
    pub dropped: u64,
    pub failed: u64,

    /// Largest number of rechecks any single reconciliation needed.
    pub max_rechecks: usize,
}

impl ReconciliationStats {
    fn record(&mut self, result: &Result<Reconciliation>) {
        match result {
            Ok(Reconciliation::Deferred) => self.deferred += 1,
            Ok(Reconciliation::Settled { rechecks }) => {
                self.settled += 1;
                self.max_rechecks = self.max_rechecks.max(*rechecks);
            }
            Ok(Reconciliation::Dropped { rechecks }) => {
                self.dropped += 1;
                self.max_rechecks = self.max_rechecks.max(*rechecks);
            }
            Err(_) => self.failed += 1,
        }
    }
}

/// Routes sensor changes to the opposite controller.
#[derive(Debug, Clone)]
pub struct ReconciliationRouter {
    key: Controller,
    thumb_turn: Controller,
    reminder: ReminderScheduler,
    hub: HubHandle,
    max_depth: usize,
    stats: Arc<Mutex<ReconciliationStats>>,
}

impl ReconciliationRouter {
    pub fn new(
        key: Controller,
        thumb_turn: Controller,
        reminder: ReminderScheduler,
        hub: HubHandle,
        max_depth: usize,
    ) -> Self {
        Self {
            key,
            thumb_turn,
            reminder,
            hub,
            max_depth,
            stats: Arc::default(),
        }
    }

    /// Totals of every reconciliation finished by [`run`](Self::run).
    pub fn stats(&self) -> ReconciliationStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Consume sensor events until the stream ends.
    ///
    /// Reminder edges are forwarded in event order before the event's
    /// reconciliation starts; reconciliations run concurrently, since each
    /// one waits for a full motor sequence.
    pub async fn run(self, mut events: SensorEvents) {
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    self.dispatch(event, &mut tasks).await;
                }
                Some(finished) = tasks.join_next(), if !tasks.is_empty() => {
                    self.finish(finished);
                }
            }
        }

        while let Some(finished) = tasks.join_next().await {
            self.finish(finished);
        }
        debug!("Sensor event stream ended");
    }

    async fn dispatch(&self, event: SensorEvent, tasks: &mut JoinSet<Result<Reconciliation>>) {
        match event {
            SensorEvent::ColorChanged { old, new } => {
                debug!(?old, ?new, "Color changed");
                self.forward_edge(LockStatus::from_color(old), LockStatus::from_color(new))
                    .await;

                let router = self.clone();
                tasks.spawn(async move { router.on_color_changed(new).await });
            }
            SensorEvent::KeyAngleChanged { old, new } => {
                debug!(old, new, "Key angle changed");

                let router = self.clone();
                tasks.spawn(async move { router.on_key_angle_changed(new).await });
            }
            SensorEvent::ThumbTurnAngleChanged { old, new } => {
                trace!(old, new, "Thumb turn angle changed");
            }
            other => {
                trace!(?other, "Ignoring sensor event");
            }
        }
    }

    fn finish(&self, finished: std::result::Result<Result<Reconciliation>, tokio::task::JoinError>) {
        let result = match finished {
            Ok(result) => result,
            Err(e) => {
                error!("Reconciliation task failed: {}", e);
                return;
            }
        };

        match &result {
            Ok(reconciliation) => trace!(?reconciliation, "Reconciliation finished"),
            Err(ControlError::NotConverged { .. }) => {}
            Err(e) => warn!("Reconciliation aborted: {}", e),
        }
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(&result);
    }

    async fn forward_edge(&self, old: LockStatus, new: LockStatus) {
        if let Err(e) = self.reminder.on_event(old, new).await {
            warn!("Failed to forward {} -> {} to reminder: {}", old, new, e);
        }
    }

    /// Bring the key in line with a new thumbturn color.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::NotConverged`] when the color keeps drifting
    /// away after every allowed recheck, or any controller or hub error.
    pub async fn on_color_changed(&self, color: Color) -> Result<Reconciliation> {
        let mut color = color;
        let mut rechecks = 0;

        loop {
            if self.thumb_turn.is_working().await? {
                debug!(?color, "Thumb turn working, not following color");
                return Ok(Reconciliation::Deferred);
            }

            let target = LockStatus::from_color(color);
            let outcome = self.key.turn(target).await?;
            if !outcome.reached_target() {
                debug!(%target, %outcome, "Key did not follow thumb turn");
                return Ok(Reconciliation::Dropped { rechecks });
            }

            let current = self.hub.color().await?;
            let status = LockStatus::from_color(current);
            if status == target {
                return Ok(Reconciliation::Settled { rechecks });
            }

            self.check_depth(Trigger::Color, rechecks)?;
            rechecks += 1;
            debug!(%target, %status, rechecks, "Color drifted during key motion");
            color = current;
        }
    }

    /// Bring the thumbturn in line with a new key angle.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::NotConverged`] when the key keeps drifting
    /// away after every allowed recheck, or any controller or hub error.
    pub async fn on_key_angle_changed(&self, angle: i32) -> Result<Reconciliation> {
        let mut angle = angle;
        let mut rechecks = 0;

        loop {
            if self.key.is_working().await? {
                debug!(angle, "Key working, not following key angle");
                return Ok(Reconciliation::Deferred);
            }

            let target = LockStatus::from_key_angle(angle);
            let outcome = self.thumb_turn.turn(target).await?;
            if !outcome.reached_target() {
                debug!(%target, %outcome, "Thumb turn did not follow key");
                return Ok(Reconciliation::Dropped { rechecks });
            }

            let current = self.hub.key_angle().await?;
            let status = LockStatus::from_key_angle(current);
            if status == target {
                return Ok(Reconciliation::Settled { rechecks });
            }

            self.check_depth(Trigger::KeyAngle, rechecks)?;
            rechecks += 1;
            debug!(%target, %status, rechecks, "Key drifted during thumb turn motion");
            angle = current;
        }
    }

    fn check_depth(&self, trigger: Trigger, rechecks: usize) -> Result<()> {
        if rechecks >= self.max_depth {
            error!(%trigger, attempts = rechecks, "Mechanisms failed to converge");
            return Err(ControlError::NotConverged {
                trigger,
                attempts: rechecks,
            });
        }
        Ok(())
    }
}
