//! Open-door reminder.
//!
//! The scheduler listens to OPEN/CLOSED edges of the lock status. Leaving the
//! closed state arms a one-shot timer; if the lock is still not closed when it
//! fires, a reminder is posted. Closing the lock disarms the timer and, when a
//! reminder went out, posts a follow-up saying the door is locked again.
//!
//! ```text
//!          opened             timeout
//!   Idle ─────────► Armed ──────────────► Notified
//!    ▲                │                      │
//!    └──── closed ────┘◄──── closed (+msg) ──┘
//! ```

use crate::config::ReminderSettings;
use crate::error::{ControlError, Result};
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};
use turnlock_core::{LockStatus, StatusEdge};
use turnlock_notify::{AnyMessenger, Messenger};

/// Capacity of the scheduler mailbox.
const MAILBOX_CAPACITY: usize = 64;

/// State of the reminder timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReminderState {
    /// The lock is closed, or has never been seen opening.
    #[default]
    Idle,

    /// The lock is open and the timer is running.
    Armed {
        /// When the reminder goes out.
        deadline: Instant,
        /// Wall-clock time the lock was opened.
        opened_at: DateTime<Utc>,
    },

    /// The reminder went out; waiting for the lock to close.
    Notified {
        /// Wall-clock time the lock was opened.
        opened_at: DateTime<Utc>,
    },
}

impl ReminderState {
    pub fn is_armed(&self) -> bool {
        matches!(self, Self::Armed { .. })
    }

    pub fn is_notified(&self) -> bool {
        matches!(self, Self::Notified { .. })
    }

    /// Next transition for `edge`.
    ///
    /// Returns the new state and whether the "closed now" message is due.
    fn on_edge(self, edge: StatusEdge, settings: &ReminderSettings) -> (Self, bool) {
        match (self, edge) {
            (Self::Idle, StatusEdge::Opened) => (
                Self::Armed {
                    deadline: Instant::now() + settings.timeout(),
                    opened_at: Utc::now(),
                },
                false,
            ),
            (Self::Armed { .. }, StatusEdge::Closed) => (Self::Idle, false),
            (Self::Notified { .. }, StatusEdge::Closed) => (Self::Idle, true),
            (state, _) => (state, false),
        }
    }
}

#[derive(Debug)]
enum Command {
    Event { old: LockStatus, new: LockStatus },
    State { reply: oneshot::Sender<ReminderState> },
}

/// Cloneable handle to the reminder task.
#[derive(Debug, Clone)]
pub struct ReminderScheduler {
    command_tx: mpsc::Sender<Command>,
}

impl ReminderScheduler {
    /// Spawn the scheduler on the current runtime.
    pub fn spawn(settings: ReminderSettings, messenger: AnyMessenger) -> Self {
        let (command_tx, command_rx) = mpsc::channel(MAILBOX_CAPACITY);
        tokio::spawn(run_scheduler(settings, messenger, command_rx));
        Self { command_tx }
    }

    /// Report a status transition.
    ///
    /// Only OPEN/CLOSED edges change anything; other transitions are ignored.
    /// Events are processed in the order they are reported.
    pub async fn on_event(&self, old: LockStatus, new: LockStatus) -> Result<()> {
        self.command_tx
            .send(Command::Event { old, new })
            .await
            .map_err(|_| ControlError::ControllerStopped)
    }

    /// Current timer state, after every previously reported event.
    pub async fn state(&self) -> Result<ReminderState> {
        let (reply, response) = oneshot::channel();
        self.command_tx
            .send(Command::State { reply })
            .await
            .map_err(|_| ControlError::ControllerStopped)?;
        response.await.map_err(|_| ControlError::ControllerStopped)
    }
}

async fn run_scheduler(
    settings: ReminderSettings,
    messenger: AnyMessenger,
    mut command_rx: mpsc::Receiver<Command>,
) {
    let mut state = ReminderState::Idle;

    loop {
        let deadline = match state {
            ReminderState::Armed { deadline, .. } => Some(deadline),
            _ => None,
        };

        tokio::select! {
            command = command_rx.recv() => {
                let Some(command) = command else { break };

                match command {
                    Command::Event { old, new } => {
                        let Some(edge) = StatusEdge::between(old, new) else {
                            continue;
                        };

                        let (next, send_closed) = state.on_edge(edge, &settings);
                        if next != state {
                            debug!(%edge, "Reminder {:?} -> {:?}", state, next);
                        }
                        state = next;

                        if send_closed {
                            info!(channel = %settings.channel, "Door closed after reminder");
                            messenger.send(&settings.channel, &settings.closed_message).await;
                        }
                    }
                    Command::State { reply } => {
                        let _ = reply.send(state);
                    }
                }
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if let ReminderState::Armed { opened_at, .. } = state {
                    info!(channel = %settings.channel, %opened_at, "Door left open, sending reminder");
                    state = ReminderState::Notified { opened_at };
                    messenger.send(&settings.channel, &settings.still_open_message).await;
                }
            }
        }
    }

    debug!("Reminder scheduler stopped");
}
