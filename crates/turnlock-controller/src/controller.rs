//! Per-mechanism controller actor.
//!
//! Each mechanism is driven by one task that owns its `working` flag and
//! processes requests from a bounded mailbox, strictly in arrival order.
//! While a motor sequence is in flight the flag is set and every further
//! `turn` request is dropped (answered with [`TurnOutcome::Busy`]); there is
//! no queue.
//!
//! The motor sequence itself runs on a separate task so the mailbox keeps
//! answering status and state queries during the settle waits. When the
//! sequence ends it posts a `Finished` command back to the mailbox; the actor
//! clears `working` and only then replies to the original `turn` caller, so
//! awaiting [`Controller::turn`] waits for the whole motion.
//!
//! ```text
//! turn(OPEN) ──► mailbox ──► actor ── working=true ──► sequence task
//!                   ▲                                      │
//!                   └──────────── Finished ◄───────────────┘
//! ```

use crate::error::{ControlError, Result};
use crate::key::KeyMechanism;
use crate::thumb_turn::ThumbTurnMechanism;
use std::fmt;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, warn};
use turnlock_core::LockStatus;
use turnlock_hardware::{HubHandle, MotorPort};

/// Capacity of each controller mailbox.
const MAILBOX_CAPACITY: usize = 32;

/// What a controller decided to do with a `turn` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnOutcome {
    /// A motor sequence ran to completion.
    Completed,

    /// The mechanism already showed the target status; nothing was sent.
    AlreadyThere,

    /// A sequence was already in flight; the request was dropped.
    Busy,

    /// The target cannot be reached from the current status.
    Refused,
}

impl TurnOutcome {
    /// Whether the mechanism is known to have ended up at the target.
    pub fn reached_target(&self) -> bool {
        matches!(self, Self::Completed | Self::AlreadyThere)
    }
}

impl fmt::Display for TurnOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::AlreadyThere => write!(f, "already there"),
            Self::Busy => write!(f, "busy"),
            Self::Refused => write!(f, "refused"),
        }
    }
}

/// Decision taken before any motor command is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Plan {
    AlreadyThere,
    Refused,
    Move,
}

/// Snapshot of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerState {
    /// A motor sequence is in flight.
    pub working: bool,

    /// When the in-flight sequence is expected to finish.
    pub busy_until: Option<Instant>,
}

impl ControllerState {
    /// Time left until the in-flight sequence is expected to finish.
    pub fn remaining(&self) -> Option<Duration> {
        self.busy_until
            .map(|until| until.saturating_duration_since(Instant::now()))
    }
}

/// A motorized part of the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mechanism {
    Key(KeyMechanism),
    ThumbTurn(ThumbTurnMechanism),
}

impl Mechanism {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Key(_) => "key",
            Self::ThumbTurn(_) => "thumb turn",
        }
    }

    pub fn port(&self) -> MotorPort {
        match self {
            Self::Key(_) => MotorPort::Key,
            Self::ThumbTurn(_) => MotorPort::ThumbTurn,
        }
    }

    async fn status(&self, hub: &HubHandle) -> Result<LockStatus> {
        match self {
            Self::Key(mechanism) => mechanism.status(hub).await,
            Self::ThumbTurn(mechanism) => mechanism.status(hub).await,
        }
    }

    fn plan(&self, current: LockStatus, target: LockStatus) -> Plan {
        match self {
            Self::Key(mechanism) => mechanism.plan(current, target),
            Self::ThumbTurn(mechanism) => mechanism.plan(current, target),
        }
    }

    fn sequence_duration(&self) -> Duration {
        match self {
            Self::Key(mechanism) => mechanism.sequence_duration(),
            Self::ThumbTurn(mechanism) => mechanism.sequence_duration(),
        }
    }

    async fn run(&self, hub: &HubHandle, target: LockStatus) -> Result<()> {
        let result = match self {
            Self::Key(mechanism) => mechanism.run(hub, target).await,
            Self::ThumbTurn(mechanism) => mechanism.run(hub, target).await,
        };

        if let Err(e) = &result {
            warn!(mechanism = self.name(), %target, "Motor sequence failed: {}", e);
            // Best effort; the hub may be what failed.
            let _ = hub.stop_motor(self.port()).await;
        }
        result
    }
}

impl From<KeyMechanism> for Mechanism {
    fn from(mechanism: KeyMechanism) -> Self {
        Self::Key(mechanism)
    }
}

impl From<ThumbTurnMechanism> for Mechanism {
    fn from(mechanism: ThumbTurnMechanism) -> Self {
        Self::ThumbTurn(mechanism)
    }
}

#[derive(Debug)]
enum Command {
    Turn {
        target: LockStatus,
        reply: oneshot::Sender<Result<TurnOutcome>>,
    },
    IsWorking {
        reply: oneshot::Sender<bool>,
    },
    Status {
        reply: oneshot::Sender<Result<LockStatus>>,
    },
    State {
        reply: oneshot::Sender<ControllerState>,
    },
    Finished {
        result: Result<()>,
        reply: oneshot::Sender<Result<TurnOutcome>>,
    },
}

/// Cloneable handle to a controller task.
///
/// The task stops once every handle is dropped and no sequence is in flight.
#[derive(Debug, Clone)]
pub struct Controller {
    name: &'static str,
    command_tx: mpsc::Sender<Command>,
}

impl Controller {
    /// Spawn a controller for `mechanism` on the current runtime.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use turnlock_controller::{Controller, KeyMechanism, KeySettings};
    /// use turnlock_core::LockStatus;
    /// # async fn example(hub: turnlock_hardware::HubHandle) -> turnlock_controller::Result<()> {
    /// let key = Controller::spawn(KeyMechanism::new(KeySettings::default()), hub);
    /// key.turn(LockStatus::Open).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn spawn(mechanism: impl Into<Mechanism>, hub: HubHandle) -> Self {
        let mechanism = mechanism.into();
        let (command_tx, command_rx) = mpsc::channel(MAILBOX_CAPACITY);

        tokio::spawn(run_controller(
            mechanism,
            hub,
            command_rx,
            command_tx.downgrade(),
        ));

        Self {
            name: mechanism.name(),
            command_tx,
        }
    }

    /// Name of the controlled mechanism.
    pub fn name(&self) -> &'static str {
        self.name
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.command_tx
            .send(command(reply))
            .await
            .map_err(|_| ControlError::ControllerStopped)?;
        response.await.map_err(|_| ControlError::ControllerStopped)
    }

    /// Drive the mechanism to `target`.
    ///
    /// Resolves once the request has been handled: immediately when it is
    /// dropped, refused or already satisfied, or after the full motor
    /// sequence including its settle waits.
    ///
    /// # Errors
    ///
    /// Returns the hub's error if reading the sensor or any motor command
    /// fails; `working` is cleared either way.
    pub async fn turn(&self, target: LockStatus) -> Result<TurnOutcome> {
        self.request(|reply| Command::Turn { target, reply })
            .await?
    }

    /// Whether a motor sequence is in flight.
    pub async fn is_working(&self) -> Result<bool> {
        self.request(|reply| Command::IsWorking { reply }).await
    }

    /// Status derived from the mechanism's current sensor reading.
    pub async fn status(&self) -> Result<LockStatus> {
        self.request(|reply| Command::Status { reply }).await?
    }

    /// Snapshot of the controller.
    pub async fn state(&self) -> Result<ControllerState> {
        self.request(|reply| Command::State { reply }).await
    }
}

async fn run_controller(
    mechanism: Mechanism,
    hub: HubHandle,
    mut command_rx: mpsc::Receiver<Command>,
    finished_tx: mpsc::WeakSender<Command>,
) {
    let name = mechanism.name();
    let mut state = ControllerState::default();

    while let Some(command) = command_rx.recv().await {
        match command {
            Command::Turn { target, reply } => {
                if state.working {
                    debug!(mechanism = name, %target, "Working, dropping turn request");
                    let _ = reply.send(Ok(TurnOutcome::Busy));
                    continue;
                }

                let current = match mechanism.status(&hub).await {
                    Ok(status) => status,
                    Err(e) => {
                        let _ = reply.send(Err(e));
                        continue;
                    }
                };

                match mechanism.plan(current, target) {
                    Plan::AlreadyThere => {
                        debug!(mechanism = name, status = %current, "Already at target");
                        let _ = reply.send(Ok(TurnOutcome::AlreadyThere));
                    }
                    Plan::Refused => {
                        debug!(mechanism = name, status = %current, %target, "Refusing turn");
                        let _ = reply.send(Ok(TurnOutcome::Refused));
                    }
                    Plan::Move => {
                        let Some(finished) = finished_tx.upgrade() else {
                            let _ = reply.send(Err(ControlError::ControllerStopped));
                            continue;
                        };

                        state = ControllerState {
                            working: true,
                            busy_until: Instant::now().checked_add(mechanism.sequence_duration()),
                        };
                        debug!(mechanism = name, status = %current, %target, "working = true");

                        let hub = hub.clone();
                        tokio::spawn(async move {
                            let result = mechanism.run(&hub, target).await;
                            let _ = finished.send(Command::Finished { result, reply }).await;
                        });
                    }
                }
            }
            Command::Finished { result, reply } => {
                state = ControllerState::default();
                debug!(mechanism = name, "working = false");
                let _ = reply.send(result.map(|()| TurnOutcome::Completed));
            }
            Command::IsWorking { reply } => {
                let _ = reply.send(state.working);
            }
            Command::Status { reply } => {
                let _ = reply.send(mechanism.status(&hub).await);
            }
            Command::State { reply } => {
                let _ = reply.send(state);
            }
        }
    }

    debug!(mechanism = name, "Controller stopped");
}
