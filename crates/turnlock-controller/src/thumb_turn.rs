//! Thumbturn mechanism.
//!
//! The thumbturn is read through the color sensor facing it: blue when the
//! bolt is home, red when it is thrown. Turning it is a two-stage pulse: the
//! motor overshoots to throw the bolt, then returns to its rest angle so the
//! thumbturn can still be turned by hand.

use crate::config::ThumbTurnSettings;
use crate::controller::Plan;
use crate::error::Result;
use std::time::Duration;
use tracing::info;
use turnlock_core::LockStatus;
use turnlock_core::constants::THUMB_TURN_REST_ANGLE;
use turnlock_hardware::{HubHandle, MotorPort};

/// Motor sequencing for the thumbturn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThumbTurnMechanism {
    settings: ThumbTurnSettings,
}

impl ThumbTurnMechanism {
    pub fn new(settings: ThumbTurnSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ThumbTurnSettings {
        &self.settings
    }

    pub(crate) async fn status(&self, hub: &HubHandle) -> Result<LockStatus> {
        Ok(LockStatus::from_color(hub.color().await?))
    }

    /// Opens only from CLOSED and closes only from OPEN.
    pub(crate) fn plan(&self, current: LockStatus, target: LockStatus) -> Plan {
        match (current, target) {
            (current, target) if current == target => Plan::AlreadyThere,
            (LockStatus::Closed, LockStatus::Open) | (LockStatus::Open, LockStatus::Closed) => {
                Plan::Move
            }
            _ => Plan::Refused,
        }
    }

    pub(crate) fn sequence_duration(&self) -> Duration {
        self.settings.settle() * 2
    }

    fn overshoot_for(&self, target: LockStatus) -> i32 {
        match target {
            LockStatus::Open => self.settings.overshoot_angle,
            _ => -self.settings.overshoot_angle,
        }
    }

    pub(crate) async fn run(&self, hub: &HubHandle, target: LockStatus) -> Result<()> {
        let overshoot = self.overshoot_for(target);
        let speed = self.settings.speed;

        info!(mechanism = "thumb turn", %target, "Turning thumb turn via {}°", overshoot);
        hub.drive_motor_to(MotorPort::ThumbTurn, overshoot, speed)
            .await?;
        tokio::time::sleep(self.settings.settle()).await;

        hub.drive_motor_to(MotorPort::ThumbTurn, THUMB_TURN_REST_ANGLE, speed)
            .await?;
        tokio::time::sleep(self.settings.settle()).await;

        hub.stop_motor(MotorPort::ThumbTurn).await?;
        Ok(())
    }
}
