//! Key mechanism.
//!
//! The key motor's encoder doubles as the key position sensor, so the status
//! is derived straight from the motor angle. A turn drives the motor to the
//! target status's angle, waits for it to settle and stops it.

use crate::config::KeySettings;
use crate::controller::Plan;
use crate::error::Result;
use std::time::Duration;
use tracing::info;
use turnlock_core::LockStatus;
use turnlock_hardware::{HubHandle, MotorPort};

/// Motor sequencing for the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyMechanism {
    settings: KeySettings,
}

impl KeyMechanism {
    pub fn new(settings: KeySettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &KeySettings {
        &self.settings
    }

    pub(crate) async fn status(&self, hub: &HubHandle) -> Result<LockStatus> {
        Ok(LockStatus::from_key_angle(hub.key_angle().await?))
    }

    /// Any known status can be reached from anywhere; UNKNOWN has no angle.
    pub(crate) fn plan(&self, current: LockStatus, target: LockStatus) -> Plan {
        if current == target {
            Plan::AlreadyThere
        } else if target.key_target_angle().is_none() {
            Plan::Refused
        } else {
            Plan::Move
        }
    }

    pub(crate) fn sequence_duration(&self) -> Duration {
        self.settings.settle()
    }

    pub(crate) async fn run(&self, hub: &HubHandle, target: LockStatus) -> Result<()> {
        let Some(angle) = target.key_target_angle() else {
            return Ok(());
        };

        info!(mechanism = "key", %target, "Turning key to {}°", angle);
        hub.drive_motor_to(MotorPort::Key, angle, self.settings.speed)
            .await?;
        tokio::time::sleep(self.settings.settle()).await;
        hub.stop_motor(MotorPort::Key).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LockStatus::Closed, LockStatus::Closed, Plan::AlreadyThere)]
    #[case(LockStatus::Unknown, LockStatus::Unknown, Plan::AlreadyThere)]
    #[case(LockStatus::Closed, LockStatus::Open, Plan::Move)]
    #[case(LockStatus::Unknown, LockStatus::Closed, Plan::Move)]
    #[case(LockStatus::Open, LockStatus::Unknown, Plan::Refused)]
    fn test_plan(#[case] current: LockStatus, #[case] target: LockStatus, #[case] expected: Plan) {
        assert_eq!(KeyMechanism::default().plan(current, target), expected);
    }

    #[test]
    fn test_sequence_duration_is_settle_time() {
        let mechanism = KeyMechanism::new(KeySettings {
            settle_ms: 250,
            speed: 40,
        });
        assert_eq!(mechanism.sequence_duration(), Duration::from_millis(250));
    }
}
