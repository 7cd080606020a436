//! Hub device trait definition.
//!
//! This module defines the contract between the lock core and the hub that
//! carries both motors and the color sensor. The contract is deliberately the
//! raw driver surface: read a motor encoder, read the color, run a motor for a
//! number of degrees, stop a motor, set the light, and subscribe to sensor
//! changes. Target-angle driving is built on top of it by
//! [`HubHandle`](crate::manager::HubHandle).
//!
//! The driver reports no "motion complete" event. Callers that need a motion
//! to finish wait a fixed settle time themselves before stopping the motor.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::{DeviceInfo, LedColor, MotorPort, SensorEvent};
use tokio::sync::mpsc;
use turnlock_core::Color;

/// Hub device abstraction.
///
/// Represents a hub with a motor on the key, a motor on the thumbturn, a color
/// sensor facing the thumbturn, and an indicator light.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`, which cannot be used in trait objects. Use generic type
/// parameters, or the enum wrapper [`AnyHubDevice`](crate::devices::AnyHubDevice)
/// for concrete dispatch (this is what the hub actor owns).
///
/// # Examples
///
/// ```no_run
/// use turnlock_hardware::traits::HubDevice;
/// use turnlock_hardware::types::MotorPort;
/// use turnlock_hardware::error::Result;
///
/// async fn nudge_key<H: HubDevice>(hub: &mut H) -> Result<i32> {
///     hub.run_motor_for_angle(MotorPort::Key, 10, 50).await?;
///     hub.stop_motor(MotorPort::Key).await?;
///     hub.motor_angle(MotorPort::Key).await
/// }
/// ```
pub trait HubDevice: Send + Sync {
    /// Read the last reported encoder angle of a motor, in degrees.
    ///
    /// # Errors
    ///
    /// Returns an error if the hub is disconnected.
    async fn motor_angle(&mut self, port: MotorPort) -> Result<i32>;

    /// Read the last reported color seen on the thumbturn.
    ///
    /// # Errors
    ///
    /// Returns an error if the hub is disconnected.
    async fn color(&mut self) -> Result<Color>;

    /// Run a motor for `degrees` at `speed` percent.
    ///
    /// The sign of `speed` selects the direction. The call returns once the
    /// command has been sent, not when the motor has finished moving.
    ///
    /// # Errors
    ///
    /// Returns an error if the hub is disconnected or rejects the command.
    async fn run_motor_for_angle(&mut self, port: MotorPort, degrees: u32, speed: i8)
    -> Result<()>;

    /// Stop a motor by driving it at constant speed 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the hub is disconnected.
    async fn stop_motor(&mut self, port: MotorPort) -> Result<()>;

    /// Set the indicator light color.
    ///
    /// # Errors
    ///
    /// Returns an error if the hub is disconnected.
    async fn set_led(&mut self, color: LedColor) -> Result<()>;

    /// Take the stream of sensor changes.
    ///
    /// The stream is produced by the driver independently of commands, so
    /// events may arrive at any time, including during a motor command.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::AlreadySubscribed`](crate::HardwareError::AlreadySubscribed)
    /// if the stream has already been taken.
    fn subscribe(&mut self) -> Result<mpsc::Receiver<SensorEvent>>;

    /// Get device information.
    ///
    /// # Errors
    ///
    /// Returns an error if a communication error occurs while querying
    /// device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}
