//! Hub actor and its control handle.
//!
//! The hub is owned by a single async task. Everything else in the process
//! talks to it through a cloneable [`HubHandle`], which turns each call into a
//! command on the actor's mailbox and waits for the reply. Sensor changes are
//! handed out once, as [`SensorEvents`], when the manager starts.
//!
//! ```text
//!  KeyController ──┐
//!                  │   HubCommand    ┌───────────┐
//!  ThumbTurn     ──┼────(mpsc)──────►│ Hub task  │──► AnyHubDevice
//!                  │                 └───────────┘        │
//!  Coordinator   ──┘                                      │
//!                                                         ▼
//!  Router ◄─────────────────── SensorEvents ◄──── sensor stream
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use turnlock_hardware::manager::{HubConfig, HubManager};
//! use turnlock_hardware::mock::MockHub;
//! use turnlock_hardware::types::MotorPort;
//!
//! #[tokio::main]
//! async fn main() -> turnlock_hardware::Result<()> {
//!     let mut manager = HubManager::new(HubConfig::default());
//!
//!     let (hub, _handle) = MockHub::new();
//!     manager.register_hub(hub.into());
//!
//!     let (hub, mut events) = manager.start()?;
//!     hub.drive_motor_to(MotorPort::Key, -50, 100).await?;
//!
//!     while let Some(event) = events.recv().await {
//!         println!("Event: {:?}", event);
//!     }
//!
//!     hub.shutdown().await
//! }
//! ```

use crate::devices::AnyHubDevice;
use crate::traits::HubDevice;
use crate::{DeviceInfo, HardwareError, LedColor, MotorPort, Result, SensorEvent};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use turnlock_core::Color;
use turnlock_core::constants::MAX_MOTOR_SPEED;

/// Configuration for the hub actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Capacity of the command mailbox.
    pub mailbox_capacity: usize,

    /// Indicator light color applied when the hub starts.
    pub initial_led: LedColor,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 32,
            initial_led: LedColor::default(),
        }
    }
}

/// Command processed by the hub task.
#[derive(Debug)]
enum HubCommand {
    MotorAngle {
        port: MotorPort,
        reply: oneshot::Sender<Result<i32>>,
    },
    Color {
        reply: oneshot::Sender<Result<Color>>,
    },
    DriveTo {
        port: MotorPort,
        angle: i32,
        speed: i8,
        reply: oneshot::Sender<Result<()>>,
    },
    Stop {
        port: MotorPort,
        reply: oneshot::Sender<Result<()>>,
    },
    SetLed {
        color: LedColor,
        reply: oneshot::Sender<Result<()>>,
    },
    LedColor {
        reply: oneshot::Sender<LedColor>,
    },
    Info {
        reply: oneshot::Sender<Result<DeviceInfo>>,
    },
    Shutdown {
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Stream of sensor changes from the hub.
///
/// Returned once by [`HubManager::start`]. Events are delivered in the order
/// the hub reported them.
#[derive(Debug)]
pub struct SensorEvents {
    event_rx: mpsc::Receiver<SensorEvent>,
}

impl SensorEvents {
    /// Wrap a raw sensor receiver.
    pub fn new(event_rx: mpsc::Receiver<SensorEvent>) -> Self {
        Self { event_rx }
    }

    /// Receive the next sensor change.
    ///
    /// Returns `None` once the hub has been dropped and every pending event
    /// has been consumed.
    pub async fn recv(&mut self) -> Option<SensorEvent> {
        self.event_rx.recv().await
    }
}

/// Cloneable handle to the hub task.
///
/// Every method fails with [`HardwareError::HubStopped`] once the hub task
/// has shut down.
#[derive(Debug, Clone)]
pub struct HubHandle {
    command_tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> HubCommand) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.command_tx
            .send(command(reply))
            .await
            .map_err(|_| HardwareError::HubStopped)?;
        response.await.map_err(|_| HardwareError::HubStopped)
    }

    /// Current key motor angle, in degrees.
    pub async fn key_angle(&self) -> Result<i32> {
        self.motor_angle(MotorPort::Key).await
    }

    /// Current thumbturn motor angle, in degrees.
    pub async fn thumb_turn_angle(&self) -> Result<i32> {
        self.motor_angle(MotorPort::ThumbTurn).await
    }

    /// Current encoder angle of a motor, in degrees.
    pub async fn motor_angle(&self, port: MotorPort) -> Result<i32> {
        self.request(|reply| HubCommand::MotorAngle { port, reply })
            .await?
    }

    /// Color currently seen on the thumbturn.
    pub async fn color(&self) -> Result<Color> {
        self.request(|reply| HubCommand::Color { reply }).await?
    }

    /// Drive a motor to an absolute encoder angle.
    ///
    /// The hub only runs motors by a relative number of degrees, so the
    /// current angle is read first and the difference is commanded, with the
    /// magnitude of `speed` and the sign of the difference. Nothing is sent
    /// when the motor is already at `angle`.
    ///
    /// The call returns once the command has been sent; callers wait for the
    /// motion to settle themselves.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::InvalidData`] if `speed` is zero or its
    /// magnitude exceeds 100, or any error the hub reports.
    pub async fn drive_motor_to(&self, port: MotorPort, angle: i32, speed: i8) -> Result<()> {
        self.request(|reply| HubCommand::DriveTo {
            port,
            angle,
            speed,
            reply,
        })
        .await?
    }

    /// Stop a motor.
    pub async fn stop_motor(&self, port: MotorPort) -> Result<()> {
        self.request(|reply| HubCommand::Stop { port, reply })
            .await?
    }

    /// Set the indicator light color.
    pub async fn set_led_color(&self, color: LedColor) -> Result<()> {
        self.request(|reply| HubCommand::SetLed { color, reply })
            .await?
    }

    /// Last indicator light color successfully applied.
    pub async fn led_color(&self) -> Result<LedColor> {
        self.request(|reply| HubCommand::LedColor { reply }).await
    }

    /// Device information of the hub.
    pub async fn info(&self) -> Result<DeviceInfo> {
        self.request(|reply| HubCommand::Info { reply }).await?
    }

    /// Stop both motors and shut the hub task down.
    ///
    /// Shutting down an already stopped hub is not an error.
    pub async fn shutdown(&self) -> Result<()> {
        match self.request(|reply| HubCommand::Shutdown { reply }).await {
            Err(HardwareError::HubStopped) => Ok(()),
            result => result?,
        }
    }
}

/// Owns the hub until it is started.
///
/// # Lifecycle
///
/// 1. Create the manager with a configuration
/// 2. Register the hub with [`register_hub`](Self::register_hub)
/// 3. Call [`start`](Self::start) to spawn the hub task
/// 4. Drive the hub through the returned [`HubHandle`] and consume the
///    returned [`SensorEvents`]
#[derive(Debug)]
pub struct HubManager {
    /// Registered hub device.
    hub: Option<AnyHubDevice>,

    /// Configuration.
    config: HubConfig,
}

impl HubManager {
    /// Create a new hub manager with configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use turnlock_hardware::manager::{HubConfig, HubManager};
    ///
    /// let manager = HubManager::new(HubConfig::default());
    /// assert!(!manager.has_hub());
    /// ```
    pub fn new(config: HubConfig) -> Self {
        Self { hub: None, config }
    }

    /// Register the hub device, replacing any previously registered one.
    pub fn register_hub(&mut self, device: AnyHubDevice) {
        self.hub = Some(device);
    }

    /// Whether a hub has been registered.
    pub fn has_hub(&self) -> bool {
        self.hub.is_some()
    }

    /// Spawn the hub task.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::InitializationFailed`] if no hub has been
    /// registered, or the hub's error if its sensor stream cannot be taken.
    pub fn start(mut self) -> Result<(HubHandle, SensorEvents)> {
        let mut device = self
            .hub
            .take()
            .ok_or_else(|| HardwareError::initialization_failed("no hub registered"))?;

        let events = SensorEvents::new(device.subscribe()?);
        let (command_tx, command_rx) = mpsc::channel(self.config.mailbox_capacity.max(1));

        tokio::spawn(Self::hub_task(device, command_rx, self.config.initial_led));

        Ok((HubHandle { command_tx }, events))
    }

    async fn hub_task(
        mut device: AnyHubDevice,
        mut command_rx: mpsc::Receiver<HubCommand>,
        initial_led: LedColor,
    ) {
        let mut led = LedColor::default();
        match device.set_led(initial_led).await {
            Ok(()) => led = initial_led,
            Err(e) => warn!("Failed to apply initial LED color {}: {}", initial_led, e),
        }

        if let Ok(info) = device.get_info().await {
            info!("Hub started: {} ({})", info.name, info.model);
        }

        while let Some(command) = command_rx.recv().await {
            match command {
                HubCommand::MotorAngle { port, reply } => {
                    let _ = reply.send(device.motor_angle(port).await);
                }
                HubCommand::Color { reply } => {
                    let _ = reply.send(device.color().await);
                }
                HubCommand::DriveTo {
                    port,
                    angle,
                    speed,
                    reply,
                } => {
                    let _ = reply.send(Self::drive_to(&mut device, port, angle, speed).await);
                }
                HubCommand::Stop { port, reply } => {
                    debug!("Stopping {} motor", port);
                    let _ = reply.send(device.stop_motor(port).await);
                }
                HubCommand::SetLed { color, reply } => {
                    let result = device.set_led(color).await;
                    if result.is_ok() {
                        led = color;
                    }
                    let _ = reply.send(result);
                }
                HubCommand::LedColor { reply } => {
                    let _ = reply.send(led);
                }
                HubCommand::Info { reply } => {
                    let _ = reply.send(device.get_info().await);
                }
                HubCommand::Shutdown { reply } => {
                    let key = device.stop_motor(MotorPort::Key).await;
                    let thumb_turn = device.stop_motor(MotorPort::ThumbTurn).await;
                    let _ = reply.send(key.and(thumb_turn));
                    break;
                }
            }
        }

        info!("Hub stopped");
    }

    async fn drive_to(
        device: &mut AnyHubDevice,
        port: MotorPort,
        angle: i32,
        speed: i8,
    ) -> Result<()> {
        if speed == 0 || speed.unsigned_abs() > MAX_MOTOR_SPEED.unsigned_abs() {
            return Err(HardwareError::invalid_data(format!(
                "motor speed {speed} out of range"
            )));
        }

        let current = device.motor_angle(port).await?;
        let delta = angle.saturating_sub(current);
        if delta == 0 {
            debug!("{} motor already at {}°", port, angle);
            return Ok(());
        }

        let magnitude = speed.abs();
        let signed_speed = if delta > 0 { magnitude } else { -magnitude };
        debug!(
            "Driving {} motor from {}° to {}° at {}",
            port, current, angle, signed_speed
        );

        device
            .run_motor_for_angle(port, delta.unsigned_abs(), signed_speed)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockHub, MotorCommand};

    fn start_mock() -> (HubHandle, SensorEvents, crate::mock::MockHubHandle) {
        let mut manager = HubManager::new(HubConfig::default());
        let (hub, mock) = MockHub::new();
        manager.register_hub(hub.into());
        let (handle, events) = manager.start().unwrap();
        (handle, events, mock)
    }

    #[test]
    fn test_hub_config_default() {
        let config = HubConfig::default();
        assert_eq!(config.mailbox_capacity, 32);
        assert_eq!(config.initial_led, LedColor::Blue);
    }

    #[test]
    fn test_manager_register_hub() {
        let mut manager = HubManager::new(HubConfig::default());
        assert!(!manager.has_hub());

        let (hub, _) = MockHub::new();
        manager.register_hub(AnyHubDevice::Mock(hub));
        assert!(manager.has_hub());
    }

    #[tokio::test]
    async fn test_start_without_hub_fails() {
        let manager = HubManager::new(HubConfig::default());
        assert!(matches!(
            manager.start(),
            Err(HardwareError::InitializationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_drive_to_commands_delta() {
        let (hub, mut events, mock) = start_mock();

        hub.drive_motor_to(MotorPort::Key, -50, 100).await.unwrap();
        hub.drive_motor_to(MotorPort::Key, 0, 60).await.unwrap();

        assert_eq!(
            mock.motor_commands(),
            vec![
                MotorCommand::RunForAngle {
                    port: MotorPort::Key,
                    degrees: 50,
                    speed: -100
                },
                MotorCommand::RunForAngle {
                    port: MotorPort::Key,
                    degrees: 50,
                    speed: 60
                },
            ]
        );
        assert_eq!(
            events.recv().await,
            Some(SensorEvent::KeyAngleChanged { old: 0, new: -50 })
        );
        assert_eq!(hub.key_angle().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_drive_to_current_angle_sends_nothing() {
        let (hub, _events, mock) = start_mock();

        hub.drive_motor_to(MotorPort::Key, 0, 100).await.unwrap();

        assert!(mock.motor_commands().is_empty());
    }

    #[tokio::test]
    async fn test_drive_to_rejects_bad_speed() {
        let (hub, _events, mock) = start_mock();

        for speed in [0, 101, -128] {
            assert!(matches!(
                hub.drive_motor_to(MotorPort::ThumbTurn, 1200, speed).await,
                Err(HardwareError::InvalidData { .. })
            ));
        }
        assert!(mock.motor_commands().is_empty());
    }

    #[tokio::test]
    async fn test_led_color_is_cached() {
        let (hub, _events, mock) = start_mock();

        assert_eq!(hub.led_color().await.unwrap(), LedColor::Blue);

        hub.set_led_color(LedColor::Orange).await.unwrap();
        assert_eq!(hub.led_color().await.unwrap(), LedColor::Orange);
        assert_eq!(mock.led_color(), LedColor::Orange);

        // A failed write keeps the previous color.
        mock.disconnect();
        assert!(hub.set_led_color(LedColor::Red).await.is_err());
        assert_eq!(hub.led_color().await.unwrap(), LedColor::Orange);
    }

    #[tokio::test]
    async fn test_initial_led_is_applied() {
        let mut manager = HubManager::new(HubConfig {
            initial_led: LedColor::Green,
            ..HubConfig::default()
        });
        let (hub, mock) = MockHub::new();
        manager.register_hub(hub.into());
        let (handle, _events) = manager.start().unwrap();

        assert_eq!(handle.led_color().await.unwrap(), LedColor::Green);
        assert_eq!(mock.led_color(), LedColor::Green);
    }

    #[tokio::test]
    async fn test_shutdown_stops_motors() {
        let (hub, _events, mock) = start_mock();

        hub.shutdown().await.unwrap();

        assert_eq!(
            mock.motor_commands(),
            vec![
                MotorCommand::Stop {
                    port: MotorPort::Key
                },
                MotorCommand::Stop {
                    port: MotorPort::ThumbTurn
                },
            ]
        );
        assert!(matches!(
            hub.color().await,
            Err(HardwareError::HubStopped)
        ));
        // Second shutdown is a no-op.
        hub.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_info() {
        let (hub, _events, _mock) = start_mock();
        assert_eq!(hub.info().await.unwrap().name, "Mock Hub");
    }
}
