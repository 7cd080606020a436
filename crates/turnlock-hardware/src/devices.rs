//! Enum wrapper for hub device dispatch.
//!
//! Native `async fn` in traits (RPITIT, Edition 2024) are not object-safe, so
//! `Box<dyn HubDevice>` is not an option. The hub actor instead owns an
//! [`AnyHubDevice`], which dispatches to the concrete implementation at
//! compile time.
//!
//! # Examples
//!
//! ```
//! use turnlock_hardware::devices::AnyHubDevice;
//! use turnlock_hardware::mock::MockHub;
//!
//! let (hub, _handle) = MockHub::new();
//! let any_hub = AnyHubDevice::Mock(hub);
//! ```

use crate::mock::MockHub;
use crate::traits::HubDevice;
use crate::{DeviceInfo, LedColor, MotorPort, Result, SensorEvent};
use tokio::sync::mpsc;
use turnlock_core::Color;

/// Enum wrapper for hub device dispatch.
///
/// # Examples
///
/// ```
/// use turnlock_hardware::devices::AnyHubDevice;
/// use turnlock_hardware::traits::HubDevice;
/// use turnlock_hardware::mock::MockHub;
///
/// #[tokio::main]
/// async fn main() -> turnlock_hardware::Result<()> {
///     let (hub, _handle) = MockHub::new();
///     let any_hub = AnyHubDevice::Mock(hub);
///
///     let info = any_hub.get_info().await?;
///     println!("Hub: {}", info.name);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyHubDevice {
    /// Simulated hub for development and testing.
    Mock(MockHub),
}

impl HubDevice for AnyHubDevice {
    async fn motor_angle(&mut self, port: MotorPort) -> Result<i32> {
        match self {
            Self::Mock(device) => device.motor_angle(port).await,
        }
    }

    async fn color(&mut self) -> Result<Color> {
        match self {
            Self::Mock(device) => device.color().await,
        }
    }

    async fn run_motor_for_angle(
        &mut self,
        port: MotorPort,
        degrees: u32,
        speed: i8,
    ) -> Result<()> {
        match self {
            Self::Mock(device) => device.run_motor_for_angle(port, degrees, speed).await,
        }
    }

    async fn stop_motor(&mut self, port: MotorPort) -> Result<()> {
        match self {
            Self::Mock(device) => device.stop_motor(port).await,
        }
    }

    async fn set_led(&mut self, color: LedColor) -> Result<()> {
        match self {
            Self::Mock(device) => device.set_led(color).await,
        }
    }

    fn subscribe(&mut self) -> Result<mpsc::Receiver<SensorEvent>> {
        match self {
            Self::Mock(device) => device.subscribe(),
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

impl From<MockHub> for AnyHubDevice {
    fn from(device: MockHub) -> Self {
        Self::Mock(device)
    }
}
