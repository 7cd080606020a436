//! Hub abstraction layer for the turnlock door controller.
//!
//! The lock is driven by a single hub carrying two motors (one on the key,
//! one on the thumbturn), a color sensor that reads the thumbturn's position
//! and an indicator light. This crate defines the contract such a hub must
//! fulfil, a simulated hub for development and tests, and the actor that
//! owns the hub at runtime.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations are asynchronous using native `async fn`
//!   in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Single owner**: The hub is owned by one task; the rest of the process
//!   talks to it through a cloneable [`HubHandle`].
//! - **Error-aware**: All operations return `Result<T>` with detailed error information.
//!
//! # Hub Device
//!
//! The [`HubDevice`] trait is the raw driver surface:
//!
//! ```no_run
//! use turnlock_hardware::traits::HubDevice;
//! use turnlock_hardware::types::MotorPort;
//! use turnlock_hardware::error::Result;
//! use turnlock_core::LockStatus;
//!
//! async fn key_status<H: HubDevice>(hub: &mut H) -> Result<LockStatus> {
//!     let angle = hub.motor_angle(MotorPort::Key).await?;
//!     Ok(LockStatus::from_key_angle(angle))
//! }
//! ```
//!
//! # Hub Actor
//!
//! [`HubManager`] spawns the task that owns the device and returns a
//! [`HubHandle`] for commands plus the [`SensorEvents`] stream. The handle
//! adds absolute positioning on top of the driver's relative motor runs.
//!
//! # Mock Implementation
//!
//! [`mock::MockHub`] simulates both mechanisms, optionally coupled the way a
//! real door couples them, and records every motor command for assertions.

pub mod devices;
pub mod error;
pub mod manager;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::AnyHubDevice;
pub use error::{HardwareError, Result};
pub use traits::HubDevice;
pub use types::{DeviceInfo, LedColor, MotorPort, SensorEvent};

// Re-export manager types
pub use manager::{HubConfig, HubHandle, HubManager, SensorEvents};
