//! Mock device implementations for testing and development.
//!
//! This module provides simulated devices that can be controlled
//! programmatically without requiring physical hardware.

pub mod hub;

// Re-export commonly used types
pub use hub::{Coupling, MockHub, MockHubBuilder, MockHubHandle, MotorCommand};
