//! Mock hub implementation for testing and development.
//!
//! This module provides a simulated hub whose key angle, thumbturn encoder
//! and thumbturn color react to motor commands the way the physical lock
//! does, so the controllers can be exercised without a Bluetooth hub.
//!
//! # Simulation model
//!
//! - Running the key motor moves the key angle by the commanded degrees.
//! - Running the thumbturn motor moves its encoder. A run that ends at or
//!   beyond [`THUMB_TURN_THROW_THRESHOLD`] throws the bolt: positive angles
//!   show red (open), negative angles show blue (closed). Returning to the
//!   rest angle does not change the color.
//! - With [`Coupling::Full`], a key status change moves the thumbturn color to
//!   match, and a color change moves the key to the matching target angle.
//! - [`Coupling::Inverted`] models a miswired assembly: each mechanism drags
//!   the other to the opposite status, so the two never agree.
//!
//! Every reading change is reported on the sensor event stream.

use crate::{
    HardwareError, Result,
    traits::HubDevice,
    types::{DeviceInfo, LedColor, MotorPort, SensorEvent},
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use turnlock_core::{Color, LockStatus};

/// Thumbturn encoder angle, in degrees, beyond which the bolt is thrown.
pub const THUMB_TURN_THROW_THRESHOLD: i32 = 900;

/// Capacity of the simulated sensor event stream.
const EVENT_CAPACITY: usize = 256;

/// How turning one mechanism affects the other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Coupling {
    /// The mechanisms move independently.
    #[default]
    None,

    /// Both mechanisms always end up showing the same status.
    Full,

    /// Each mechanism drags the other to the opposite status.
    Inverted,
}

impl Coupling {
    /// Status the other mechanism is dragged to when one shows `status`.
    fn follow(&self, status: LockStatus) -> Option<LockStatus> {
        match (self, status) {
            (Self::None, _) | (_, LockStatus::Unknown) => None,
            (Self::Full, status) => Some(status),
            (Self::Inverted, LockStatus::Open) => Some(LockStatus::Closed),
            (Self::Inverted, LockStatus::Closed) => Some(LockStatus::Open),
        }
    }
}

/// Motor command recorded by the mock hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorCommand {
    /// `run_motor_for_angle` was called.
    RunForAngle {
        port: MotorPort,
        degrees: u32,
        speed: i8,
    },

    /// `stop_motor` was called.
    Stop { port: MotorPort },
}

impl MotorCommand {
    /// Port the command was addressed to.
    pub fn port(&self) -> MotorPort {
        match self {
            Self::RunForAngle { port, .. } | Self::Stop { port } => *port,
        }
    }
}

#[derive(Debug)]
struct MockHubState {
    key_angle: i32,
    thumb_turn_angle: i32,
    color: Color,
    led: LedColor,
    coupling: Coupling,
    connected: bool,
    commands: Vec<MotorCommand>,
    event_tx: mpsc::Sender<SensorEvent>,
}

impl MockHubState {
    fn emit(&self, event: SensorEvent) {
        // Sensor notifications are best effort, like the radio link they model.
        let _ = self.event_tx.try_send(event);
    }

    fn move_key(&mut self, angle: i32, propagate: bool) {
        let old = self.key_angle;
        if old == angle {
            return;
        }
        self.key_angle = angle;
        self.emit(SensorEvent::KeyAngleChanged { old, new: angle });

        if propagate
            && let Some(status) = self.coupling.follow(LockStatus::from_key_angle(angle))
            && status != LockStatus::from_color(self.color)
            && let Some(color) = status.color()
        {
            self.show_color(color, false);
        }
    }

    fn show_color(&mut self, color: Color, propagate: bool) {
        let old = self.color;
        if old == color {
            return;
        }
        self.color = color;
        self.emit(SensorEvent::ColorChanged { old, new: color });

        if propagate
            && let Some(status) = self.coupling.follow(LockStatus::from_color(color))
            && status != LockStatus::from_key_angle(self.key_angle)
            && let Some(angle) = status.key_target_angle()
        {
            self.move_key(angle, false);
        }
    }

    fn move_thumb_turn(&mut self, angle: i32) {
        let old = self.thumb_turn_angle;
        if old == angle {
            return;
        }
        self.thumb_turn_angle = angle;
        self.emit(SensorEvent::ThumbTurnAngleChanged { old, new: angle });

        if angle >= THUMB_TURN_THROW_THRESHOLD {
            self.show_color(Color::Red, true);
        } else if angle <= -THUMB_TURN_THROW_THRESHOLD {
            self.show_color(Color::Blue, true);
        }
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(HardwareError::disconnected("Mock Hub"))
        }
    }
}

fn lock(state: &Mutex<MockHubState>) -> MutexGuard<'_, MockHubState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock hub for testing and development.
///
/// # Examples
///
/// ```
/// use turnlock_hardware::mock::MockHub;
/// use turnlock_hardware::traits::HubDevice;
/// use turnlock_hardware::types::{MotorPort, SensorEvent};
/// use turnlock_core::Color;
///
/// #[tokio::main]
/// async fn main() -> turnlock_hardware::Result<()> {
///     let (mut hub, handle) = MockHub::new();
///     let mut events = hub.subscribe()?;
///
///     // Throw the thumbturn open
///     hub.run_motor_for_angle(MotorPort::ThumbTurn, 1200, 100).await?;
///     assert_eq!(hub.color().await?, Color::Red);
///
///     assert_eq!(
///         events.recv().await,
///         Some(SensorEvent::ThumbTurnAngleChanged { old: 0, new: 1200 })
///     );
///     assert_eq!(
///         events.recv().await,
///         Some(SensorEvent::ColorChanged { old: Color::Blue, new: Color::Red })
///     );
///     assert_eq!(handle.motor_commands().len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockHub {
    /// Simulated lock state, shared with the handle
    state: Arc<Mutex<MockHubState>>,

    /// Sensor event stream, until subscribed
    event_rx: Option<mpsc::Receiver<SensorEvent>>,

    /// Device name
    name: String,
}

impl MockHub {
    /// Create a closed, uncoupled mock hub (key at 0°, thumbturn blue).
    ///
    /// Returns a tuple of (MockHub, MockHubHandle) where the handle can be
    /// used to turn the mechanisms by hand and to inspect motor commands.
    pub fn new() -> (Self, MockHubHandle) {
        Self::builder().build()
    }

    /// Create a closed mock hub in fully-coupled mode.
    pub fn coupled() -> (Self, MockHubHandle) {
        Self::builder().coupling(Coupling::Full).build()
    }

    /// Create a builder to choose the initial readings.
    ///
    /// # Examples
    ///
    /// ```
    /// use turnlock_hardware::mock::MockHub;
    /// use turnlock_core::Color;
    ///
    /// let (hub, handle) = MockHub::builder()
    ///     .key_angle(-50)
    ///     .color(Color::Red)
    ///     .build();
    ///
    /// assert_eq!(handle.key_angle(), -50);
    /// ```
    pub fn builder() -> MockHubBuilder {
        MockHubBuilder::default()
    }
}

impl HubDevice for MockHub {
    async fn motor_angle(&mut self, port: MotorPort) -> Result<i32> {
        let state = lock(&self.state);
        state.ensure_connected()?;
        Ok(match port {
            MotorPort::Key => state.key_angle,
            MotorPort::ThumbTurn => state.thumb_turn_angle,
        })
    }

    async fn color(&mut self) -> Result<Color> {
        let state = lock(&self.state);
        state.ensure_connected()?;
        Ok(state.color)
    }

    async fn run_motor_for_angle(
        &mut self,
        port: MotorPort,
        degrees: u32,
        speed: i8,
    ) -> Result<()> {
        let mut state = lock(&self.state);
        state.ensure_connected()?;
        state
            .commands
            .push(MotorCommand::RunForAngle { port, degrees, speed });

        let degrees = i32::try_from(degrees)
            .map_err(|_| HardwareError::invalid_data(format!("{degrees} degrees is too far")))?;
        let delta = degrees * i32::from(speed.signum());

        match port {
            MotorPort::Key => {
                let target = state.key_angle + delta;
                state.move_key(target, true);
            }
            MotorPort::ThumbTurn => {
                let target = state.thumb_turn_angle + delta;
                state.move_thumb_turn(target);
            }
        }
        Ok(())
    }

    async fn stop_motor(&mut self, port: MotorPort) -> Result<()> {
        let mut state = lock(&self.state);
        state.ensure_connected()?;
        state.commands.push(MotorCommand::Stop { port });
        Ok(())
    }

    async fn set_led(&mut self, color: LedColor) -> Result<()> {
        let mut state = lock(&self.state);
        state.ensure_connected()?;
        state.led = color;
        Ok(())
    }

    fn subscribe(&mut self) -> Result<mpsc::Receiver<SensorEvent>> {
        self.event_rx.take().ok_or(HardwareError::AlreadySubscribed)
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock Hub v1.0").with_firmware_version("1.0.0"))
    }
}

/// Builder for [`MockHub`].
#[derive(Debug, Clone)]
pub struct MockHubBuilder {
    name: String,
    key_angle: i32,
    thumb_turn_angle: i32,
    color: Color,
    coupling: Coupling,
}

impl Default for MockHubBuilder {
    fn default() -> Self {
        Self {
            name: "Mock Hub".to_string(),
            key_angle: 0,
            thumb_turn_angle: 0,
            color: Color::Blue,
            coupling: Coupling::None,
        }
    }
}

impl MockHubBuilder {
    /// Set the device name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the initial key angle.
    pub fn key_angle(mut self, angle: i32) -> Self {
        self.key_angle = angle;
        self
    }

    /// Set the initial thumbturn encoder angle.
    pub fn thumb_turn_angle(mut self, angle: i32) -> Self {
        self.thumb_turn_angle = angle;
        self
    }

    /// Set the initial thumbturn color.
    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Enable or disable full coupling between the two mechanisms.
    pub fn coupled(self, coupled: bool) -> Self {
        self.coupling(if coupled { Coupling::Full } else { Coupling::None })
    }

    /// Set how the two mechanisms affect each other.
    pub fn coupling(mut self, coupling: Coupling) -> Self {
        self.coupling = coupling;
        self
    }

    /// Build the hub and its control handle.
    pub fn build(self) -> (MockHub, MockHubHandle) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CAPACITY);

        let state = Arc::new(Mutex::new(MockHubState {
            key_angle: self.key_angle,
            thumb_turn_angle: self.thumb_turn_angle,
            color: self.color,
            led: LedColor::default(),
            coupling: self.coupling,
            connected: true,
            commands: Vec::new(),
            event_tx,
        }));

        let hub = MockHub {
            state: Arc::clone(&state),
            event_rx: Some(event_rx),
            name: self.name,
        };

        (hub, MockHubHandle { state })
    }
}

/// Handle for controlling a mock hub.
///
/// The handle plays the part of a person standing at the door: it can turn
/// the key or the thumbturn by hand. It also exposes the simulated readings
/// and the log of motor commands for assertions. It can be cloned and shared
/// across tasks.
#[derive(Debug, Clone)]
pub struct MockHubHandle {
    state: Arc<Mutex<MockHubState>>,
}

impl MockHubHandle {
    /// Turn the key by hand to `angle`.
    pub fn turn_key_by_hand(&self, angle: i32) {
        lock(&self.state).move_key(angle, true);
    }

    /// Turn the thumbturn by hand until the sensor shows `color`.
    pub fn turn_thumb_turn_by_hand(&self, color: Color) {
        lock(&self.state).show_color(color, true);
    }

    /// Current simulated key angle.
    pub fn key_angle(&self) -> i32 {
        lock(&self.state).key_angle
    }

    /// Current simulated thumbturn encoder angle.
    pub fn thumb_turn_angle(&self) -> i32 {
        lock(&self.state).thumb_turn_angle
    }

    /// Current simulated thumbturn color.
    pub fn color(&self) -> Color {
        lock(&self.state).color
    }

    /// Current indicator light color.
    pub fn led_color(&self) -> LedColor {
        lock(&self.state).led
    }

    /// All motor commands received so far, oldest first.
    pub fn motor_commands(&self) -> Vec<MotorCommand> {
        lock(&self.state).commands.clone()
    }

    /// Motor commands received so far for one port.
    pub fn motor_commands_for(&self, port: MotorPort) -> Vec<MotorCommand> {
        lock(&self.state)
            .commands
            .iter()
            .filter(|command| command.port() == port)
            .copied()
            .collect()
    }

    /// Forget the recorded motor commands.
    pub fn clear_motor_commands(&self) {
        lock(&self.state).commands.clear();
    }

    /// Change how the two mechanisms affect each other.
    pub fn set_coupling(&self, coupling: Coupling) {
        lock(&self.state).coupling = coupling;
    }

    /// Simulate losing the radio link; every hub operation fails until
    /// [`reconnect`](Self::reconnect) is called.
    pub fn disconnect(&self) {
        lock(&self.state).connected = false;
    }

    /// Restore the radio link.
    pub fn reconnect(&self) {
        lock(&self.state).connected = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(events: &mut mpsc::Receiver<SensorEvent>) -> Vec<SensorEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = events.try_recv() {
            drained.push(event);
        }
        drained
    }

    #[tokio::test]
    async fn test_key_motor_moves_key_angle() {
        let (mut hub, handle) = MockHub::new();
        let mut events = hub.subscribe().unwrap();

        hub.run_motor_for_angle(MotorPort::Key, 50, -100)
            .await
            .unwrap();

        assert_eq!(handle.key_angle(), -50);
        assert_eq!(
            drain(&mut events),
            vec![SensorEvent::KeyAngleChanged { old: 0, new: -50 }]
        );
        // Uncoupled: the thumbturn did not follow.
        assert_eq!(handle.color(), Color::Blue);
    }

    #[tokio::test]
    async fn test_thumb_turn_throw_changes_color() {
        let (mut hub, handle) = MockHub::new();

        hub.run_motor_for_angle(MotorPort::ThumbTurn, 1200, 100)
            .await
            .unwrap();
        assert_eq!(handle.color(), Color::Red);

        // Returning to rest leaves the bolt where it is.
        hub.run_motor_for_angle(MotorPort::ThumbTurn, 1200, -100)
            .await
            .unwrap();
        assert_eq!(handle.thumb_turn_angle(), 0);
        assert_eq!(handle.color(), Color::Red);

        hub.run_motor_for_angle(MotorPort::ThumbTurn, 1200, -100)
            .await
            .unwrap();
        assert_eq!(handle.color(), Color::Blue);
    }

    #[tokio::test]
    async fn test_short_thumb_turn_run_does_not_throw() {
        let (mut hub, handle) = MockHub::new();

        hub.run_motor_for_angle(MotorPort::ThumbTurn, 400, 100)
            .await
            .unwrap();

        assert_eq!(handle.color(), Color::Blue);
    }

    #[tokio::test]
    async fn test_coupled_thumb_turn_moves_key() {
        let (mut hub, handle) = MockHub::coupled();
        let mut events = hub.subscribe().unwrap();

        hub.run_motor_for_angle(MotorPort::ThumbTurn, 1200, 100)
            .await
            .unwrap();

        assert_eq!(handle.key_angle(), -50);
        assert_eq!(
            drain(&mut events),
            vec![
                SensorEvent::ThumbTurnAngleChanged { old: 0, new: 1200 },
                SensorEvent::ColorChanged {
                    old: Color::Blue,
                    new: Color::Red
                },
                SensorEvent::KeyAngleChanged { old: 0, new: -50 },
            ]
        );
    }

    #[tokio::test]
    async fn test_coupled_key_moves_color() {
        let (_hub, handle) = MockHub::coupled();

        handle.turn_key_by_hand(-48);
        assert_eq!(handle.color(), Color::Red);

        // Halfway is no status at all; the thumbturn stays put.
        handle.turn_key_by_hand(-25);
        assert_eq!(handle.color(), Color::Red);

        handle.turn_key_by_hand(2);
        assert_eq!(handle.color(), Color::Blue);
    }

    #[tokio::test]
    async fn test_coupled_does_not_move_key_already_in_tolerance() {
        let (_hub, handle) = MockHub::builder()
            .key_angle(-45)
            .color(Color::Red)
            .coupled(true)
            .build();

        handle.turn_thumb_turn_by_hand(Color::Other);
        handle.turn_thumb_turn_by_hand(Color::Red);

        assert_eq!(handle.key_angle(), -45);
    }

    #[tokio::test]
    async fn test_inverted_coupling_drags_to_opposite() {
        let (mut hub, handle) = MockHub::builder()
            .coupling(Coupling::Inverted)
            .build();

        handle.turn_thumb_turn_by_hand(Color::Red);
        assert_eq!(handle.key_angle(), 0);

        hub.run_motor_for_angle(MotorPort::Key, 50, -100)
            .await
            .unwrap();
        assert_eq!(handle.color(), Color::Blue);

        hub.run_motor_for_angle(MotorPort::Key, 50, 100)
            .await
            .unwrap();
        assert_eq!(handle.color(), Color::Red);
    }

    #[test]
    fn test_set_coupling() {
        let (_hub, handle) = MockHub::new();

        handle.turn_key_by_hand(-50);
        assert_eq!(handle.color(), Color::Blue);

        handle.set_coupling(Coupling::Full);
        handle.turn_key_by_hand(0);
        handle.turn_key_by_hand(-50);
        assert_eq!(handle.color(), Color::Red);
    }

    #[tokio::test]
    async fn test_commands_are_recorded() {
        let (mut hub, handle) = MockHub::new();

        hub.run_motor_for_angle(MotorPort::Key, 10, 100)
            .await
            .unwrap();
        hub.stop_motor(MotorPort::Key).await.unwrap();
        hub.stop_motor(MotorPort::ThumbTurn).await.unwrap();

        assert_eq!(
            handle.motor_commands(),
            vec![
                MotorCommand::RunForAngle {
                    port: MotorPort::Key,
                    degrees: 10,
                    speed: 100
                },
                MotorCommand::Stop {
                    port: MotorPort::Key
                },
                MotorCommand::Stop {
                    port: MotorPort::ThumbTurn
                },
            ]
        );
        assert_eq!(handle.motor_commands_for(MotorPort::Key).len(), 2);

        handle.clear_motor_commands();
        assert!(handle.motor_commands().is_empty());
    }

    #[tokio::test]
    async fn test_disconnected_hub_fails() {
        let (mut hub, handle) = MockHub::new();
        handle.disconnect();

        assert!(matches!(
            hub.color().await,
            Err(HardwareError::Disconnected { .. })
        ));
        assert!(hub.stop_motor(MotorPort::Key).await.is_err());
        assert!(handle.motor_commands().is_empty());

        handle.reconnect();
        assert_eq!(hub.color().await.unwrap(), Color::Blue);
    }

    #[tokio::test]
    async fn test_led_is_tracked() {
        let (mut hub, handle) = MockHub::new();
        assert_eq!(handle.led_color(), LedColor::Blue);

        hub.set_led(LedColor::Green).await.unwrap();
        assert_eq!(handle.led_color(), LedColor::Green);
    }

    #[test]
    fn test_builder_initial_state() {
        let (_hub, handle) = MockHub::builder()
            .name("Front Door")
            .key_angle(-50)
            .thumb_turn_angle(30)
            .color(Color::Red)
            .build();

        assert_eq!(handle.key_angle(), -50);
        assert_eq!(handle.thumb_turn_angle(), 30);
        assert_eq!(handle.color(), Color::Red);
    }
}
