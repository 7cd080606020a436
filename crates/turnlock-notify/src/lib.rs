//! Operator notifications for turnlock.
//!
//! This crate provides the outbound chat transport used by the open-door
//! reminder. Every transport implements [`Messenger`]; the controller holds
//! an [`AnyMessenger`] so the transport can be chosen at startup.
//!
//! # Components
//!
//! - **SlackMessenger**: form POST to a Slack-compatible endpoint
//! - **LogMessenger**: writes notifications to the log, used when no endpoint
//!   is configured
//! - **RecordingMessenger**: keeps notifications in memory for tests
//!
//! # Example
//!
//! ```
//! use turnlock_notify::{AnyMessenger, LogMessenger, Messenger};
//!
//! # async fn example() {
//! let messenger = AnyMessenger::from(LogMessenger::new());
//! messenger.send("general", "The door has been unlocked for a while.").await;
//! # }
//! ```

mod log;
mod messenger;
pub mod mock;
mod slack;

pub use log::LogMessenger;
pub use messenger::{AnyMessenger, Messenger};
pub use mock::{RecordingMessenger, SentMessage};
pub use slack::{DEFAULT_BOT_NAME, DEFAULT_TIMEOUT_MS, SlackError, SlackMessenger, SlackSettings};
