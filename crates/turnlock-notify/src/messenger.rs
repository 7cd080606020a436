//! Messenger contract and enum dispatch.

#![allow(async_fn_in_trait)]

use crate::log::LogMessenger;
use crate::mock::RecordingMessenger;
use crate::slack::SlackMessenger;

/// Outbound chat notification transport.
///
/// Delivery is fire-and-forget and best effort: implementations log their
/// own failures and never report them to the caller.
pub trait Messenger: Send + Sync {
    /// Post `message` to `channel`.
    async fn send(&self, channel: &str, message: &str);
}

/// Enum wrapper for messenger dispatch.
///
/// # Examples
///
/// ```
/// use turnlock_notify::{AnyMessenger, Messenger, RecordingMessenger};
///
/// #[tokio::main]
/// async fn main() {
///     let recorder = RecordingMessenger::new();
///     let messenger = AnyMessenger::from(recorder.clone());
///
///     messenger.send("general", "hello").await;
///     assert_eq!(recorder.texts(), vec!["hello".to_string()]);
/// }
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyMessenger {
    /// Slack `chat.postMessage` compatible endpoint.
    Slack(SlackMessenger),

    /// Writes notifications to the log only.
    Log(LogMessenger),

    /// Keeps notifications in memory for inspection.
    Recording(RecordingMessenger),
}

impl Messenger for AnyMessenger {
    async fn send(&self, channel: &str, message: &str) {
        match self {
            Self::Slack(messenger) => messenger.send(channel, message).await,
            Self::Log(messenger) => messenger.send(channel, message).await,
            Self::Recording(messenger) => messenger.send(channel, message).await,
        }
    }
}

impl From<SlackMessenger> for AnyMessenger {
    fn from(messenger: SlackMessenger) -> Self {
        Self::Slack(messenger)
    }
}

impl From<LogMessenger> for AnyMessenger {
    fn from(messenger: LogMessenger) -> Self {
        Self::Log(messenger)
    }
}

impl From<RecordingMessenger> for AnyMessenger {
    fn from(messenger: RecordingMessenger) -> Self {
        Self::Recording(messenger)
    }
}
