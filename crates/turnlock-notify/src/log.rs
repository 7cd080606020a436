//! Messenger that only logs.

use crate::messenger::Messenger;
use tracing::info;

/// Writes every notification to the log at info level.
///
/// Used when no chat endpoint is configured.
#[derive(Debug, Clone, Default)]
pub struct LogMessenger;

impl LogMessenger {
    pub fn new() -> Self {
        Self
    }
}

impl Messenger for LogMessenger {
    async fn send(&self, channel: &str, message: &str) {
        info!(channel, "Notification: {}", message);
    }
}
