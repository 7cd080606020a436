//! In-memory messenger for testing.

use crate::messenger::Messenger;
use std::sync::{Arc, Mutex, PoisonError};

/// A notification captured by [`RecordingMessenger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel: String,
    pub text: String,
}

/// Messenger that keeps every notification in memory.
///
/// Clones share the same record, so a test can keep one clone and hand the
/// other to the component under test.
#[derive(Debug, Clone, Default)]
pub struct RecordingMessenger {
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification sent so far, oldest first.
    pub fn messages(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Text of every notification sent so far, oldest first.
    pub fn texts(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .map(|message| message.text)
            .collect()
    }

    /// Number of notifications sent so far.
    pub fn len(&self) -> usize {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Messenger for RecordingMessenger {
    async fn send(&self, channel: &str, message: &str) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentMessage {
                channel: channel.to_string(),
                text: message.to_string(),
            });
    }
}
