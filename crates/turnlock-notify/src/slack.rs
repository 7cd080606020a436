//! Slack-compatible chat transport.
//!
//! Posts each notification as an `application/x-www-form-urlencoded` body
//! with `token`, `channel`, `username` and `text` fields, the shape accepted
//! by Slack's `chat.postMessage` and by most Slack-compatible webhooks.
//!
//! # Example Usage
//!
//! ```no_run
//! use turnlock_notify::{Messenger, SlackMessenger, SlackSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = SlackSettings::new("https://slack.com/api/chat.postMessage", "xoxb-token")
//!     .with_bot_name("doorbot");
//!
//! let messenger = SlackMessenger::new(settings)?;
//! messenger.send("general", "The door is locked now. Thanks!").await;
//! # Ok(())
//! # }
//! ```
//!
//! # Timeout Handling
//!
//! Every request is bounded by a timeout (default: 3000ms). A request that
//! times out, fails in transport or gets a non-success status is logged at
//! error level and dropped; nothing is retried.

use crate::messenger::Messenger;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

/// Default bot display name.
pub const DEFAULT_BOT_NAME: &str = "turnlock";

/// Default request timeout, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 3_000;

fn default_bot_name() -> String {
    DEFAULT_BOT_NAME.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Configuration for the Slack transport.
///
/// # Example
///
/// ```
/// use turnlock_notify::SlackSettings;
///
/// let settings: SlackSettings = toml::from_str(r#"
///     api_url = "https://slack.com/api/chat.postMessage"
///     token = "xoxb-token"
/// "#).unwrap();
///
/// assert_eq!(settings.bot_name, "turnlock");
/// assert_eq!(settings.timeout_ms, 3000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackSettings {
    /// Endpoint receiving the form POST.
    pub api_url: String,

    /// API token sent with every message.
    pub token: String,

    /// Display name of the bot.
    #[serde(default = "default_bot_name")]
    pub bot_name: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl SlackSettings {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            token: token.into(),
            bot_name: default_bot_name(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_bot_name(mut self, bot_name: impl Into<String>) -> Self {
        self.bot_name = bot_name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Errors that can occur while delivering a message.
#[derive(Debug, Error)]
pub enum SlackError {
    /// The endpoint answered with a non-success status.
    #[error("Slack endpoint returned HTTP {0}")]
    Status(u16),

    /// Transport error, including timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Posts notifications to a Slack-compatible endpoint.
#[derive(Debug, Clone)]
pub struct SlackMessenger {
    client: reqwest::Client,
    settings: SlackSettings,
}

impl SlackMessenger {
    /// Create a messenger for `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: SlackSettings) -> Result<Self, SlackError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()?;

        debug!("Creating Slack messenger for {}", settings.api_url);
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &SlackSettings {
        &self.settings
    }

    /// Post one message, reporting any failure.
    pub async fn post(&self, channel: &str, message: &str) -> Result<(), SlackError> {
        let form = [
            ("token", self.settings.token.as_str()),
            ("channel", channel),
            ("username", self.settings.bot_name.as_str()),
            ("text", message),
        ];

        let response = self
            .client
            .post(&self.settings.api_url)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SlackError::Status(status.as_u16()));
        }
        Ok(())
    }
}

impl Messenger for SlackMessenger {
    async fn send(&self, channel: &str, message: &str) {
        match self.post(channel, message).await {
            Ok(()) => info!(channel, "Sent notification: {}", message),
            Err(e) => error!(channel, "Failed to send notification: {}", e),
        }
    }
}
