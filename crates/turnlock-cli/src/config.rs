use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, bail};
use serde::Deserialize;
use turnlock_controller::LockConfig;
use turnlock_notify::{
    AnyMessenger, DEFAULT_BOT_NAME, DEFAULT_TIMEOUT_MS, LogMessenger, SlackMessenger, SlackSettings,
};

const DEFAULT_CONFIG_PATH: &str = "turnlock.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SlackSection {
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub bot_name: String,
    pub timeout_ms: u64,
}

impl Default for SlackSection {
    fn default() -> Self {
        Self {
            api_url: None,
            token: None,
            bot_name: DEFAULT_BOT_NAME.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Simulate a bolt that drags each mechanism along with the other.
    pub coupled: bool,
    pub slack: SlackSection,
    pub lock: LockConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            coupled: true,
            slack: SlackSection::default(),
            lock: LockConfig::default(),
        }
    }
}

impl Settings {
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply overrides looked up through `var`, normally the process
    /// environment.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(v) = var("SLACK_API_URL") {
            self.slack.api_url = Some(v);
        }
        if let Some(v) = var("SLACK_TOKEN") {
            self.slack.token = Some(v);
        }
        if let Some(v) = var("SLACK_BOT_NAME") {
            self.slack.bot_name = v;
        }
        if let Some(v) = var("SLACK_REMINDER_CHANNEL") {
            self.lock.reminder.channel = v;
        }
        if let Some(v) = var("REMINDER_TIMEOUT_SECS") {
            self.lock.reminder.timeout_secs = v
                .trim()
                .parse()
                .with_context(|| format!("REMINDER_TIMEOUT_SECS is not a number: {v}"))?;
        }
        if let Some(v) = var("TURNLOCK_COUPLED") {
            self.coupled = parse_flag(&v).context("TURNLOCK_COUPLED")?;
        }
        Ok(())
    }

    /// Slack settings, when both the endpoint and the token are set.
    pub fn slack_settings(&self) -> Option<SlackSettings> {
        let api_url = self.slack.api_url.as_deref().filter(|v| !v.trim().is_empty())?;
        let token = self.slack.token.as_deref().filter(|v| !v.trim().is_empty())?;

        Some(
            SlackSettings::new(api_url, token)
                .with_bot_name(self.slack.bot_name.clone())
                .with_timeout(Duration::from_millis(self.slack.timeout_ms)),
        )
    }

    pub fn messenger(&self) -> anyhow::Result<AnyMessenger> {
        match self.slack_settings() {
            Some(settings) => Ok(SlackMessenger::new(settings)
                .context("failed to build Slack client")?
                .into()),
            None => Ok(LogMessenger::new().into()),
        }
    }
}

fn parse_flag(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got {other:?}"),
    }
}

pub fn config_path() -> PathBuf {
    std::env::var_os("TURNLOCK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn read_file(path: &Path) -> anyhow::Result<Settings> {
    match fs::read_to_string(path) {
        Ok(raw) => Settings::from_toml(&raw)
            .with_context(|| format!("failed to parse {}", path.display())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Settings::default()),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = read_file(&config_path())?;
    settings.apply_overrides(|name| std::env::var(name).ok())?;
    settings
        .lock
        .validate()
        .context("invalid lock configuration")?;
    Ok(settings)
}
