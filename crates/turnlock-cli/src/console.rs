//! Line-oriented operator console.

use anyhow::{Context, bail};
use turnlock_controller::LockCoordinator;
use turnlock_core::{Color, LockStatus};
use turnlock_hardware::LedColor;
use turnlock_hardware::mock::MockHubHandle;

pub const HELP: &str = "\
commands:
  status                        lock status
  open | close                  drive the lock
  led [COLOR]                   show or set the indicator light
  turn-thumb <BLUE|RED|OTHER>   turn the thumbturn by hand
  turn-key <ANGLE>              turn the key by hand
  snapshot                      full lock state
  help
  quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Status,
    Set(LockStatus),
    Led(Option<LedColor>),
    TurnThumb(Color),
    TurnKey(i32),
    Snapshot,
    Help,
    Quit,
}

impl Command {
    /// Parse one console line. Blank lines yield `None`.
    pub fn parse(line: &str) -> anyhow::Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let arg = words.next();
        if let Some(extra) = words.next() {
            bail!("unexpected argument: {extra}");
        }

        let command = match (name.to_ascii_lowercase().as_str(), arg) {
            ("status", None) => Self::Status,
            ("open", None) => Self::Set(LockStatus::Open),
            ("close", None) => Self::Set(LockStatus::Closed),
            ("led", None) => Self::Led(None),
            ("led", Some(color)) => Self::Led(Some(color.parse()?)),
            ("turn-thumb", Some(color)) => Self::TurnThumb(color.parse()?),
            ("turn-key", Some(angle)) => Self::TurnKey(
                angle
                    .parse()
                    .with_context(|| format!("not an angle: {angle}"))?,
            ),
            ("snapshot", None) => Self::Snapshot,
            ("help", None) => Self::Help,
            ("quit" | "exit", None) => Self::Quit,
            (name, _) => bail!("unknown command or wrong arguments: {name} (try `help`)"),
        };
        Ok(Some(command))
    }

    /// Run the command and return the text to print.
    pub async fn execute(self, lock: &LockCoordinator, mock: &MockHubHandle) -> anyhow::Result<String> {
        Ok(match self {
            Self::Status => lock.status().await?.to_string(),
            Self::Set(target) => {
                let outcome = lock.set_status(target).await?;
                format!("{target}: {outcome}")
            }
            Self::Led(None) => lock.led_color().await?.to_string(),
            Self::Led(Some(color)) => {
                lock.set_led_color(color).await?;
                format!("led set to {color}")
            }
            Self::TurnThumb(color) => {
                mock.turn_thumb_turn_by_hand(color);
                format!("thumbturn shows {color}")
            }
            Self::TurnKey(angle) => {
                mock.turn_key_by_hand(angle);
                format!("key at {angle}°")
            }
            Self::Snapshot => lock.snapshot().await?.to_string(),
            Self::Help => HELP.to_string(),
            Self::Quit => String::new(),
        })
    }
}
