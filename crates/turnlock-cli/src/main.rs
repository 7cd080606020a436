use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use turnlock_controller::LockCoordinator;
use turnlock_hardware::mock::MockHub;

mod config;
mod console;

use config::{config_path, load_settings};
use console::{Command, HELP};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,turnlock=debug")),
        )
        .init();

    let settings = load_settings()?;
    info!(
        config = %config_path().display(),
        coupled = settings.coupled,
        slack = settings.slack_settings().is_some(),
        "Settings loaded"
    );

    let (hub, mock) = MockHub::builder().coupled(settings.coupled).build();
    let lock = LockCoordinator::start(hub.into(), settings.messenger()?, settings.lock.clone())
        .context("failed to start lock coordinator")?;

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read console input")? else {
                    break;
                };

                match Command::parse(&line) {
                    Ok(None) => {}
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => match command.execute(&lock, &mock).await {
                        Ok(output) => println!("{output}"),
                        Err(e) => error!("{:?} failed: {:#}", command, e),
                    },
                    Err(e) => println!("{e:#}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    lock.shutdown().await?;
    Ok(())
}
