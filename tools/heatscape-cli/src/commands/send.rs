//! Send Command - one-shot commands to the vehicle

use clap::Args;
use colored::Colorize;
use heatscape_link::{Command, Dispatch};

use crate::commands::{connect, disconnect};
use crate::config::Settings;
use crate::error::CliResult;

/// Send one or more commands, e.g. `heatscape send forward stop H_TURN_CAM:45`
#[derive(Debug, Args)]
pub struct SendCommand {
    /// Commands in wire form (forward, stop, H_TURN_CAM:90, SET_TARGET:{...})
    #[arg(required = true, num_args = 1..)]
    pub commands: Vec<String>,

    /// Seconds to wait for the connection
    #[arg(short, long, default_value = "10")]
    pub wait: u64,
}

impl SendCommand {
    pub async fn execute(self, settings: &Settings) -> CliResult<()> {
        let link = connect(&settings.link, self.wait).await?;

        let mut queued = false;
        for text in &self.commands {
            let command = Command::parse(text);
            if let Command::Raw(raw) = &command {
                tracing::warn!("'{}' is not a known command; sending as-is", raw);
            }
            let dispatch = link.submit(command.clone()).await?;
            queued |= dispatch == Dispatch::Queued;
            let label = match dispatch {
                Dispatch::Sent => "sent".green(),
                Dispatch::Queued => "queued".yellow(),
            };
            println!("→ {} ({})", command, label);
        }

        if queued {
            // Let the limiter flush the last queued motion command
            tokio::time::sleep(settings.link.min_command_interval * 2).await;
        }
        disconnect(&link).await;
        Ok(())
    }
}
