//! Temperature Command - request and print one sample set

use std::time::Duration;

use clap::Args;
use tokio::time::timeout;

use crate::commands::{connect, disconnect};
use crate::config::Settings;
use crate::error::{CliError, CliResult};
use crate::output::{json, live};

/// Request a temperature reading and print it
#[derive(Debug, Args)]
pub struct TemperatureCommand {
    /// Seconds to wait for the connection and for the reply
    #[arg(short, long, default_value = "10")]
    pub wait: u64,

    /// Print the samples as JSON
    #[arg(long)]
    pub json: bool,
}

impl TemperatureCommand {
    pub async fn execute(self, settings: &Settings) -> CliResult<()> {
        let link = connect(&settings.link, self.wait).await?;
        let mut telemetry = link.telemetry().subscribe();

        link.request_temperature()?;
        let reply = timeout(
            Duration::from_secs(self.wait),
            telemetry.wait_for(|t| !t.collecting_temperature),
        )
        .await;

        let snapshot = match reply {
            Ok(Ok(snapshot)) => snapshot.clone(),
            Ok(Err(_)) | Err(_) => {
                disconnect(&link).await;
                return Err(CliError::no_reply("TEMP_DATA", self.wait));
            }
        };
        disconnect(&link).await;

        if self.json {
            json::print_json(&snapshot.temperature, false)?;
        } else {
            live::print_temperature(&snapshot);
        }
        Ok(())
    }
}
