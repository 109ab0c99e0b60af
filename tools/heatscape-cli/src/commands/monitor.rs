//! Monitor Command - live operator log and telemetry

use std::time::Duration;

use clap::Args;
use heatscape_link::DeviceLinkBuilder;
use tokio::sync::broadcast::error::RecvError;

use crate::commands::{ctrl_c, disconnect};
use crate::config::Settings;
use crate::error::CliResult;
use crate::output::live;

/// Stream the operator log until Ctrl+C
#[derive(Debug, Args)]
pub struct MonitorCommand {
    /// Also print a telemetry summary once per second
    #[arg(short, long)]
    pub telemetry: bool,

    /// Include high-rate GYRO_DATA frames in the log
    #[arg(long)]
    pub imu: bool,
}

impl MonitorCommand {
    pub async fn execute(self, settings: &Settings) -> CliResult<()> {
        let mut config = settings.link.clone();
        config.log_imu_frames |= self.imu;

        let link = DeviceLinkBuilder::from_config(config).build();
        let mut lines = link.log().subscribe();
        let mut telemetry = link.telemetry().subscribe();
        let mut summary = tokio::time::interval(Duration::from_secs(1));
        let mut cancel_rx = ctrl_c();

        live::print_monitor_start(link.url());

        loop {
            tokio::select! {
                line = lines.recv() => match line {
                    Ok(entry) => live::print_log_entry(&entry),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Operator log: {} line(s) skipped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = summary.tick(), if self.telemetry => {
                    if telemetry.has_changed().unwrap_or(false) {
                        live::print_telemetry(&telemetry.borrow_and_update());
                    }
                }
                _ = &mut cancel_rx => break,
            }
        }

        disconnect(&link).await;
        live::print_monitor_stop();
        Ok(())
    }
}
