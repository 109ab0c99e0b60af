//! Align Command - point the camera at a reference scene

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use heatscape_link::{AlignmentOutcome, AlignmentTask, DeviceLink};
use heatscape_services::{ImageUpload, MatcherClient};
use tokio::time::timeout;

use crate::commands::{connect, ctrl_c, disconnect};
use crate::config::Settings;
use crate::error::{CliError, CliResult};
use crate::output::live;

/// Run camera auto-alignment against the frame matcher
#[derive(Debug, Args)]
pub struct AlignCommand {
    /// Reference image to upload before aligning
    #[arg(short, long)]
    pub reference: Option<PathBuf>,

    /// Camera stream address (default: the CAM_IP reported by the vehicle)
    #[arg(long)]
    pub camera_url: Option<String>,

    /// Seconds to wait for the connection and for CAM_IP
    #[arg(short, long, default_value = "10")]
    pub wait: u64,
}

impl AlignCommand {
    pub async fn execute(self, settings: &Settings) -> CliResult<()> {
        let matcher = MatcherClient::from_config(&settings.services)
            .map_err(CliError::service("matcher"))?;

        if let Some(path) = &self.reference {
            let image = ImageUpload::from_path(path)
                .await
                .map_err(CliError::service("matcher"))?;
            matcher
                .set_reference(image)
                .await
                .map_err(CliError::service("matcher"))?;
            println!("📷 Reference set from {}", path.display());
        }

        let link = connect(&settings.link, self.wait).await?;
        let result = self.run(&link, matcher, settings).await;
        disconnect(&link).await;

        live::print_alignment_outcome(result?);
        Ok(())
    }

    async fn run(
        &self,
        link: &DeviceLink,
        matcher: MatcherClient,
        settings: &Settings,
    ) -> CliResult<AlignmentOutcome> {
        let camera_url = match &self.camera_url {
            Some(url) => url.clone(),
            None => self.reported_camera_url(link).await?,
        };

        matcher
            .start_stream(&camera_url)
            .await
            .map_err(CliError::service("matcher"))?;
        println!("🎥 Matching stream from {}", camera_url);

        let handle = AlignmentTask::spawn(matcher.clone(), link.clone(), settings.align.clone());
        let mut status = handle.watch_status();
        let mut cancel_rx = ctrl_c();

        live::print_alignment(&status.borrow_and_update());
        let outcome = loop {
            tokio::select! {
                changed = status.changed() => {
                    if changed.is_err() {
                        break handle.wait().await;
                    }
                    live::print_alignment(&status.borrow_and_update());
                }
                _ = &mut cancel_rx => {
                    handle.stop();
                    break handle.wait().await;
                }
            }
        };

        if let Err(e) = matcher.stop_stream().await {
            tracing::warn!("Matcher: failed to stop stream: {}", e);
        }
        Ok(outcome)
    }

    /// Wait for the vehicle's `CAM_IP` report (requested on connect).
    async fn reported_camera_url(&self, link: &DeviceLink) -> CliResult<String> {
        let mut telemetry = link.telemetry().subscribe();
        let reported = timeout(
            Duration::from_secs(self.wait),
            telemetry.wait_for(|t| t.camera_address.is_some()),
        )
        .await;
        match reported {
            Ok(Ok(t)) => t.camera_url().ok_or(CliError::NoCameraAddress),
            Ok(Err(_)) | Err(_) => Err(CliError::NoCameraAddress),
        }
    }
}
