//! Depth Command - masked surface area

use std::path::PathBuf;

use clap::Args;
use heatscape_services::{DepthClient, ImageUpload};

use crate::config::Settings;
use crate::error::{CliError, CliResult};
use crate::output::json;

/// Estimate the surface area of the masked region of an image
#[derive(Debug, Args)]
pub struct DepthCommand {
    /// Image file
    pub image: PathBuf,

    /// Binary mask of the region to measure
    pub mask: PathBuf,

    /// Print compact JSON (one line)
    #[arg(long)]
    pub compact: bool,
}

impl DepthCommand {
    pub async fn execute(self, settings: &Settings) -> CliResult<()> {
        let client =
            DepthClient::from_config(&settings.services).map_err(CliError::service("depth"))?;
        let image = ImageUpload::from_path(&self.image)
            .await
            .map_err(CliError::service("depth"))?;
        let mask = ImageUpload::from_path(&self.mask)
            .await
            .map_err(CliError::service("depth"))?;

        let result = client
            .masked_surface_area(image, mask)
            .await
            .map_err(CliError::service("depth"))?;
        json::print_json(&result, self.compact)?;
        Ok(())
    }
}
