//! Predict Command - classify a thermal image

use std::path::PathBuf;

use clap::Args;
use heatscape_services::{ImageUpload, InferenceClient};

use crate::config::Settings;
use crate::error::{CliError, CliResult};
use crate::output::json;

/// Send an image to the inference service
#[derive(Debug, Args)]
pub struct PredictCommand {
    /// Image file to classify
    pub image: PathBuf,

    /// Print compact JSON (one line)
    #[arg(long)]
    pub compact: bool,
}

impl PredictCommand {
    pub async fn execute(self, settings: &Settings) -> CliResult<()> {
        let client = InferenceClient::from_config(&settings.services)
            .map_err(CliError::service("inference"))?;
        let image = ImageUpload::from_path(&self.image)
            .await
            .map_err(CliError::service("inference"))?;
        let result = client
            .predict(image)
            .await
            .map_err(CliError::service("inference"))?;
        json::print_json(&result, self.compact)?;
        Ok(())
    }
}
