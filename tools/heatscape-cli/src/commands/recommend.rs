//! Recommend Command - ask for a repair recommendation

use clap::Args;
use heatscape_services::InferenceClient;
use serde_json::Value;

use crate::config::Settings;
use crate::error::{CliError, CliResult};
use crate::output::json;

/// Post a JSON request (usually a prediction) to the recommendation endpoint
#[derive(Debug, Args)]
pub struct RecommendCommand {
    /// Request body as JSON
    pub request: String,

    /// Print compact JSON (one line)
    #[arg(long)]
    pub compact: bool,
}

impl RecommendCommand {
    pub async fn execute(self, settings: &Settings) -> CliResult<()> {
        let request: Value = serde_json::from_str(&self.request)
            .map_err(|e| CliError::invalid_json(&self.request, e))?;

        let client = InferenceClient::from_config(&settings.services)
            .map_err(CliError::service("inference"))?;
        let result = client
            .recommend(&request)
            .await
            .map_err(CliError::service("inference"))?;
        json::print_json(&result, self.compact)?;
        Ok(())
    }
}
