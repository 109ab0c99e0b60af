//! HeatScape CLI - operator console for the HeatScape inspection vehicle
//!
//! Drives the vehicle over its WebSocket link, watches telemetry, runs camera
//! alignment and calls the companion inference, depth and matcher services.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::{
    align::AlignCommand, depth::DepthCommand, monitor::MonitorCommand,
    predict::PredictCommand, recommend::RecommendCommand, send::SendCommand,
    temperature::TemperatureCommand,
};
use config::{Overrides, Settings};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod error;
mod output;

/// HeatScape CLI - drive the vehicle and call the inspection services
#[derive(Debug, Parser)]
#[command(name = "heatscape")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Vehicle controller WebSocket address
    #[arg(long, global = true, env = "HEATSCAPE_DEVICE_URL")]
    device_url: Option<String>,

    /// Inference service base URL
    #[arg(long, global = true, env = "HEATSCAPE_INFERENCE_URL")]
    inference_url: Option<String>,

    /// Depth service base URL
    #[arg(long, global = true, env = "HEATSCAPE_DEPTH_URL")]
    depth_url: Option<String>,

    /// Frame matcher base URL
    #[arg(long, global = true, env = "HEATSCAPE_MATCHER_URL")]
    matcher_url: Option<String>,

    /// Settings file with [link], [services] and [align] tables
    #[arg(short, long, global = true, env = "HEATSCAPE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Stream the operator log (and telemetry) live
    #[command(name = "monitor")]
    Monitor(MonitorCommand),

    /// Send commands to the vehicle
    #[command(name = "send")]
    Send(SendCommand),

    /// Request a temperature reading
    #[command(name = "temperature")]
    Temperature(TemperatureCommand),

    /// Align the camera to a reference scene
    #[command(name = "align")]
    Align(AlignCommand),

    /// Classify a thermal image
    #[command(name = "predict")]
    Predict(PredictCommand),

    /// Get a recommendation for a prediction
    #[command(name = "recommend")]
    Recommend(RecommendCommand),

    /// Estimate masked surface area
    #[command(name = "depth")]
    Depth(DepthCommand),
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "heatscape=debug,heatscape_link=debug,heatscape_services=debug"
    } else {
        "heatscape=info,heatscape_link=info,heatscape_services=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let overrides = Overrides {
        device_url: cli.device_url,
        inference_url: cli.inference_url,
        depth_url: cli.depth_url,
        matcher_url: cli.matcher_url,
    };
    let settings = match Settings::load(cli.config.as_deref(), overrides) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Monitor(cmd) => cmd.execute(&settings).await,
        Command::Send(cmd) => cmd.execute(&settings).await,
        Command::Temperature(cmd) => cmd.execute(&settings).await,
        Command::Align(cmd) => cmd.execute(&settings).await,
        Command::Predict(cmd) => cmd.execute(&settings).await,
        Command::Recommend(cmd) => cmd.execute(&settings).await,
        Command::Depth(cmd) => cmd.execute(&settings).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "heatscape",
            "send",
            "forward",
            "H_TURN_CAM:45",
            "--device-url",
            "ws://192.168.4.1:81",
        ])
        .unwrap();
        assert_eq!(cli.device_url.as_deref(), Some("ws://192.168.4.1:81"));
        match cli.command {
            Command::Send(cmd) => assert_eq!(cmd.commands, vec!["forward", "H_TURN_CAM:45"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_compact_and_config_flags_together() {
        let cli = Cli::try_parse_from([
            "heatscape",
            "predict",
            "roof.jpg",
            "--compact",
            "-c",
            "heatscape.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("heatscape.toml")));
        match cli.command {
            Command::Predict(cmd) => {
                assert!(cmd.compact);
                assert_eq!(cmd.image, PathBuf::from("roof.jpg"));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["heatscape", "depth", "wall.png", "mask.png", "--compact"])
            .unwrap();
        assert!(matches!(cli.command, Command::Depth(cmd) if cmd.compact));
    }

    #[test]
    fn test_send_requires_a_command() {
        assert!(Cli::try_parse_from(["heatscape", "send"]).is_err());
    }
}
