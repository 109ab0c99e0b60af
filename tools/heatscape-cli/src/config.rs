//! Settings file and command-line overrides.
//!
//! ```toml
//! [link]
//! url = "ws://192.168.4.1:81"
//! reconnect_delay_ms = 5000
//!
//! [services]
//! matcher_url = "http://10.0.0.5:8000"
//!
//! [align]
//! poll_interval_ms = 1000
//! invert_pan = true
//! ```
//!
//! Missing tables and keys keep their defaults. Flags and `HEATSCAPE_*`
//! environment variables win over the file.

use std::path::Path;

use anyhow::Context;
use heatscape_link::{AlignConfig, LinkConfig};
use heatscape_services::ServiceConfig;
use serde::Deserialize;

use crate::error::{CliError, CliResult};

/// Everything the subcommands need to reach the vehicle and the services.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub link: LinkConfig,
    pub services: ServiceConfig,
    pub align: AlignConfig,
}

/// Endpoint overrides from flags or the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub device_url: Option<String>,
    pub inference_url: Option<String>,
    pub depth_url: Option<String>,
    pub matcher_url: Option<String>,
}

impl Settings {
    /// Load the settings file if one was given, then apply overrides.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> CliResult<Self> {
        let mut settings = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading settings file {}", path.display()))?;
                Self::parse(&text).map_err(|e| CliError::invalid_config(path, e))?
            }
            None => Self::default(),
        };
        settings.apply(overrides);
        Ok(settings)
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    fn apply(&mut self, overrides: Overrides) {
        if let Some(url) = overrides.device_url {
            self.link.url = url;
        }
        if let Some(url) = overrides.inference_url {
            self.services.inference_url = url;
        }
        if let Some(url) = overrides.depth_url {
            self.services.depth_url = url;
        }
        if let Some(url) = overrides.matcher_url {
            self.services.matcher_url = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_partial_file() {
        let settings = Settings::parse(
            r#"
            [link]
            url = "ws://192.168.4.1:81"
            reconnect_delay_ms = 2000

            [align]
            invert_pan = true
            "#,
        )
        .unwrap();

        assert_eq!(settings.link.url, "ws://192.168.4.1:81");
        assert_eq!(settings.link.reconnect_delay, Duration::from_secs(2));
        assert_eq!(settings.link.min_command_interval, Duration::from_millis(100));
        assert!(settings.align.invert_pan);
        assert_eq!(settings.services, ServiceConfig::default());
    }

    #[test]
    fn test_overrides_win() {
        let mut settings = Settings::parse("[services]\ndepth_url = \"http://a:1\"\n").unwrap();
        settings.apply(Overrides {
            depth_url: Some("http://b:2".to_string()),
            device_url: Some("ws://car:81".to_string()),
            ..Overrides::default()
        });
        assert_eq!(settings.services.depth_url, "http://b:2");
        assert_eq!(settings.link.url, "ws://car:81");
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Settings::parse("").unwrap(), Settings::default());
    }

    #[test]
    fn test_bad_type_is_rejected() {
        assert!(Settings::parse("[link]\nreconnect_delay_ms = \"soon\"\n").is_err());
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let path = std::env::temp_dir().join("heatscape-no-such-settings.toml");
        let err = Settings::load(Some(&path), Overrides::default()).unwrap_err();
        assert!(matches!(err, CliError::Other(_)));
        assert_eq!(
            err.to_string(),
            format!("reading settings file {}", path.display())
        );
    }
}
