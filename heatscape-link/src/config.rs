//! Configuration for the device link
//!
//! Durations are expressed in milliseconds when (de)serialized, so a TOML
//! table reads naturally:
//!
//! ```toml
//! [link]
//! url = "ws://esp32.local:81"
//! reconnect_delay_ms = 5000
//! min_command_interval_ms = 100
//! on_open_commands = ["GET_CAM_IP"]
//! ```

use std::time::Duration;

use heatscape_protocol::{Command, DEFAULT_DEVICE_URL};
use serde::{Deserialize, Serialize};

/// Device link configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// WebSocket address of the vehicle controller
    pub url: String,

    /// Fixed delay before reconnecting after an unexpected close
    #[serde(rename = "reconnect_delay_ms", with = "duration_ms")]
    pub reconnect_delay: Duration,

    /// Minimum spacing between two motion commands
    #[serde(rename = "min_command_interval_ms", with = "duration_ms")]
    pub min_command_interval: Duration,

    /// Commands sent as soon as the socket opens (status request)
    pub on_open_commands: Vec<String>,

    /// Append high-rate `GYRO_DATA` frames to the operator log
    pub log_imu_frames: bool,
}

impl Default for LinkConfig {
    /// # Defaults
    /// - URL: `ws://esp32.local:81`
    /// - Reconnect delay: 5 s
    /// - Minimum command interval: 100 ms
    /// - On open: `GET_CAM_IP`
    /// - IMU frames are not logged
    fn default() -> Self {
        Self {
            url: DEFAULT_DEVICE_URL.to_string(),
            reconnect_delay: Duration::from_secs(5),
            min_command_interval: Duration::from_millis(100),
            on_open_commands: vec![Command::GetCameraAddress.encode()],
            log_imu_frames: false,
        }
    }
}

impl LinkConfig {
    /// Parsed form of [`LinkConfig::on_open_commands`]
    pub fn open_commands(&self) -> Vec<Command> {
        self.on_open_commands
            .iter()
            .map(|c| Command::parse(c))
            .collect()
    }
}

/// Serde helper: `Duration` as integer milliseconds.
pub mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
