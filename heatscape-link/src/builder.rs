//! Builder for the device link.
//!
//! # Lifecycle
//!
//! ```text
//! DeviceLinkBuilder::build()
//!   ├─ create telemetry store + operator log
//!   ├─ create outbound / control channels
//!   ├─ spawn supervisor (connect, pump frames, reconnect)
//!   └─ return DeviceLink handle
//! ```

use std::time::Duration;

use heatscape_protocol::Command;
use tokio::sync::{mpsc, watch};

use crate::config::LinkConfig;
use crate::connection::{ConnectionState, Supervisor};
use crate::link::{DeviceLink, Outbound};
use crate::log::OperatorLog;
use crate::telemetry::TelemetryStore;

/// Builder for a [`DeviceLink`].
///
/// # Example
///
/// ```rust,ignore
/// use heatscape_link::DeviceLinkBuilder;
///
/// let link = DeviceLinkBuilder::new("ws://esp32.local:81")
///     .with_reconnect_delay(Duration::from_secs(5))
///     .with_min_command_interval(Duration::from_millis(100))
///     .build();
///
/// link.wait_until_open().await?;
/// link.submit(Command::Forward).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DeviceLinkBuilder {
    config: LinkConfig,
}

impl DeviceLinkBuilder {
    /// Create a builder targeting the given WebSocket URL with default settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            config: LinkConfig {
                url: url.into(),
                ..LinkConfig::default()
            },
        }
    }

    /// Start from a full configuration (e.g. loaded from a file).
    pub fn from_config(config: LinkConfig) -> Self {
        Self { config }
    }

    /// Fixed delay before reconnecting after an unexpected close (default: 5 s).
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.config.reconnect_delay = delay;
        self
    }

    /// Minimum spacing between motion commands (default: 100 ms).
    pub fn with_min_command_interval(mut self, interval: Duration) -> Self {
        self.config.min_command_interval = interval;
        self
    }

    /// Commands sent right after the socket opens (default: `GET_CAM_IP`).
    pub fn with_on_open_commands(mut self, commands: impl IntoIterator<Item = Command>) -> Self {
        self.config.on_open_commands = commands.into_iter().map(|c| c.encode()).collect();
        self
    }

    /// Log high-rate IMU frames to the operator log (default: `false`).
    pub fn with_imu_logging(mut self, enabled: bool) -> Self {
        self.config.log_imu_frames = enabled;
        self
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Spawn the supervisor and return the link handle.
    ///
    /// Must be called from within a tokio runtime. Connection happens in
    /// the background; use [`DeviceLink::wait_until_open`] to wait for it.
    pub fn build(self) -> DeviceLink {
        let telemetry = TelemetryStore::new();
        let log = OperatorLog::new();

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        let outbound = Outbound {
            url: self.config.url.clone(),
            tx: outbound_tx,
            state: state_rx,
        };
        let link = DeviceLink::new(
            outbound,
            self.config.min_command_interval,
            control_tx,
            telemetry.clone(),
            log.clone(),
        );

        #[cfg(feature = "tracing")]
        tracing::info!("Device link: starting supervisor for {}", self.config.url);

        tokio::spawn(
            Supervisor {
                config: self.config,
                outbound_rx,
                control_rx,
                state_tx,
                telemetry,
                log,
            }
            .run(),
        );

        link
    }
}
