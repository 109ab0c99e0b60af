//! The device link handle.

use std::sync::Arc;

use heatscape_protocol::Command;
use tokio::sync::{mpsc, watch};

use crate::connection::{Control, ConnectionState};
use crate::error::{LinkError, LinkResult};
use crate::limiter::{CommandRateLimiter, Dispatch};
use crate::log::OperatorLog;
use crate::sink::CommandSink;
use crate::telemetry::TelemetryStore;

/// Direct path to the supervisor's outbound channel, gated on readiness.
pub(crate) struct Outbound {
    pub url: String,
    pub tx: mpsc::UnboundedSender<Command>,
    pub state: watch::Receiver<ConnectionState>,
}

impl CommandSink for Outbound {
    fn send_command(&self, command: Command) -> LinkResult<()> {
        if *self.state.borrow() != ConnectionState::Open {
            return Err(LinkError::not_connected(&self.url, command.encode()));
        }
        self.tx.send(command).map_err(|_| LinkError::Closed)
    }
}

/// Live connection to the vehicle controller.
///
/// Created by [`DeviceLinkBuilder::build()`](crate::DeviceLinkBuilder::build).
/// Cheap to clone; all clones share one socket, one telemetry store and one
/// operator log. The supervisor stops when [`shutdown`](Self::shutdown) is
/// called or the last clone is dropped.
#[derive(Clone)]
pub struct DeviceLink {
    outbound: Arc<Outbound>,
    limiter: CommandRateLimiter<Outbound>,
    control: mpsc::UnboundedSender<Control>,
    state: watch::Receiver<ConnectionState>,
    telemetry: TelemetryStore,
    log: OperatorLog,
}

impl DeviceLink {
    pub(crate) fn new(
        outbound: Outbound,
        limiter_interval: std::time::Duration,
        control: mpsc::UnboundedSender<Control>,
        telemetry: TelemetryStore,
        log: OperatorLog,
    ) -> Self {
        let state = outbound.state.clone();
        let outbound = Arc::new(outbound);
        let limiter = CommandRateLimiter::new(outbound.clone(), limiter_interval);
        Self {
            outbound,
            limiter,
            control,
            state,
            telemetry,
            log,
        }
    }

    /// Device address this link connects to.
    pub fn url(&self) -> &str {
        &self.outbound.url
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// `true` while the socket is open.
    pub fn is_ready(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Observe connection state changes.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Wait until the socket is open.
    ///
    /// Returns [`LinkError::Closed`] if the supervisor stops first.
    pub async fn wait_until_open(&self) -> LinkResult<()> {
        let mut state = self.state.clone();
        state
            .wait_for(|s| *s == ConnectionState::Open)
            .await
            .map(|_| ())
            .map_err(|_| LinkError::Closed)
    }

    /// Send through the rate limiter (operator input path).
    pub async fn submit(&self, command: Command) -> LinkResult<Dispatch> {
        self.limiter.submit(command).await
    }

    /// Send immediately, bypassing the rate limiter.
    pub fn send_now(&self, command: Command) -> LinkResult<()> {
        self.outbound.send_command(command)
    }

    /// Request a fresh temperature sample set.
    ///
    /// Sets the "collecting" flag until the next `TEMP_DATA` frame arrives.
    pub fn request_temperature(&self) -> LinkResult<()> {
        self.telemetry.begin_temperature_collection();
        self.send_now(Command::GetTemperature).inspect_err(|_| {
            self.telemetry.cancel_temperature_collection();
        })
    }

    /// Drop the current socket (if any) and connect again now.
    ///
    /// Also cancels a pending automatic reconnect timer.
    pub fn reconnect(&self) -> LinkResult<()> {
        self.control
            .send(Control::Reconnect)
            .map_err(|_| LinkError::Closed)
    }

    /// Close the socket and stop the supervisor. No reconnect follows.
    ///
    /// Commands already handed to the link are written before the close.
    pub fn shutdown(&self) {
        let _ = self.control.send(Control::Shutdown);
    }

    /// Resolves once the supervisor has stopped.
    pub async fn stopped(&self) {
        let mut state = self.state.clone();
        while state.changed().await.is_ok() {}
    }

    pub fn telemetry(&self) -> &TelemetryStore {
        &self.telemetry
    }

    pub fn log(&self) -> &OperatorLog {
        &self.log
    }
}

impl CommandSink for DeviceLink {
    fn send_command(&self, command: Command) -> LinkResult<()> {
        self.send_now(command)
    }
}

impl std::fmt::Debug for DeviceLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceLink")
            .field("url", &self.outbound.url)
            .field("state", &self.state())
            .finish()
    }
}
