//! Connection supervisor.
//!
//! A single task owns the WebSocket and `select!`s over socket reads, the
//! outbound command channel and the control channel. A fresh socket is
//! created on every (re)connect; the old one is never reused.
//!
//! # Reconnect policy
//!
//! ```text
//! Connecting ──ok──► Open ──clean close──► Closed (wait for operator)
//!     │               │
//!     │ fail          │ error / drop
//!     ▼               ▼
//!   Closed ──fixed delay──► Connecting
//! ```
//!
//! An unexpected close schedules exactly one reconnect after the fixed
//! delay. Retries are unbounded, with no growth and no jitter. A clean close
//! (peer sent a Close frame) schedules nothing; the operator must call
//! [`DeviceLink::reconnect`](crate::DeviceLink::reconnect).

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use heatscape_protocol::Command;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;

use crate::config::LinkConfig;
use crate::handler::handle_frame;
use crate::log::{Direction, OperatorLog};
use crate::telemetry::TelemetryStore;

// ════════════════════════════════════════════════════════════════════
// State & policy
// ════════════════════════════════════════════════════════════════════

/// Connection state of the device link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// Fixed-delay reconnect rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
}

impl ReconnectPolicy {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Delay before the next attempt after a close, or `None` when the
    /// close was clean and no reconnect should be scheduled.
    pub fn after_close(&self, clean: bool) -> Option<Duration> {
        if clean {
            None
        } else {
            Some(self.delay)
        }
    }
}

/// Operator requests to the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Control {
    Reconnect,
    Shutdown,
}

/// How one connection session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Closed { clean: bool },
    ManualReconnect,
    Shutdown,
}

// ════════════════════════════════════════════════════════════════════
// Supervisor
// ════════════════════════════════════════════════════════════════════

pub(crate) struct Supervisor {
    pub config: LinkConfig,
    pub outbound_rx: mpsc::UnboundedReceiver<Command>,
    pub control_rx: mpsc::UnboundedReceiver<Control>,
    pub state_tx: watch::Sender<ConnectionState>,
    pub telemetry: TelemetryStore,
    pub log: OperatorLog,
}

impl Supervisor {
    /// Run until shutdown or until every link handle is dropped.
    pub async fn run(mut self) {
        let policy = ReconnectPolicy::new(self.config.reconnect_delay);

        loop {
            let end = self.run_session().await;
            self.set_state(ConnectionState::Closed);
            self.discard_stale_outbound();

            let delay = match end {
                SessionEnd::Shutdown => break,
                SessionEnd::ManualReconnect => continue,
                SessionEnd::Closed { clean } => policy.after_close(clean),
            };

            match delay {
                Some(delay) => {
                    #[cfg(feature = "tracing")]
                    tracing::info!("Device link: reconnecting in {:?}", delay);
                    self.log.append(
                        Direction::System,
                        format!("Reconnecting in {} ms", delay.as_millis()),
                    );

                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        control = self.control_rx.recv() => match control {
                            Some(Control::Reconnect) => {}
                            Some(Control::Shutdown) | None => break,
                        },
                    }
                }
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::info!("Device link: closed cleanly, waiting for manual reconnect");
                    self.log
                        .append(Direction::System, "Connection closed by device");

                    match self.control_rx.recv().await {
                        Some(Control::Reconnect) => {}
                        Some(Control::Shutdown) | None => break,
                    }
                }
            }
        }

        self.set_state(ConnectionState::Closed);
        #[cfg(feature = "tracing")]
        tracing::info!("Device link: supervisor stopped");
    }

    /// One connection: connect, announce, then pump frames until it ends.
    async fn run_session(&mut self) -> SessionEnd {
        self.set_state(ConnectionState::Connecting);

        let url = self.config.url.clone();
        let connected = tokio::select! {
            result = tokio_tungstenite::connect_async(url.as_str()) => result,
            control = self.control_rx.recv() => {
                return match control {
                    Some(Control::Reconnect) => SessionEnd::ManualReconnect,
                    Some(Control::Shutdown) | None => SessionEnd::Shutdown,
                };
            }
        };

        let ws_stream = match connected {
            Ok((ws_stream, _response)) => ws_stream,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Device link: connection to {} failed: {}", url, e);
                self.log
                    .append(Direction::System, format!("Connection failed: {e}"));
                return SessionEnd::Closed { clean: false };
            }
        };

        let (mut ws_write, mut ws_read) = ws_stream.split();

        self.set_state(ConnectionState::Open);
        #[cfg(feature = "tracing")]
        tracing::info!("Device link: connected to {}", url);
        self.log
            .append(Direction::System, format!("Connected to {url}"));

        // Status request
        for command in self.config.open_commands() {
            let text = command.encode();
            if let Err(e) = ws_write.send(Message::Text(text.clone().into())).await {
                return self.transport_error(e);
            }
            self.log.append(Direction::Outbound, text);
        }

        loop {
            tokio::select! {
                incoming = ws_read.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        handle_frame(
                            text.as_str(),
                            &self.telemetry,
                            &self.log,
                            self.config.log_imu_frames,
                        );
                    }
                    Some(Ok(Message::Close(_frame))) => {
                        #[cfg(feature = "tracing")]
                        tracing::info!("Device link: received close frame {:?}", _frame);
                        // Push out the queued close reply before the socket drops
                        let _ = ws_write.flush().await;
                        return SessionEnd::Closed { clean: true };
                    }
                    // Ping/pong are answered by tungstenite; binary is not used
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return self.transport_error(e),
                    None => {
                        self.log.append(Direction::System, "Connection lost");
                        return SessionEnd::Closed { clean: false };
                    }
                },
                outbound = self.outbound_rx.recv() => match outbound {
                    Some(command) => {
                        let text = command.encode();
                        if let Err(e) = ws_write.send(Message::Text(text.clone().into())).await {
                            return self.transport_error(e);
                        }
                        self.log.append(Direction::Outbound, text);
                    }
                    // Every link handle dropped
                    None => {
                        let _ = ws_write.send(Message::Close(None)).await;
                        return SessionEnd::Shutdown;
                    }
                },
                control = self.control_rx.recv() => {
                    let end = match control {
                        Some(Control::Reconnect) => {
                            self.log.append(Direction::System, "Manual reconnect");
                            SessionEnd::ManualReconnect
                        }
                        Some(Control::Shutdown) | None => {
                            // Commands accepted before the shutdown still go out
                            while let Ok(command) = self.outbound_rx.try_recv() {
                                let text = command.encode();
                                if ws_write.send(Message::Text(text.clone().into())).await.is_err() {
                                    break;
                                }
                                self.log.append(Direction::Outbound, text);
                            }
                            SessionEnd::Shutdown
                        }
                    };
                    let _ = ws_write.send(Message::Close(None)).await;
                    return end;
                }
            }
        }
    }

    /// Readiness drops immediately on a transport error; the reconnect is
    /// driven by the resulting close.
    fn transport_error(&self, e: tokio_tungstenite::tungstenite::Error) -> SessionEnd {
        self.set_state(ConnectionState::Closed);
        #[cfg(feature = "tracing")]
        tracing::warn!("Device link: transport error: {}", e);
        self.log
            .append(Direction::System, format!("Connection error: {e}"));
        SessionEnd::Closed { clean: false }
    }

    /// Commands that raced a close are dropped, not replayed on the next socket.
    fn discard_stale_outbound(&mut self) {
        let mut dropped = 0usize;
        while let Ok(_command) = self.outbound_rx.try_recv() {
            dropped += 1;
        }
        if dropped > 0 {
            #[cfg(feature = "tracing")]
            tracing::warn!("Device link: dropped {} unsent commands", dropped);
            self.log.append(
                Direction::System,
                format!("Dropped {dropped} unsent command(s): link closed"),
            );
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}
