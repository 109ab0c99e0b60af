//! # heatscape-link
//!
//! WebSocket link between the operator station and the HeatScape vehicle
//! controller.
//!
//! The link owns one socket at a time and keeps it alive with a fixed-delay
//! reconnect. Incoming text frames are decoded into [`DeviceMessage`]s and
//! folded into a [`TelemetryStore`]; every frame in either direction is
//! appended to the [`OperatorLog`]. Outgoing motion commands pass through a
//! coalescing [`CommandRateLimiter`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use heatscape_link::{DeviceLinkBuilder, Command};
//!
//! let link = DeviceLinkBuilder::new("ws://esp32.local:81").build();
//! link.wait_until_open().await?;
//!
//! link.submit(Command::Forward).await?;
//! link.request_temperature()?;
//!
//! let mut telemetry = link.telemetry().subscribe();
//! telemetry.changed().await?;
//! println!("{:?}", telemetry.borrow().temperature);
//! ```
//!
//! ## Camera alignment
//!
//! See [`align`] for the search / center / confirm loop that drives the
//! camera servos from an external frame matcher.
//!
//! ## Features
//!
//! - **`tracing`** (default): structured diagnostics via the `tracing` crate

// ════════════════════════════════════════════════════════════════════
// Modules
// ════════════════════════════════════════════════════════════════════

pub mod align;
pub mod builder;
pub mod config;
pub mod connection;
pub mod error;
pub(crate) mod handler;
pub mod limiter;
pub mod link;
pub mod log;
pub mod sink;
pub mod telemetry;

// ════════════════════════════════════════════════════════════════════
// Public re-exports
// ════════════════════════════════════════════════════════════════════

pub use heatscape_protocol as protocol;
pub use heatscape_protocol::{Command, CommandClass, DeviceMessage};

pub use align::{
    AlignConfig, Aligner, AlignmentHandle, AlignmentOutcome, AlignmentState, AlignmentStatus,
    AlignmentTask, FrameMatcher, Keypoint, MatchReport,
};
pub use builder::DeviceLinkBuilder;
pub use config::LinkConfig;
pub use connection::{ConnectionState, ReconnectPolicy};
pub use error::{LinkError, LinkResult};
pub use limiter::{CommandRateLimiter, Dispatch};
pub use link::DeviceLink;
pub use log::{Direction, LogEntry, OperatorLog};
pub use sink::CommandSink;
pub use telemetry::{NavigationState, Telemetry, TelemetryStore};
