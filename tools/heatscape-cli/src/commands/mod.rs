//! CLI Command Implementations

pub mod align;
pub mod depth;
pub mod monitor;
pub mod predict;
pub mod recommend;
pub mod send;
pub mod temperature;

use std::time::Duration;

use heatscape_link::{DeviceLink, DeviceLinkBuilder, LinkConfig};
use tokio::time::timeout;

use crate::error::{CliError, CliResult};

/// Build a link and wait for the socket to open.
pub(crate) async fn connect(config: &LinkConfig, wait_secs: u64) -> CliResult<DeviceLink> {
    let link = DeviceLinkBuilder::from_config(config.clone()).build();
    match timeout(Duration::from_secs(wait_secs), link.wait_until_open()).await {
        Ok(result) => result?,
        Err(_) => {
            link.shutdown();
            return Err(CliError::connect_timeout(link.url(), wait_secs));
        }
    }
    Ok(link)
}

/// Close the link and give the supervisor a moment to finish writing.
pub(crate) async fn disconnect(link: &DeviceLink) {
    link.shutdown();
    if timeout(Duration::from_secs(2), link.stopped()).await.is_err() {
        tracing::warn!("Device link did not stop within 2s");
    }
}

/// Resolves on the first Ctrl+C.
pub(crate) fn ctrl_c() -> tokio::sync::oneshot::Receiver<()> {
    let (cancel_tx, cancel_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(());
        }
    });
    cancel_rx
}
