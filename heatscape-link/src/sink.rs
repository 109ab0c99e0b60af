//! The seam between command producers and the transport.

use std::sync::Arc;

use heatscape_protocol::Command;

use crate::error::LinkResult;

/// Something that can put a command on the wire right now.
///
/// Implemented by [`DeviceLink`](crate::DeviceLink) (direct send, no rate
/// limiting). The rate limiter and the alignment loop are generic over it.
pub trait CommandSink: Send + Sync + 'static {
    fn send_command(&self, command: Command) -> LinkResult<()>;
}

impl<T: CommandSink> CommandSink for Arc<T> {
    fn send_command(&self, command: Command) -> LinkResult<()> {
        (**self).send_command(command)
    }
}
