//! Inbound frame handling: log, decode, apply.

use heatscape_protocol::decode::{decode, is_imu_frame};
use heatscape_protocol::DeviceMessage;

use crate::log::{Direction, OperatorLog};
use crate::telemetry::TelemetryStore;

/// Handle one text frame from the device.
///
/// Every frame is logged verbatim before decoding (including frames that
/// fail to decode), except IMU frames unless `log_imu` is set. Decode
/// failures are reported to the operator log and otherwise ignored.
pub(crate) fn handle_frame(
    frame: &str,
    telemetry: &TelemetryStore,
    log: &OperatorLog,
    log_imu: bool,
) {
    if log_imu || !is_imu_frame(frame) {
        log.append(Direction::Inbound, frame);
    }

    match decode(frame) {
        Ok(DeviceMessage::Unrecognized(_text)) => {
            #[cfg(feature = "tracing")]
            tracing::debug!("Device link: unrecognized frame: {}", _text);
        }
        Ok(message) => {
            #[cfg(feature = "tracing")]
            tracing::trace!("Device link: {} frame", message.kind());
            telemetry.apply(&message);
        }
        Err(e) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("Device link: discarding frame: {}", e);
            log.append(Direction::System, format!("Discarded frame: {e}"));
        }
    }
}
