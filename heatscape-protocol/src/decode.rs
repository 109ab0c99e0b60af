//! Frame classification and payload parsing.
//!
//! A frame is classified by its leading prefix, exactly once. Payload JSON
//! that fails to parse is reported as a [`DecodeError`] instead of being
//! dropped or panicking.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use serde::de::DeserializeOwned;

use crate::message::{
    DeviceMessage, GpsFix, ImuSample, NavData, NavStatus, NavTarget, TempReading,
};

pub const GPS_PREFIX: &str = "GPS_DATA:";
pub const GYRO_PREFIX: &str = "GYRO_DATA:";
pub const TEMP_PREFIX: &str = "TEMP_DATA:";
pub const CAM_IP_PREFIX: &str = "CAM_IP:";
pub const NAV_PREFIX: &str = "NAV_DATA:";
pub const TARGET_SET_PREFIX: &str = "TARGET_SET:";
pub const TARGET_REACHED: &str = "TARGET_REACHED";
pub const AUTO_STOPPED: &str = "AUTO_STOPPED";

/// Errors produced while decoding a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The prefix was recognised but its JSON payload was not valid.
    InvalidPayload { prefix: &'static str, reason: String },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPayload { prefix, reason } => {
                write!(f, "invalid {} payload: {}", prefix.trim_end_matches(':'), reason)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

/// Decode one inbound text frame.
///
/// Surrounding whitespace (the firmware appends `\r\n` on some builds) is
/// ignored. Frames without a known prefix become
/// [`DeviceMessage::Unrecognized`].
pub fn decode(frame: &str) -> Result<DeviceMessage, DecodeError> {
    let frame = frame.trim();

    if let Some(body) = frame.strip_prefix(GPS_PREFIX) {
        return parse_json::<GpsFix>(GPS_PREFIX, body).map(DeviceMessage::Gps);
    }
    if let Some(body) = frame.strip_prefix(GYRO_PREFIX) {
        return parse_json::<ImuSample>(GYRO_PREFIX, body).map(DeviceMessage::Imu);
    }
    if let Some(body) = frame.strip_prefix(TEMP_PREFIX) {
        return parse_json::<Vec<f64>>(TEMP_PREFIX, body)
            .map(|samples| DeviceMessage::Temperature(TempReading::new(samples)));
    }
    if let Some(address) = frame.strip_prefix(CAM_IP_PREFIX) {
        return Ok(DeviceMessage::CameraAddress(address.trim().to_string()));
    }
    if let Some(body) = frame.strip_prefix(NAV_PREFIX) {
        return parse_json::<NavData>(NAV_PREFIX, body)
            .map(|data| DeviceMessage::Nav(NavStatus::Data(data)));
    }
    if let Some(body) = frame.strip_prefix(TARGET_SET_PREFIX) {
        return parse_json::<NavTarget>(TARGET_SET_PREFIX, body)
            .map(|target| DeviceMessage::Nav(NavStatus::TargetSet(target)));
    }
    if frame == TARGET_REACHED {
        return Ok(DeviceMessage::Nav(NavStatus::TargetReached));
    }
    if frame == AUTO_STOPPED {
        return Ok(DeviceMessage::Nav(NavStatus::AutoStopped));
    }

    Ok(DeviceMessage::Unrecognized(frame.to_string()))
}

/// Returns `true` for high-rate IMU frames (suppressed from operator logs).
pub fn is_imu_frame(frame: &str) -> bool {
    frame.trim_start().starts_with(GYRO_PREFIX)
}

fn parse_json<T: DeserializeOwned>(prefix: &'static str, body: &str) -> Result<T, DecodeError> {
    serde_json::from_str(body.trim()).map_err(|e| DecodeError::InvalidPayload {
        prefix,
        reason: e.to_string(),
    })
}

// ════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════
