//! # heatscape-protocol
//!
//! Wire protocol types for the HeatScape device link: the WebSocket channel
//! between an operator station and the ESP32 controller on the vehicle.
//!
//! This crate is `no_std + alloc` compatible so the same definitions can be
//! shared by the tokio link, the operator CLI and firmware-side tooling.
//!
//! # Wire Protocol
//!
//! Every frame is a plain text string. There is no envelope and no
//! correlation id: commands are fire-and-forget.
//!
//! ## Station → Device ([`Command`])
//!
//! - fixed tokens: `forward`, `backward`, `left`, `right`, `stop`,
//!   `emergency_stop`, `get_temp`, `GET_CAM_IP`, `START_AUTO`, `STOP_AUTO`
//! - directives: `H_TURN_CAM:<0-180>`, `V_TURN_CAM:<0-180>`,
//!   `SET_TARGET:{"lat":..,"lng":..}`
//!
//! ## Device → Station ([`DeviceMessage`])
//!
//! | Prefix           | Payload            |
//! |------------------|--------------------|
//! | `GPS_DATA:`      | JSON object        |
//! | `GYRO_DATA:`     | JSON object        |
//! | `TEMP_DATA:`     | JSON number array  |
//! | `CAM_IP:`        | raw address string |
//! | `NAV_DATA:`      | JSON object        |
//! | `TARGET_SET:`    | JSON object        |
//! | `TARGET_REACHED` | none               |
//! | `AUTO_STOPPED`   | none               |
//!
//! Frames are classified once, by leading prefix, in [`decode`].

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod command;
pub mod decode;
pub mod message;

pub use command::{Command, CommandClass, SERVO_MAX, SERVO_MIN};
pub use decode::{decode, DecodeError};
pub use message::{
    DeviceMessage, GpsFix, ImuSample, NavData, NavStatus, NavTarget, TempReading,
};

/// Default address of the vehicle controller on the local network.
pub const DEFAULT_DEVICE_URL: &str = "ws://esp32.local:81";

/// Returns the current milliseconds since the Unix epoch (for log entries).
///
/// Requires the `std` feature.
#[cfg(feature = "std")]
pub fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
