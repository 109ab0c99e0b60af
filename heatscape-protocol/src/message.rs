//! Inbound messages (device → station).
//!
//! Every numeric field defaults to `0` and every string to `""` when the
//! controller omits it. A zero is therefore "unknown or zero"; the firmware
//! gives no way to tell the two apart.

use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════
// Tagged message
// ════════════════════════════════════════════════════════════════════

/// One decoded frame from the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceMessage {
    /// `GPS_DATA:{...}`
    Gps(GpsFix),
    /// `GYRO_DATA:{...}`
    Imu(ImuSample),
    /// `TEMP_DATA:[...]`
    Temperature(TempReading),
    /// `CAM_IP:<address>`
    CameraAddress(String),
    /// `TARGET_REACHED`, `TARGET_SET:{...}`, `AUTO_STOPPED`, `NAV_DATA:{...}`
    Nav(NavStatus),
    /// Any frame without a known prefix (status chatter, echoes).
    Unrecognized(String),
}

impl DeviceMessage {
    /// Short tag used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Gps(_) => "gps",
            Self::Imu(_) => "imu",
            Self::Temperature(_) => "temperature",
            Self::CameraAddress(_) => "camera_address",
            Self::Nav(_) => "nav",
            Self::Unrecognized(_) => "unrecognized",
        }
    }
}

// ════════════════════════════════════════════════════════════════════
// Telemetry records
// ════════════════════════════════════════════════════════════════════

/// GPS fix from the controller's receiver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsFix {
    /// Latitude in decimal degrees
    #[serde(rename = "lat")]
    pub latitude: f64,
    /// Longitude in decimal degrees
    #[serde(rename = "lng")]
    pub longitude: f64,
    /// Ground speed as reported by the receiver (km/h)
    pub speed: f64,
    /// Altitude in metres
    #[serde(rename = "alt")]
    pub altitude: f64,
    /// Horizontal dilution of precision
    pub hdop: f64,
    pub satellites: u32,
    /// Receiver time string, passed through untouched
    pub time: String,
}

/// Gyroscope, accelerometer and derived attitude from the IMU.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImuSample {
    #[serde(alias = "gx")]
    pub gyro_x: f64,
    #[serde(alias = "gy")]
    pub gyro_y: f64,
    #[serde(alias = "gz")]
    pub gyro_z: f64,
    #[serde(alias = "ax")]
    pub accel_x: f64,
    #[serde(alias = "ay")]
    pub accel_y: f64,
    #[serde(alias = "az")]
    pub accel_z: f64,
    pub angle_x: f64,
    pub angle_y: f64,
    pub angle_z: f64,
    /// Die temperature of the IMU (°C)
    #[serde(rename = "temp", alias = "temperature")]
    pub temperature: f64,
}

/// One sample set from the temperature sensor array (°C).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempReading {
    pub samples: Vec<f64>,
}

impl TempReading {
    pub fn new(samples: Vec<f64>) -> Self {
        Self { samples }
    }

    /// Arithmetic mean of the sample set, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    pub fn min(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::max)
    }
}

// ════════════════════════════════════════════════════════════════════
// Navigation
// ════════════════════════════════════════════════════════════════════

/// Autonomous navigation status reported by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum NavStatus {
    TargetReached,
    TargetSet(NavTarget),
    AutoStopped,
    Data(NavData),
}

/// Navigation target coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavTarget {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
}

/// Periodic progress report while navigating to a target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavData {
    /// Remaining distance to the target in metres
    pub distance: f64,
    /// Bearing to the target in degrees
    pub bearing: f64,
    /// Current vehicle heading in degrees
    pub heading: f64,
    pub target_lat: f64,
    pub target_lng: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn temp_stats() {
        let reading = TempReading::new(vec![20.0, 22.0, 24.0]);
        assert_eq!(reading.mean(), Some(22.0));
        assert_eq!(reading.min(), Some(20.0));
        assert_eq!(reading.max(), Some(24.0));
    }

    #[test]
    fn empty_temp_has_no_mean() {
        let reading = TempReading::default();
        assert_eq!(reading.mean(), None);
        assert_eq!(reading.min(), None);
    }

    #[test]
    fn imu_accepts_short_aliases() {
        let sample: ImuSample =
            serde_json::from_str(r#"{"gx":1.0,"gy":2.0,"gz":3.0,"ax":0.1,"temp":31.5}"#).unwrap();
        assert_eq!(sample.gyro_x, 1.0);
        assert_eq!(sample.gyro_z, 3.0);
        assert_eq!(sample.accel_x, 0.1);
        assert_eq!(sample.accel_y, 0.0);
        assert_eq!(sample.temperature, 31.5);
    }

    #[test]
    fn imu_accepts_long_names() {
        let sample: ImuSample =
            serde_json::from_str(r#"{"gyroX":-4.5,"accelZ":9.81,"angleX":12.0,"angleY":-3.0}"#)
                .unwrap();
        assert_eq!(sample.gyro_x, -4.5);
        assert_eq!(sample.accel_z, 9.81);
        assert_eq!(sample.angle_x, 12.0);
        assert_eq!(sample.angle_y, -3.0);
    }
}
