//! Latest-value telemetry store.
//!
//! Each decoded frame overwrites the record with the same tag; no history is
//! kept. Consumers hold a `watch::Receiver` and see the newest snapshot.
//!
//! Fields stay at zero/empty until the first matching frame arrives. Zero
//! means "unknown", not a measurement.

use std::sync::Arc;

use heatscape_protocol::{
    DeviceMessage, GpsFix, ImuSample, NavData, NavStatus, NavTarget, TempReading,
};
use serde::Serialize;
use tokio::sync::watch;

/// Autonomous navigation flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NavigationState {
    pub target: Option<NavTarget>,
    pub target_reached: bool,
    pub auto_active: bool,
    pub last_data: Option<NavData>,
}

/// Snapshot of everything the device has reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Telemetry {
    pub gps: GpsFix,
    pub imu: ImuSample,
    pub temperature: TempReading,
    /// Set while a `get_temp` request is outstanding
    pub collecting_temperature: bool,
    /// Camera base address reported via `CAM_IP:`
    pub camera_address: Option<String>,
    pub navigation: NavigationState,
    /// Number of frames applied (recognised frames only)
    pub frames_received: u64,
}

impl Telemetry {
    /// Apply one decoded message in place.
    pub fn apply(&mut self, message: &DeviceMessage) {
        match message {
            DeviceMessage::Gps(fix) => self.gps = fix.clone(),
            DeviceMessage::Imu(sample) => self.imu = sample.clone(),
            DeviceMessage::Temperature(reading) => {
                self.temperature = reading.clone();
                self.collecting_temperature = false;
            }
            DeviceMessage::CameraAddress(address) => {
                self.camera_address = Some(address.clone()).filter(|a| !a.is_empty());
            }
            DeviceMessage::Nav(status) => self.apply_nav(status),
            DeviceMessage::Unrecognized(_) => return,
        }
        self.frames_received += 1;
    }

    fn apply_nav(&mut self, status: &NavStatus) {
        let nav = &mut self.navigation;
        match status {
            NavStatus::TargetSet(target) => {
                nav.target = Some(*target);
                nav.target_reached = false;
                nav.auto_active = true;
            }
            NavStatus::TargetReached => {
                nav.target_reached = true;
                nav.auto_active = false;
            }
            NavStatus::AutoStopped => nav.auto_active = false,
            NavStatus::Data(data) => nav.last_data = Some(*data),
        }
    }

    /// Camera base URL, with an `http://` scheme added when the device
    /// reported a bare host.
    pub fn camera_url(&self) -> Option<String> {
        self.camera_address.as_ref().map(|address| {
            if address.starts_with("http://") || address.starts_with("https://") {
                address.clone()
            } else {
                format!("http://{address}")
            }
        })
    }
}

/// Shared telemetry store. Cloning shares the same underlying channel.
#[derive(Clone, Debug)]
pub struct TelemetryStore {
    tx: Arc<watch::Sender<Telemetry>>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Telemetry::default());
        Self { tx: Arc::new(tx) }
    }

    /// Apply a decoded message and notify watchers.
    pub fn apply(&self, message: &DeviceMessage) {
        if matches!(message, DeviceMessage::Unrecognized(_)) {
            return;
        }
        self.tx.send_modify(|t| t.apply(message));
    }

    /// Mark a temperature request as outstanding.
    pub fn begin_temperature_collection(&self) {
        self.tx.send_modify(|t| t.collecting_temperature = true);
    }

    /// Clear the outstanding-request flag without new samples.
    pub fn cancel_temperature_collection(&self) {
        self.tx.send_if_modified(|t| std::mem::replace(&mut t.collecting_temperature, false));
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Telemetry {
        self.tx.borrow().clone()
    }

    /// Receiver that observes every subsequent update.
    pub fn subscribe(&self) -> watch::Receiver<Telemetry> {
        self.tx.subscribe()
    }
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}
