//! Outbound commands (station → device).

use alloc::format;
use alloc::string::{String, ToString};
use core::fmt;

/// Lowest servo angle the controller accepts.
pub const SERVO_MIN: u8 = 0;
/// Highest servo angle the controller accepts.
pub const SERVO_MAX: u8 = 180;

/// A command sent to the vehicle controller.
///
/// Encodes to the controller's plain string tokens via [`Command::encode`]
/// (or `Display`).
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Forward,
    Backward,
    Left,
    Right,
    /// Stop the drive motors.
    Stop,
    /// Cut all motion immediately, including autonomous navigation.
    EmergencyStop,
    /// Ask the sensor array for a fresh temperature sample set.
    GetTemperature,
    /// Ask the controller to report the camera's base address.
    GetCameraAddress,
    /// Horizontal servo angle in degrees.
    PanCamera(u8),
    /// Vertical servo angle in degrees.
    TiltCamera(u8),
    /// Set the autonomous navigation target.
    SetTarget { lat: f64, lng: f64 },
    StartAuto,
    StopAuto,
    /// Opaque token passed through verbatim.
    Raw(String),
}

/// How a command is scheduled on the way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandClass {
    /// Drive and servo commands; throttled and coalesced.
    Motion,
    /// Stop-type commands; always sent immediately.
    Halt,
    /// Everything else; sent immediately.
    Query,
}

impl Command {
    /// Build a pan command, clamping the angle to the servo range.
    pub fn pan(angle: i32) -> Self {
        Self::PanCamera(clamp_angle(angle))
    }

    /// Build a tilt command, clamping the angle to the servo range.
    pub fn tilt(angle: i32) -> Self {
        Self::TiltCamera(clamp_angle(angle))
    }

    pub fn class(&self) -> CommandClass {
        match self {
            Self::Forward
            | Self::Backward
            | Self::Left
            | Self::Right
            | Self::PanCamera(_)
            | Self::TiltCamera(_) => CommandClass::Motion,
            Self::Stop | Self::EmergencyStop | Self::StopAuto => CommandClass::Halt,
            Self::GetTemperature
            | Self::GetCameraAddress
            | Self::SetTarget { .. }
            | Self::StartAuto
            | Self::Raw(_) => CommandClass::Query,
        }
    }

    /// Encode to the wire token.
    pub fn encode(&self) -> String {
        match self {
            Self::Forward => "forward".into(),
            Self::Backward => "backward".into(),
            Self::Left => "left".into(),
            Self::Right => "right".into(),
            Self::Stop => "stop".into(),
            Self::EmergencyStop => "emergency_stop".into(),
            Self::GetTemperature => "get_temp".into(),
            Self::GetCameraAddress => "GET_CAM_IP".into(),
            Self::PanCamera(angle) => format!("H_TURN_CAM:{}", (*angle).min(SERVO_MAX)),
            Self::TiltCamera(angle) => format!("V_TURN_CAM:{}", (*angle).min(SERVO_MAX)),
            Self::SetTarget { lat, lng } => {
                // Non-finite coordinates serialize as null
                let target = crate::NavTarget {
                    latitude: *lat,
                    longitude: *lng,
                };
                let json = serde_json::to_string(&target).unwrap_or_else(|_| "{}".into());
                format!("SET_TARGET:{json}")
            }
            Self::StartAuto => "START_AUTO".into(),
            Self::StopAuto => "STOP_AUTO".into(),
            Self::Raw(token) => token.clone(),
        }
    }

    /// Parse operator input into a command.
    ///
    /// Known tokens and directives map to their variants. Anything else
    /// becomes [`Command::Raw`]. Directives with an unparseable value also
    /// fall back to `Raw`, so the operator still sees exactly what was sent.
    ///
    /// Fixed tokens match case-insensitively (`Forward` is still a drive
    /// command). `SET_TARGET` with non-finite coordinates is kept as `Raw`.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        const TOKENS: [(&str, Command); 10] = [
            ("forward", Command::Forward),
            ("backward", Command::Backward),
            ("left", Command::Left),
            ("right", Command::Right),
            ("stop", Command::Stop),
            ("emergency_stop", Command::EmergencyStop),
            ("get_temp", Command::GetTemperature),
            ("GET_CAM_IP", Command::GetCameraAddress),
            ("START_AUTO", Command::StartAuto),
            ("STOP_AUTO", Command::StopAuto),
        ];
        if let Some((_, command)) = TOKENS
            .iter()
            .find(|(token, _)| token.eq_ignore_ascii_case(input))
        {
            return command.clone();
        }

        if let Some(angle) = input.strip_prefix("H_TURN_CAM:") {
            if let Ok(angle) = angle.trim().parse::<i32>() {
                return Self::pan(angle);
            }
        } else if let Some(angle) = input.strip_prefix("V_TURN_CAM:") {
            if let Ok(angle) = angle.trim().parse::<i32>() {
                return Self::tilt(angle);
            }
        } else if let Some(json) = input.strip_prefix("SET_TARGET:") {
            if let Some(target) = serde_json::from_str::<crate::NavTarget>(json)
                .ok()
                .filter(|t| t.latitude.is_finite() && t.longitude.is_finite())
            {
                return Self::SetTarget {
                    lat: target.latitude,
                    lng: target.longitude,
                };
            }
        }

        Self::Raw(input.to_string())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn clamp_angle(angle: i32) -> u8 {
    angle.clamp(SERVO_MIN as i32, SERVO_MAX as i32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_tokens() {
        assert_eq!(Command::Forward.encode(), "forward");
        assert_eq!(Command::Stop.encode(), "stop");
        assert_eq!(Command::GetTemperature.encode(), "get_temp");
        assert_eq!(Command::GetCameraAddress.encode(), "GET_CAM_IP");
    }

    #[test]
    fn servo_directives_are_clamped() {
        assert_eq!(Command::pan(90).encode(), "H_TURN_CAM:90");
        assert_eq!(Command::pan(-15).encode(), "H_TURN_CAM:0");
        assert_eq!(Command::tilt(250).encode(), "V_TURN_CAM:180");
        // Out-of-range values built directly are capped on encode
        assert_eq!(Command::PanCamera(200).encode(), "H_TURN_CAM:180");
    }

    #[test]
    fn set_target_encodes_json() {
        let cmd = Command::SetTarget { lat: 6.9, lng: 79.8 };
        let wire = cmd.encode();
        assert!(wire.starts_with("SET_TARGET:{"));
        assert!(wire.contains("\"lat\":6.9"));
        assert!(wire.contains("\"lng\":79.8"));
    }

    #[test]
    fn classes() {
        assert_eq!(Command::Left.class(), CommandClass::Motion);
        assert_eq!(Command::PanCamera(10).class(), CommandClass::Motion);
        assert_eq!(Command::Stop.class(), CommandClass::Halt);
        assert_eq!(Command::EmergencyStop.class(), CommandClass::Halt);
        assert_eq!(Command::StopAuto.class(), CommandClass::Halt);
        assert_eq!(Command::GetTemperature.class(), CommandClass::Query);
    }

    #[test]
    fn parse_known_and_raw() {
        assert_eq!(Command::parse("forward"), Command::Forward);
        assert_eq!(Command::parse(" stop "), Command::Stop);
        assert_eq!(Command::parse("H_TURN_CAM:45"), Command::PanCamera(45));
        assert_eq!(Command::parse("V_TURN_CAM:999"), Command::TiltCamera(180));
        assert_eq!(
            Command::parse("SET_TARGET:{\"lat\":1.5,\"lng\":2.5}"),
            Command::SetTarget { lat: 1.5, lng: 2.5 }
        );
        assert_eq!(
            Command::parse("H_TURN_CAM:abc"),
            Command::Raw("H_TURN_CAM:abc".to_string())
        );
        assert_eq!(Command::parse("BLINK"), Command::Raw("BLINK".to_string()));
    }

    #[test]
    fn parse_ignores_token_case() {
        assert_eq!(Command::parse("Forward"), Command::Forward);
        assert_eq!(Command::parse("LEFT"), Command::Left);
        assert_eq!(Command::parse("Emergency_Stop"), Command::EmergencyStop);
        assert_eq!(Command::parse("stop_auto"), Command::StopAuto);
        assert_eq!(Command::parse("Forward").class(), CommandClass::Motion);
        // Raw tokens keep their spelling
        assert_eq!(Command::parse("Blink"), Command::Raw("Blink".to_string()));
    }

    #[test]
    fn set_target_stays_valid_json() {
        let wire = Command::SetTarget {
            lat: f64::NAN,
            lng: f64::INFINITY,
        }
        .encode();
        let json = wire.strip_prefix("SET_TARGET:").unwrap();
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        assert!(value["lat"].is_null());
        assert!(value["lng"].is_null());

        let wire = Command::SetTarget { lat: 1.0, lng: -2.5 }.encode();
        let value: serde_json::Value =
            serde_json::from_str(wire.strip_prefix("SET_TARGET:").unwrap()).unwrap();
        assert_eq!(value["lat"], 1.0);
        assert_eq!(value["lng"], -2.5);
    }
}
