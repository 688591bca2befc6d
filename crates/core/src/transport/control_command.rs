use serde::Deserialize;
use thiserror::Error;

use crate::zones::domain::zone::ZoneConfig;

/// Inbound control operations.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlCommand {
    StartCamera,
    StopCamera,
    CaptureFrame,
    SaveZones(ZoneConfig),
    GetZones,
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("malformed command: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("{command} requires a payload")]
    MissingPayload { command: String },
}

/// Wire form: `{"command": <name>, "payload": <optional>}`.
#[derive(Deserialize)]
struct RawCommand {
    command: String,
    #[serde(default)]
    payload: serde_json::Value,
}

impl ControlCommand {
    /// Parses one JSON message. Payloads on commands that take none are
    /// ignored, so clients may attach options the pipeline does not use.
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        let raw: RawCommand = serde_json::from_str(text)?;
        match raw.command.as_str() {
            "start_camera" => Ok(Self::StartCamera),
            "stop_camera" => Ok(Self::StopCamera),
            "capture_frame" => Ok(Self::CaptureFrame),
            "get_zones" => Ok(Self::GetZones),
            "save_zones" => {
                if raw.payload.is_null() {
                    return Err(CommandError::MissingPayload {
                        command: raw.command,
                    });
                }
                Ok(Self::SaveZones(serde_json::from_value(raw.payload)?))
            }
            _ => Err(CommandError::Unknown(raw.command)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::StartCamera => "start_camera",
            Self::StopCamera => "stop_camera",
            Self::CaptureFrame => "capture_frame",
            Self::SaveZones(_) => "save_zones",
            Self::GetZones => "get_zones",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::geometry::Point;
    use rstest::rstest;

    #[rstest]
    #[case(r#"{"command":"start_camera"}"#, ControlCommand::StartCamera)]
    #[case(r#"{"command":"start_camera","payload":{"camera_id":0,"confidence":0.45}}"#, ControlCommand::StartCamera)]
    #[case(r#"{"command":"stop_camera","payload":null}"#, ControlCommand::StopCamera)]
    #[case(r#"{"command":"capture_frame"}"#, ControlCommand::CaptureFrame)]
    #[case(r#"{"command":"get_zones"}"#, ControlCommand::GetZones)]
    fn test_parse_simple_commands(#[case] text: &str, #[case] expected: ControlCommand) {
        let cmd = ControlCommand::parse(text).unwrap();
        assert_eq!(cmd, expected);
        assert!(text.contains(cmd.name()));
    }

    #[test]
    fn test_parse_save_zones() {
        let text = r#"{"command":"save_zones","payload":{"zones":[
            {"name":"Queue A","polygon":[[0,0],[10,0],[10.5,10]]}
        ]}}"#;
        let ControlCommand::SaveZones(config) = ControlCommand::parse(text).unwrap() else {
            panic!("expected save_zones");
        };
        assert_eq!(config.zones[0].name, "Queue A");
        assert_eq!(config.zones[0].polygon[2], Point::new(10.5, 10.0));
    }

    #[test]
    fn test_save_zones_without_payload() {
        assert!(matches!(
            ControlCommand::parse(r#"{"command":"save_zones"}"#),
            Err(CommandError::MissingPayload { .. })
        ));
    }

    #[rstest]
    #[case("not json")]
    #[case(r#"{"payload":{}}"#)]
    #[case(r#"{"command":"save_zones","payload":{"zones":"nope"}}"#)]
    fn test_malformed_messages(#[case] text: &str) {
        assert!(matches!(
            ControlCommand::parse(text),
            Err(CommandError::Malformed(_))
        ));
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(
            ControlCommand::parse(r#"{"command":"reboot"}"#),
            Err(CommandError::Unknown(name)) if name == "reboot"
        ));
    }
}
