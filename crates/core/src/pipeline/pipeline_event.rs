use serde::Serialize;

use crate::occupancy::domain::occupancy_stats::{EntityStatus, OccupancyStats};
use crate::zones::domain::zone::ZoneConfig;

/// The aggregated result of one processed frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameSnapshot {
    /// Monotonic count of frames read in this run.
    #[serde(rename = "frame")]
    pub frame_index: u64,
    /// Local time, `%Y-%m-%dT%H:%M:%S`.
    pub timestamp: String,
    pub stats: OccupancyStats,
    #[serde(rename = "customers")]
    pub entities: Vec<EntityStatus>,
    /// Base64 JPEG of the (possibly annotated) frame.
    #[serde(rename = "videoFrame")]
    pub video_frame: Option<String>,
}

/// Everything the pipeline reports to subscribers.
///
/// Serializes as `{"event": <name>, "data": <payload>}`; events without a
/// payload omit `data`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum PipelineEvent {
    CameraStarted,
    CameraStopped,
    QueueUpdate(FrameSnapshot),
    FrameCaptured { frame: String },
    ZonesSaved { status: String, message: String },
    ZonesConfig(ZoneConfig),
    ConnectionResponse { status: String },
    Error { message: String },
}

impl PipelineEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CameraStarted => "camera_started",
            Self::CameraStopped => "camera_stopped",
            Self::QueueUpdate(_) => "queue_update",
            Self::FrameCaptured { .. } => "frame_captured",
            Self::ZonesSaved { .. } => "zones_saved",
            Self::ZonesConfig(_) => "zones_config",
            Self::ConnectionResponse { .. } => "connection_response",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unit_event_has_no_data() {
        let json = serde_json::to_value(PipelineEvent::CameraStarted).unwrap();
        assert_eq!(json, json!({"event": "camera_started"}));
    }

    #[test]
    fn test_error_event_shape() {
        let json = serde_json::to_value(PipelineEvent::error("boom")).unwrap();
        assert_eq!(json, json!({"event": "error", "data": {"message": "boom"}}));
    }

    #[test]
    fn test_queue_update_uses_wire_names() {
        let snapshot = FrameSnapshot {
            frame_index: 4,
            timestamp: "2026-01-01T12:00:00".into(),
            stats: OccupancyStats::default(),
            entities: vec![],
            video_frame: Some("abc".into()),
        };
        let json = serde_json::to_value(PipelineEvent::QueueUpdate(snapshot)).unwrap();
        assert_eq!(json["event"], "queue_update");
        assert_eq!(json["data"]["frame"], 4);
        assert_eq!(json["data"]["videoFrame"], "abc");
        assert_eq!(json["data"]["customers"], json!([]));
        assert_eq!(json["data"]["stats"]["inQueue"], 0);
    }

    #[test]
    fn test_names_match_serialized_tags() {
        let events = [
            PipelineEvent::CameraStopped,
            PipelineEvent::FrameCaptured { frame: "x".into() },
            PipelineEvent::ZonesSaved {
                status: "success".into(),
                message: "ok".into(),
            },
            PipelineEvent::ZonesConfig(ZoneConfig::default()),
            PipelineEvent::ConnectionResponse {
                status: "connected".into(),
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["event"], event.name());
        }
    }
}
