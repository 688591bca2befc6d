use std::fmt;

use thiserror::Error;

use crate::zones::domain::zone_store::ZoneStoreError;

/// Lifecycle of the monitoring pipeline.
///
/// `Idle → Loading → ZonesLoading → CameraStarting → Running → Stopping → Idle`.
/// A failure before `Running` returns straight to `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Loading,
    ZonesLoading,
    CameraStarting,
    Running,
    Stopping,
}

impl PipelineState {
    pub fn is_idle(self) -> bool {
        self == Self::Idle
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::ZonesLoading => "zones-loading",
            Self::CameraStarting => "camera-starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("monitoring is already running ({0})")]
    AlreadyRunning(PipelineState),
    #[error("capture device busy: monitoring is {0}")]
    CaptureBusy(PipelineState),
    #[error("failed to load detection model: {0}")]
    DetectorUnavailable(String),
    #[error("failed to load zones: {0}")]
    ZonesUnavailable(#[source] ZoneStoreError),
    #[error("failed to start camera: {0}")]
    CaptureUnavailable(String),
    #[error("failed to read frame: {0}")]
    FrameRead(String),
    #[error("frame processing failed: {0}")]
    Processing(String),
    #[error("failed to encode frame: {0}")]
    Encode(String),
    #[error("failed to spawn monitoring thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error(transparent)]
    ZoneStore(#[from] ZoneStoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(PipelineState::CameraStarting.to_string(), "camera-starting");
        assert_eq!(PipelineState::Idle.to_string(), "idle");
    }

    #[test]
    fn test_error_messages_carry_state() {
        let err = PipelineError::AlreadyRunning(PipelineState::Running);
        assert_eq!(err.to_string(), "monitoring is already running (running)");
        let err = PipelineError::CaptureBusy(PipelineState::Loading);
        assert!(err.to_string().contains("busy"));
    }
}
