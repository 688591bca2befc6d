use crate::shared::constants::{DEFAULT_CONFIDENCE, PERSON_CLASS_ID};
use crate::shared::frame::Frame;

use super::detection::DetectedObject;

/// Which class to look for and how confident the detector must be.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionRequest {
    pub class_id: usize,
    pub min_confidence: f64,
}

impl DetectionRequest {
    pub fn person(min_confidence: f64) -> Self {
        Self {
            class_id: PERSON_CLASS_ID,
            min_confidence,
        }
    }
}

impl Default for DetectionRequest {
    fn default() -> Self {
        Self::person(DEFAULT_CONFIDENCE)
    }
}

/// Domain interface for object detection.
///
/// Treated as a black box: given a frame, return boxes of the requested class
/// at or above the requested confidence.
pub trait ObjectDetector: Send {
    fn detect(
        &mut self,
        frame: &Frame,
        request: &DetectionRequest,
    ) -> Result<Vec<DetectedObject>, Box<dyn std::error::Error>>;
}

/// Acquires a ready-to-use detector at the start of each monitoring run.
pub trait DetectorProvider: Send + Sync {
    fn acquire(&self) -> Result<Box<dyn ObjectDetector>, Box<dyn std::error::Error>>;
}

impl<F> DetectorProvider for F
where
    F: Fn() -> Result<Box<dyn ObjectDetector>, Box<dyn std::error::Error>> + Send + Sync,
{
    fn acquire(&self) -> Result<Box<dyn ObjectDetector>, Box<dyn std::error::Error>> {
        self()
    }
}
