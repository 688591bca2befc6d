use crate::detection::domain::detection::Detection;
use crate::shared::frame::Frame;
use crate::zones::domain::zone::Zone;

/// Encodes a frame into the text payload carried by published events.
pub trait FrameEncoder: Send + Sync {
    fn encode(&self, frame: &Frame) -> Result<String, Box<dyn std::error::Error>>;
}

/// Draws zone outlines and detections onto a frame in place.
pub trait FrameAnnotator: Send + Sync {
    fn annotate(
        &self,
        frame: &mut Frame,
        zones: &[Zone],
        detections: &[Detection],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
