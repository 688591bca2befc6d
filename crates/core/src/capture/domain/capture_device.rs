use thiserror::Error;

use crate::shared::constants::{CAPTURE_FPS, CAPTURE_HEIGHT, CAPTURE_WIDTH};
use crate::shared::frame::Frame;

/// Requested capture format. Devices may deliver a different size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            width: CAPTURE_WIDTH,
            height: CAPTURE_HEIGHT,
            fps: CAPTURE_FPS,
        }
    }
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("failed to open capture device: {0}")]
    Open(String),
    #[error("failed to read frame: {0}")]
    Read(String),
    #[error("capture device already released")]
    Released,
}

/// An opened capture device delivering frames one at a time.
///
/// Reads block until a frame is available.
pub trait CaptureDevice: Send {
    fn read(&mut self) -> Result<Frame, Box<dyn std::error::Error>>;

    /// Releases the underlying device.
    fn release(&mut self);
}

/// Opens capture devices on demand.
pub trait CaptureSource: Send + Sync {
    fn open(
        &self,
        settings: &CaptureSettings,
    ) -> Result<Box<dyn CaptureDevice>, Box<dyn std::error::Error>>;
}
