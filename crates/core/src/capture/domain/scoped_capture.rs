use crate::shared::frame::Frame;

use super::capture_device::{CaptureDevice, CaptureError, CaptureSettings, CaptureSource};

/// Exclusive owner of an opened capture device.
///
/// The device is released exactly once: on the first call to [`release`],
/// or on drop if that never happens. Reading after release is an error.
///
/// [`release`]: ScopedCapture::release
pub struct ScopedCapture {
    device: Option<Box<dyn CaptureDevice>>,
}

impl ScopedCapture {
    pub fn open(source: &dyn CaptureSource, settings: &CaptureSettings) -> Result<Self, CaptureError> {
        let device = source
            .open(settings)
            .map_err(|e| CaptureError::Open(e.to_string()))?;
        log::debug!(
            "Capture device opened ({}x{} @ {} fps requested)",
            settings.width,
            settings.height,
            settings.fps
        );
        Ok(Self {
            device: Some(device),
        })
    }

    pub fn read(&mut self) -> Result<Frame, CaptureError> {
        let device = self.device.as_mut().ok_or(CaptureError::Released)?;
        device.read().map_err(|e| CaptureError::Read(e.to_string()))
    }

    /// Returns `true` if this call released the device.
    pub fn release(&mut self) -> bool {
        match self.device.take() {
            Some(mut device) => {
                device.release();
                log::debug!("Capture device released");
                true
            }
            None => false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.device.is_none()
    }
}

impl Drop for ScopedCapture {
    fn drop(&mut self) {
        self.release();
    }
}
