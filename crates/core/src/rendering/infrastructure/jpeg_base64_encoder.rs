use base64::Engine;
use image::codecs::jpeg::JpegEncoder;

use crate::rendering::domain::frame_renderer::FrameEncoder;
use crate::shared::constants::JPEG_QUALITY;
use crate::shared::frame::Frame;

/// JPEG-compresses a frame and returns it as standard base64 text.
pub struct JpegBase64Encoder {
    quality: u8,
}

impl JpegBase64Encoder {
    /// `quality` is clamped to 1..=100.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegBase64Encoder {
    fn default() -> Self {
        Self::new(JPEG_QUALITY)
    }
}

impl FrameEncoder for JpegBase64Encoder {
    fn encode(&self, frame: &Frame) -> Result<String, Box<dyn std::error::Error>> {
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.quality).encode(
            frame.data(),
            frame.width(),
            frame.height(),
            image::ExtendedColorType::Rgb8,
        )?;
        Ok(base64::prelude::BASE64_STANDARD.encode(jpeg))
    }
}
