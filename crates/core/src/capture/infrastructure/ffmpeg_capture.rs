use crate::capture::domain::capture_device::{CaptureDevice, CaptureSettings, CaptureSource};
use crate::shared::frame::Frame;

/// Opens a camera or stream through libavdevice/libavformat.
///
/// `location` is anything ffmpeg can open: a V4L2 node such as
/// `/dev/video0`, a file, or a network URL. An optional input format name
/// (`v4l2`, `avfoundation`, `dshow`) forces a specific demuxer.
pub struct FfmpegCaptureSource {
    location: String,
    input_format: Option<String>,
}

impl FfmpegCaptureSource {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            input_format: None,
        }
    }

    pub fn with_input_format(mut self, name: impl Into<String>) -> Self {
        self.input_format = Some(name.into());
        self
    }

    fn open_input(
        &self,
        settings: &CaptureSettings,
    ) -> Result<ffmpeg_next::format::context::Input, Box<dyn std::error::Error>> {
        let mut options = ffmpeg_next::Dictionary::new();
        options.set("video_size", &format!("{}x{}", settings.width, settings.height));
        options.set("framerate", &settings.fps.to_string());

        let Some(name) = self.input_format.as_deref() else {
            return Ok(ffmpeg_next::format::input_with_dictionary(
                &self.location,
                options,
            )?);
        };

        let format = ffmpeg_next::device::input::video()
            .find(|f| f.name() == name)
            .ok_or_else(|| format!("Unknown capture input format: {name}"))?;
        let ctx = ffmpeg_next::format::open_with(
            &self.location,
            &ffmpeg_next::Format::Input(format),
            options,
        )?;
        match ctx {
            ffmpeg_next::format::context::Context::Input(input) => Ok(input),
            ffmpeg_next::format::context::Context::Output(_) => {
                Err(format!("{} did not open as an input", self.location).into())
            }
        }
    }
}

impl CaptureSource for FfmpegCaptureSource {
    fn open(
        &self,
        settings: &CaptureSettings,
    ) -> Result<Box<dyn CaptureDevice>, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        ffmpeg_next::device::register_all();

        let ictx = self.open_input(settings)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;
        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        log::info!(
            "Opened capture {} ({width}x{height}, requested {}x{} @ {} fps)",
            self.location,
            settings.width,
            settings.height,
            settings.fps
        );
        Ok(Box::new(FfmpegCaptureDevice {
            stream: Some(OpenStream {
                ictx,
                decoder,
                scaler,
                stream_index,
                width,
                height,
                flushing: false,
            }),
            frame_index: 0,
        }))
    }
}

struct OpenStream {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
    flushing: bool,
}

/// Decodes frames one by one from an opened ffmpeg input.
pub struct FfmpegCaptureDevice {
    stream: Option<OpenStream>,
    frame_index: u64,
}

// Safety: the device is owned by one thread at a time; the raw pointers
// inside ffmpeg types are never shared.
unsafe impl Send for FfmpegCaptureDevice {}

impl CaptureDevice for FfmpegCaptureDevice {
    fn read(&mut self) -> Result<Frame, Box<dyn std::error::Error>> {
        let stream = self.stream.as_mut().ok_or("Capture device released")?;
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();

        loop {
            if stream.decoder.receive_frame(&mut decoded).is_ok() {
                let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
                stream.scaler.run(&decoded, &mut rgb)?;
                let pixels = extract_rgb_pixels(&rgb, stream.width, stream.height);
                let frame = Frame::new(pixels, stream.width, stream.height, self.frame_index);
                self.frame_index += 1;
                return Ok(frame);
            }

            if stream.flushing {
                return Err("Capture stream ended".into());
            }
            let Some((packet_stream, packet)) = stream.ictx.packets().next() else {
                stream.decoder.send_eof()?;
                stream.flushing = true;
                continue;
            };
            if packet_stream.index() != stream.stream_index {
                continue;
            }
            if let Err(e) = stream.decoder.send_packet(&packet) {
                log::debug!("Dropping undecodable packet: {e}");
            }
        }
    }

    fn release(&mut self) {
        if self.stream.take().is_some() {
            log::info!("Capture device closed after {} frames", self.frame_index);
        }
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer,
/// dropping any per-row stride padding.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_bytes = width as usize * Frame::CHANNELS;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}
