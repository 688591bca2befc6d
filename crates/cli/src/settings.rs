use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use queue_monitor_core::capture::domain::capture_device::CaptureSettings;
use queue_monitor_core::detection::domain::object_detector::DetectionRequest;
use queue_monitor_core::pipeline::streaming_pipeline::PipelineConfig;
use queue_monitor_core::shared::constants::{
    APP_DIR_NAME, CAPTURE_FPS, CAPTURE_HEIGHT, CAPTURE_WIDTH, DEFAULT_CONFIDENCE,
    FRAME_INTERVAL, JPEG_QUALITY, LOOP_DELAY_MS,
};

const SETTINGS_FILE: &str = "settings.json";
const ZONES_FILE: &str = "zones.json";

/// Persistent monitor settings. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub zones_path: PathBuf,
    /// Capture device or stream URL handed to ffmpeg.
    pub source: String,
    /// ffmpeg input format, e.g. `v4l2` or `avfoundation`.
    pub input_format: Option<String>,
    pub model_path: Option<PathBuf>,
    pub model_url: Option<String>,
    pub confidence: f64,
    pub frame_interval: u64,
    pub loop_delay_ms: u64,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub jpeg_quality: u8,
    pub annotate: bool,
    /// TrueType font for overlay labels; without one the overlay is unlabelled.
    pub label_font: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            zones_path: default_zones_path(),
            source: "/dev/video0".into(),
            input_format: None,
            model_path: None,
            model_url: None,
            confidence: DEFAULT_CONFIDENCE,
            frame_interval: FRAME_INTERVAL,
            loop_delay_ms: LOOP_DELAY_MS,
            width: CAPTURE_WIDTH,
            height: CAPTURE_HEIGHT,
            fps: CAPTURE_FPS,
            jpeg_quality: JPEG_QUALITY,
            annotate: true,
            label_font: None,
        }
    }
}

impl Settings {
    /// Loads from `path` if given, else from the platform config directory.
    ///
    /// An explicit path must exist and parse. The default location is
    /// optional; if it is missing or unreadable the defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(path) = path {
            let data = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read settings {}: {e}", path.display()))?;
            let settings = serde_json::from_str(&data)
                .map_err(|e| format!("Invalid settings {}: {e}", path.display()))?;
            log::info!("Loaded settings from {}", path.display());
            return Ok(settings);
        }

        let Some(path) = settings_path() else {
            return Ok(Self::default());
        };
        match std::fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    Ok(settings)
                }
                Err(e) => {
                    log::warn!("Ignoring invalid settings {}: {e}", path.display());
                    Ok(Self::default())
                }
            },
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err("confidence must be between 0.0 and 1.0".into());
        }
        if self.frame_interval < 1 {
            return Err("frame_interval must be at least 1".into());
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err("jpeg_quality must be between 1 and 100".into());
        }
        if self.width == 0 || self.height == 0 || self.fps == 0 {
            return Err("capture width, height and fps must be positive".into());
        }
        Ok(())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            request: DetectionRequest::person(self.confidence),
            capture: CaptureSettings {
                width: self.width,
                height: self.height,
                fps: self.fps,
            },
            frame_interval: self.frame_interval,
            loop_delay: Duration::from_millis(self.loop_delay_ms),
        }
    }
}

fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(SETTINGS_FILE))
}

fn default_zones_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR_NAME).join(ZONES_FILE))
        .unwrap_or_else(|| PathBuf::from("config").join(ZONES_FILE))
}
