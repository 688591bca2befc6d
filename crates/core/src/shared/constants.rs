/// Default YOLO model file name looked up in the model cache directory.
pub const YOLO_MODEL_NAME: &str = "yolov8n.onnx";

/// COCO class id of "person".
pub const PERSON_CLASS_ID: usize = 0;

/// Minimum detector confidence for a person to be counted.
pub const DEFAULT_CONFIDENCE: f64 = 0.45;

pub const CAPTURE_WIDTH: u32 = 640;
pub const CAPTURE_HEIGHT: u32 = 480;
pub const CAPTURE_FPS: u32 = 30;

/// Only every Nth captured frame is processed.
pub const FRAME_INTERVAL: u64 = 2;

/// Pause after each published snapshot (~15 updates/s with the 1-in-2 throttle).
pub const LOOP_DELAY_MS: u64 = 33;

pub const JPEG_QUALITY: u8 = 80;

/// Zone name assigned to detections outside every configured zone.
pub const UNKNOWN_ZONE: &str = "Unknown";

/// `alerts` is raised when strictly more people than this are queuing.
pub const QUEUE_ALERT_THRESHOLD: u32 = 5;

/// An entity waiting strictly longer than this (seconds) is in alert.
pub const ENTITY_ALERT_SECS: f64 = 90.0;

pub const APP_DIR_NAME: &str = "QueueMonitor";
