/// COCO-trained YOLO object detector using ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing, inference, per-class filtering and NMS.
/// Expects the standard YOLOv8 export: one output of shape
/// `[1, 4 + num_classes, num_candidates]` (or its transpose).
use std::path::{Path, PathBuf};

use crate::detection::domain::detection::DetectedObject;
use crate::detection::domain::object_detector::{DetectionRequest, DetectorProvider, ObjectDetector};
use crate::detection::infrastructure::model_resolver::{self, ModelSource};
use crate::shared::constants::YOLO_MODEL_NAME;
use crate::shared::frame::Frame;
use crate::shared::geometry::BoundingBox;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Leading box values per candidate row: cx, cy, w, h.
const BOX_VALUES: usize = 4;

/// YOLO detector backed by an ONNX Runtime session.
pub struct OnnxYoloDetector {
    session: ort::session::Session,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::info!(
            "Loaded detection model {} (input {input_size}x{input_size})",
            model_path.display()
        );
        Ok(Self {
            session,
            input_size,
        })
    }
}

impl ObjectDetector for OnnxYoloDetector {
    fn detect(
        &mut self,
        frame: &Frame,
        request: &DetectionRequest,
    ) -> Result<Vec<DetectedObject>, Box<dyn std::error::Error>> {
        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
        }

        // [1, features, candidates] is the usual export; features < candidates.
        let transposed = shape[1] < shape[2];
        let (num_candidates, num_feats) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        let class_col = BOX_VALUES + request.class_id;
        if class_col >= num_feats {
            return Err(format!(
                "Class {} not in model output ({} classes)",
                request.class_id,
                num_feats.saturating_sub(BOX_VALUES)
            )
            .into());
        }

        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;
        let value = |candidate: usize, feat: usize| -> f64 {
            if transposed {
                data[feat * num_candidates + candidate] as f64
            } else {
                data[candidate * num_feats + feat] as f64
            }
        };

        let mut candidates = Vec::new();
        for i in 0..num_candidates {
            let conf = value(i, class_col);
            if conf < request.min_confidence {
                continue;
            }
            let (cx, cy, w, h) = (value(i, 0), value(i, 1), value(i, 2), value(i, 3));

            // Letterbox coords back to original frame coords
            let bbox = BoundingBox::new(
                ((cx - w / 2.0) - pad_x as f64) / scale,
                ((cy - h / 2.0) - pad_y as f64) / scale,
                ((cx + w / 2.0) - pad_x as f64) / scale,
                ((cy + h / 2.0) - pad_y as f64) / scale,
            )
            .clamped(frame.width(), frame.height());
            candidates.push(DetectedObject::new(bbox, conf));
        }

        let kept = nms(&mut candidates, NMS_IOU_THRESH);
        log::trace!(
            "Frame {}: {} candidates, {} after NMS",
            frame.index(),
            candidates.len(),
            kept.len()
        );
        Ok(kept)
    }
}

/// Resolves the model file and loads a fresh [`OnnxYoloDetector`] for each run.
///
/// Resolution happens on acquire, so a missing model surfaces as a startup
/// failure of the run rather than of the process.
pub struct OnnxDetectorProvider {
    model_path: Option<PathBuf>,
    model_url: Option<String>,
}

impl OnnxDetectorProvider {
    pub fn new(model_path: Option<PathBuf>, model_url: Option<String>) -> Self {
        Self {
            model_path,
            model_url,
        }
    }
}

impl DetectorProvider for OnnxDetectorProvider {
    fn acquire(&self) -> Result<Box<dyn ObjectDetector>, Box<dyn std::error::Error>> {
        let source = ModelSource {
            path: self.model_path.as_deref(),
            name: YOLO_MODEL_NAME,
            url: self.model_url.as_deref(),
            cache_dir: None,
        };
        let model_path = model_resolver::resolve(&source, Some(Box::new(log_download_progress)))?;
        Ok(Box::new(OnnxYoloDetector::new(&model_path)?))
    }
}

fn log_download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        log::debug!("Model download: {downloaded}/{total} bytes");
    } else {
        log::debug!("Model download: {downloaded} bytes");
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox-resize a frame to `target_size` × `target_size`.
///
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = (fw * scale).round() as u32;
    let new_h = (fh * scale).round() as u32;
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Padded with 114/255 gray, the YOLO convention
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

// ---------------------------------------------------------------------------
// NMS
// ---------------------------------------------------------------------------

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(dets: &mut [DetectedObject], iou_thresh: f64) -> Vec<DetectedObject> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<DetectedObject> = Vec::new();
    for det in dets.iter() {
        if keep.iter().all(|k| k.bbox.iou(&det.bbox) <= iou_thresh) {
            keep.push(*det);
        }
    }
    keep
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
