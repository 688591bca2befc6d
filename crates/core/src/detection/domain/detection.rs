use serde::Serialize;

use crate::shared::geometry::{BoundingBox, Point};

/// Raw detector output: one box and its confidence for the requested class.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectedObject {
    pub bbox: BoundingBox,
    pub confidence: f64,
}

impl DetectedObject {
    pub fn new(bbox: BoundingBox, confidence: f64) -> Self {
        Self { bbox, confidence }
    }
}

/// A detected object placed in a zone for one frame.
///
/// Detections carry no identity; they are rebuilt from scratch every frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f64,
    pub center: Point,
    pub zone: String,
}

impl Detection {
    pub fn new(object: DetectedObject, zone: impl Into<String>) -> Self {
        Self {
            bbox: object.bbox,
            confidence: object.confidence,
            center: object.bbox.center(),
            zone: zone.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_derived_from_bbox() {
        let obj = DetectedObject::new(BoundingBox::new(0.0, 0.0, 10.0, 20.0), 0.9);
        let det = Detection::new(obj, "Queue A");
        assert_eq!(det.center, Point::new(5.0, 10.0));
        assert_eq!(det.zone, "Queue A");
        assert_eq!(det.confidence, 0.9);
    }
}
