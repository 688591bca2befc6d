use serde::{Deserialize, Serialize};

/// A point in frame pixel coordinates, serialized as `[x, y]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Axis-aligned box in corner form `(x1, y1)`–`(x2, y2)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Exact midpoint; no rounding to whole pixels.
    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Clamps the box into a `width` x `height` frame.
    pub fn clamped(&self, width: u32, height: u32) -> BoundingBox {
        let w = width as f64;
        let h = height as f64;
        BoundingBox {
            x1: self.x1.clamp(0.0, w),
            y1: self.y1.clamp(0.0, h),
            x2: self.x2.clamp(0.0, w),
            y2: self.y2.clamp(0.0, h),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_center_is_exact_midpoint() {
        let b = BoundingBox::new(1.0, 2.0, 4.0, 7.0);
        assert_eq!(b.center(), Point::new(2.5, 4.5));
    }

    #[test]
    fn test_iou_identical() {
        let b = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert_relative_eq!(b.iou(&b), 1.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        assert_relative_eq!(a.iou(&b), 25.0 / 175.0);
    }

    #[test]
    fn test_iou_touching_edges_is_zero() {
        let a = BoundingBox::new(0.0, 0.0, 5.0, 5.0);
        let b = BoundingBox::new(5.0, 0.0, 10.0, 5.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_inverted_box_has_zero_area() {
        let b = BoundingBox::new(10.0, 10.0, 0.0, 0.0);
        assert_eq!(b.area(), 0.0);
    }

    #[test]
    fn test_clamped_keeps_box_inside_frame() {
        let b = BoundingBox::new(-5.0, 10.0, 700.0, 500.0).clamped(640, 480);
        assert_eq!(b, BoundingBox::new(0.0, 10.0, 640.0, 480.0));
    }

    #[test]
    fn test_point_serializes_as_pair() {
        let json = serde_json::to_string(&Point::new(3.0, 4.5)).unwrap();
        assert_eq!(json, "[3.0,4.5]");
        let back: Point = serde_json::from_str("[3, 4.5]").unwrap();
        assert_eq!(back, Point::new(3.0, 4.5));
    }
}
