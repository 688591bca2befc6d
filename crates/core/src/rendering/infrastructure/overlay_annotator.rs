use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut,
};
use imageproc::rect::Rect;

use crate::detection::domain::detection::Detection;
use crate::rendering::domain::frame_renderer::FrameAnnotator;
use crate::shared::constants::UNKNOWN_ZONE;
use crate::shared::frame::Frame;
use crate::zones::domain::zone::Zone;

const ZONE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const IN_ZONE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const OUT_OF_ZONE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const CENTER_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const CENTER_RADIUS: i32 = 5;
const ZONE_LABEL_PX: f32 = 18.0;
const DETECTION_LABEL_PX: f32 = 15.0;
/// Gap between a detection label and the top of its box.
const LABEL_GAP: i32 = 4;

/// Draws zone outlines, detection boxes and detection centers.
///
/// Boxes are green inside a known zone and red otherwise. With a font loaded,
/// zones are labelled with their name and boxes with `"<zone> <confidence>"`.
#[derive(Default)]
pub struct OverlayAnnotator {
    font: Option<FontVec>,
}

impl OverlayAnnotator {
    pub fn new() -> Self {
        Self { font: None }
    }

    pub fn with_font(mut self, font: FontVec) -> Self {
        self.font = Some(font);
        self
    }

    pub fn has_labels(&self) -> bool {
        self.font.is_some()
    }

    /// Reads a TrueType/OpenType font for labels.
    pub fn load_font(path: &Path) -> Result<FontVec, Box<dyn std::error::Error>> {
        let bytes = std::fs::read(path)
            .map_err(|e| format!("Cannot read font {}: {e}", path.display()))?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| format!("Invalid font {}: {e}", path.display()))?;
        Ok(font)
    }

    fn label(&self, canvas: &mut RgbImage, color: Rgb<u8>, x: f64, y: f64, px: f32, text: &str) {
        if let Some(font) = &self.font {
            draw_text_mut(
                canvas,
                color,
                x.round() as i32,
                y.round() as i32,
                PxScale::from(px),
                font,
                text,
            );
        }
    }
}

impl FrameAnnotator for OverlayAnnotator {
    fn annotate(
        &self,
        frame: &mut Frame,
        zones: &[Zone],
        detections: &[Detection],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut canvas = frame
            .to_rgb_image()
            .ok_or("Frame buffer does not match its dimensions")?;

        for zone in zones {
            let n = zone.polygon.len();
            for i in 0..n {
                let a = zone.polygon[i];
                let b = zone.polygon[(i + 1) % n];
                draw_line_segment_mut(
                    &mut canvas,
                    (a.x as f32, a.y as f32),
                    (b.x as f32, b.y as f32),
                    ZONE_COLOR,
                );
            }
            if let Some(first) = zone.polygon.first() {
                self.label(&mut canvas, ZONE_COLOR, first.x, first.y, ZONE_LABEL_PX, &zone.name);
            }
        }

        for det in detections {
            let color = if det.zone == UNKNOWN_ZONE {
                OUT_OF_ZONE_COLOR
            } else {
                IN_ZONE_COLOR
            };
            let w = det.bbox.width().round() as u32;
            let h = det.bbox.height().round() as u32;
            if w > 0 && h > 0 {
                let rect = Rect::at(det.bbox.x1.round() as i32, det.bbox.y1.round() as i32)
                    .of_size(w, h);
                draw_hollow_rect_mut(&mut canvas, rect, color);
            }
            self.label(
                &mut canvas,
                color,
                det.bbox.x1,
                det.bbox.y1 - DETECTION_LABEL_PX as f64 - LABEL_GAP as f64,
                DETECTION_LABEL_PX,
                &format!("{} {:.2}", det.zone, det.confidence),
            );
            draw_filled_circle_mut(
                &mut canvas,
                (det.center.x.round() as i32, det.center.y.round() as i32),
                CENTER_RADIUS,
                CENTER_COLOR,
            );
        }

        frame.data_mut().copy_from_slice(canvas.as_raw());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection::DetectedObject;
    use crate::shared::geometry::{BoundingBox, Point};

    fn pixel(frame: &Frame, x: u32, y: u32) -> [u8; 3] {
        let i = ((y * frame.width() + x) * 3) as usize;
        [frame.data()[i], frame.data()[i + 1], frame.data()[i + 2]]
    }

    fn det(zone: &str) -> Detection {
        Detection::new(
            DetectedObject::new(BoundingBox::new(10.0, 10.0, 30.0, 50.0), 0.9),
            zone,
        )
    }

    #[test]
    fn test_zone_outline_drawn() {
        let mut frame = Frame::filled(100, 100, [0, 0, 0], 0);
        let zone = Zone::new(
            "Queue",
            vec![
                Point::new(60.0, 60.0),
                Point::new(90.0, 60.0),
                Point::new(90.0, 90.0),
            ],
        );
        OverlayAnnotator::new()
            .annotate(&mut frame, &[zone], &[])
            .unwrap();
        assert_eq!(pixel(&frame, 75, 60), [0, 255, 0]);
        assert_eq!(pixel(&frame, 5, 5), [0, 0, 0]);
    }

    #[test]
    fn test_box_color_depends_on_zone() {
        let mut known = Frame::filled(64, 64, [0, 0, 0], 0);
        OverlayAnnotator::new()
            .annotate(&mut known, &[], &[det("Queue A")])
            .unwrap();
        assert_eq!(pixel(&known, 10, 10), [0, 255, 0]);

        let mut unknown = Frame::filled(64, 64, [0, 0, 0], 0);
        OverlayAnnotator::new()
            .annotate(&mut unknown, &[], &[det(UNKNOWN_ZONE)])
            .unwrap();
        assert_eq!(pixel(&unknown, 10, 10), [255, 0, 0]);
    }

    #[test]
    fn test_center_marked() {
        let mut frame = Frame::filled(64, 64, [0, 0, 0], 0);
        OverlayAnnotator::new()
            .annotate(&mut frame, &[], &[det("Queue A")])
            .unwrap();
        assert_eq!(pixel(&frame, 20, 30), [0, 0, 255]);
    }

    #[test]
    fn test_no_labels_without_font() {
        assert!(!OverlayAnnotator::new().has_labels());
    }

    #[test]
    fn test_load_font_rejects_missing_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.ttf");
        assert!(OverlayAnnotator::load_font(&missing).is_err());

        let garbage = dir.path().join("garbage.ttf");
        std::fs::write(&garbage, b"not a font").unwrap();
        let err = OverlayAnnotator::load_font(&garbage).unwrap_err();
        assert!(err.to_string().contains("Invalid font"));
    }

    #[test]
    fn test_labels_drawn_with_system_font() {
        let candidates = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/Library/Fonts/Arial Unicode.ttf",
            "C:\\Windows\\Fonts\\arial.ttf",
        ];
        let Some(path) = candidates.iter().map(Path::new).find(|p| p.exists()) else {
            return;
        };
        let annotator = OverlayAnnotator::new().with_font(OverlayAnnotator::load_font(path).unwrap());
        assert!(annotator.has_labels());

        let zone = Zone::new(
            "Queue",
            vec![
                Point::new(10.0, 10.0),
                Point::new(20.0, 10.0),
                Point::new(20.0, 20.0),
            ],
        );
        let mut plain = Frame::filled(120, 80, [0, 0, 0], 0);
        OverlayAnnotator::new()
            .annotate(&mut plain, &[zone.clone()], &[])
            .unwrap();
        let mut labelled = Frame::filled(120, 80, [0, 0, 0], 0);
        annotator.annotate(&mut labelled, &[zone], &[]).unwrap();

        // Text extends right of the outline, where the plain overlay is empty.
        let lit = |f: &Frame| (30..100).any(|x| (10..28).any(|y| pixel(f, x, y) != [0, 0, 0]));
        assert!(!lit(&plain));
        assert!(lit(&labelled));
    }

    #[test]
    fn test_shapes_outside_frame_are_clipped() {
        let mut frame = Frame::filled(32, 32, [0, 0, 0], 0);
        let far = Detection::new(
            DetectedObject::new(BoundingBox::new(100.0, 100.0, 200.0, 200.0), 0.9),
            "Queue",
        );
        assert!(OverlayAnnotator::new()
            .annotate(&mut frame, &[], &[far])
            .is_ok());
        assert!(frame.data().iter().all(|&v| v == 0));
    }
}
