// src/overlay.rs
use ab_glyph::{FontRef, PxScale};
use anyhow::{anyhow, Result};
use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{self, text_size},
    rect::Rect,
};

use crate::{detector::Detection, labels::ClassNameTable};

// --- Style ---
const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
const CORNER_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const LABEL_BG: Rgb<u8> = Rgb([255, 0, 255]);
const LABEL_FG: Rgb<u8> = Rgb([255, 255, 255]);
const CORNER_LENGTH: i32 = 30;
const CORNER_THICKNESS: i32 = 5;
const LABEL_SCALE: f32 = 20.0;
const LABEL_PADDING: i32 = 10;
/// Lowest baseline a label may sit on, keeps text below the top edge.
const LABEL_MIN_Y: i32 = 35;
/// Slack, in hundredths, for the f32 representation error of an exact
/// hundredth (0.15 is stored as 0.150000006).
const HUNDREDTHS_EPSILON: f64 = 1e-5;

/// Confidence rounded up at the hundredths digit, printed the short way
/// (`0.8234` -> `0.83`, `0.80` -> `0.8`).
pub fn format_confidence(confidence: f32) -> String {
    let hundredths = (f64::from(confidence) * 100.0 - HUNDREDTHS_EPSILON).ceil() as i64;
    let (whole, frac) = (hundredths / 100, hundredths % 100);
    if frac == 0 {
        format!("{}.0", whole)
    } else if frac % 10 == 0 {
        format!("{}.{}", whole, frac / 10)
    } else {
        format!("{}.{:02}", whole, frac)
    }
}

/// Bottom-left of the label text, clamped so it stays on screen.
pub fn label_anchor(detection: &Detection) -> (i32, i32) {
    let (x1, y1, _, _) = detection.corners();
    (x1.max(0), y1.max(LABEL_MIN_Y))
}

pub struct OverlayRenderer {
    class_names: ClassNameTable,
    font: FontRef<'static>,
    scale: PxScale,
}

impl OverlayRenderer {
    pub fn new(class_names: ClassNameTable) -> Result<Self> {
        let font = FontRef::try_from_slice(epaint_default_fonts::UBUNTU_LIGHT)
            .map_err(|e| anyhow!("Failed to load label font: {}", e))?;
        Ok(Self {
            class_names,
            font,
            scale: PxScale::from(LABEL_SCALE),
        })
    }

    pub fn label_for(&self, detection: &Detection) -> String {
        format!(
            "{} {}",
            self.class_names.name(detection.class_id),
            format_confidence(detection.confidence)
        )
    }

    /// Draws the box and its label onto `frame`.
    pub fn draw(&self, frame: &mut RgbImage, detection: &Detection) {
        // Boxes may come back far outside the frame; keep the arithmetic
        // below within i32.
        let span = frame.width().max(frame.height()).min(i32::MAX as u32 / 4) as i32;
        let clamp = |v: i32| v.clamp(-span, 2 * span);
        let (x1, y1, x2, y2) = detection.corners();
        let (x1, y1, x2, y2) = (clamp(x1), clamp(y1), clamp(x2), clamp(y2));
        draw_corner_rect(frame, x1, y1, x2 - x1, y2 - y1);

        let (ox, oy) = label_anchor(detection);
        let (ox, oy) = (ox.min(frame.width() as i32), oy.min(frame.height() as i32 + LABEL_MIN_Y));
        self.draw_text_rect(frame, &self.label_for(detection), ox, oy);
    }

    fn draw_text_rect(&self, frame: &mut RgbImage, text: &str, ox: i32, oy: i32) {
        let (w, h) = text_size(self.scale, &self.font, text);
        let (w, h) = (w as i32, h as i32);
        let background = Rect::at(ox - LABEL_PADDING, oy - h - LABEL_PADDING)
            .of_size((w + 2 * LABEL_PADDING) as u32, (h + 2 * LABEL_PADDING) as u32);
        drawing::draw_filled_rect_mut(frame, background, LABEL_BG);
        drawing::draw_text_mut(frame, LABEL_FG, ox, oy - h, self.scale, &self.font, text);
    }
}

/// Thin outline with thick strokes along each corner.
fn draw_corner_rect(frame: &mut RgbImage, x: i32, y: i32, w: i32, h: i32) {
    let (w, h) = (w.max(1), h.max(1));
    drawing::draw_hollow_rect_mut(frame, Rect::at(x, y).of_size(w as u32, h as u32), BOX_COLOR);

    let len = CORNER_LENGTH.min(w).min(h).max(1);
    let t = CORNER_THICKNESS;
    let (x2, y2) = (x + w, y + h);
    let strokes = [
        // top-left
        Rect::at(x, y).of_size(len as u32, t as u32),
        Rect::at(x, y).of_size(t as u32, len as u32),
        // top-right
        Rect::at(x2 - len, y).of_size(len as u32, t as u32),
        Rect::at(x2 - t, y).of_size(t as u32, len as u32),
        // bottom-left
        Rect::at(x, y2 - t).of_size(len as u32, t as u32),
        Rect::at(x, y2 - len).of_size(t as u32, len as u32),
        // bottom-right
        Rect::at(x2 - len, y2 - t).of_size(len as u32, t as u32),
        Rect::at(x2 - t, y2 - len).of_size(t as u32, len as u32),
    ];
    for stroke in strokes {
        drawing::draw_filled_rect_mut(frame, stroke, CORNER_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(x1: f32, y1: f32, x2: f32, y2: f32, class_id: usize, confidence: f32) -> Detection {
        Detection {
            x1,
            y1,
            x2,
            y2,
            class_id,
            confidence,
        }
    }

    #[test]
    fn confidence_rounds_up_to_hundredths() {
        assert_eq!(format_confidence(0.8234), "0.83");
        assert_eq!(format_confidence(0.051), "0.06");
        assert_eq!(format_confidence(0.001), "0.01");
    }

    #[test]
    fn exact_hundredths_are_not_bumped() {
        assert_eq!(format_confidence(0.80), "0.8");
        assert_eq!(format_confidence(0.25), "0.25");
        assert_eq!(format_confidence(0.15), "0.15");
        assert_eq!(format_confidence(0.60), "0.6");
        assert_eq!(format_confidence(1.0), "1.0");
    }

    #[test]
    fn every_hundredth_renders_as_itself() {
        for k in 0..=100u32 {
            let shown = format_confidence(k as f32 / 100.0);
            let hundredths = (shown.parse::<f64>().unwrap() * 100.0).round() as u32;
            assert_eq!(hundredths, k, "{}/100 shown as {}", k, shown);
        }
    }

    #[test]
    fn confidence_is_never_rounded_down() {
        for c in [0.111_f32, 0.499, 0.505, 0.8234, 0.9901] {
            let shown: f32 = format_confidence(c).parse().unwrap();
            assert!(shown >= c, "{} shown as {}", c, shown);
        }
    }

    #[test]
    fn anchor_is_clamped_on_screen() {
        assert_eq!(label_anchor(&detection(0.0, 0.0, 50.0, 50.0, 0, 0.5)), (0, 35));
        assert_eq!(label_anchor(&detection(-12.0, 10.0, 50.0, 50.0, 0, 0.5)), (0, 35));
        assert_eq!(label_anchor(&detection(40.0, 80.0, 90.0, 120.0, 0, 0.5)), (40, 80));
    }

    #[test]
    fn label_joins_class_name_and_confidence() {
        let renderer = OverlayRenderer::new(ClassNameTable::coco()).unwrap();
        let det = detection(10.0, 10.0, 100.0, 100.0, 16, 0.8234);
        assert_eq!(renderer.label_for(&det), "dog 0.83");
    }

    #[test]
    fn draw_marks_box_and_label_pixels() {
        let renderer = OverlayRenderer::new(ClassNameTable::coco()).unwrap();
        let mut frame = RgbImage::new(320, 240);
        renderer.draw(&mut frame, &detection(100.0, 100.0, 200.0, 200.0, 0, 0.9));

        // bottom-left corner stroke, the label covers the top-left one
        assert_eq!(*frame.get_pixel(101, 198), CORNER_COLOR);
        // bottom outline between the corners
        assert_eq!(*frame.get_pixel(150, 199), BOX_COLOR);
        // label background just left of the anchor
        assert_eq!(*frame.get_pixel(95, 95), LABEL_BG);
        // box interior untouched
        assert_eq!(*frame.get_pixel(150, 150), Rgb([0, 0, 0]));
    }

    #[test]
    fn draw_tolerates_boxes_past_the_edges() {
        let renderer = OverlayRenderer::new(ClassNameTable::coco()).unwrap();
        let mut frame = RgbImage::new(64, 48);
        renderer.draw(&mut frame, &detection(-20.0, -20.0, 100.0, 100.0, 2, 0.4));
        renderer.draw(&mut frame, &detection(30.0, 30.0, 30.0, 30.0, 2, 0.4));
    }

    #[test]
    fn draw_survives_huge_coordinates() {
        let renderer = OverlayRenderer::new(ClassNameTable::coco()).unwrap();
        let mut frame = RgbImage::new(64, 48);
        renderer.draw(&mut frame, &detection(-3.0e9, -3.0e9, 3.0e9, 3.0e9, 0, 0.9));
        renderer.draw(&mut frame, &detection(3.0e9, 3.0e9, 4.0e9, 4.0e9, 0, 0.9));
        renderer.draw(&mut frame, &detection(f32::NAN, 10.0, f32::INFINITY, 20.0, 0, 0.9));
    }
}
