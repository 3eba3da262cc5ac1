//! Results file, JSON report and annotated images.

use crate::detection::OmrOutcome;
use crate::error::OmrResult;
use crate::models::{ClassifiedNote, Detection, SymbolKind};
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const NOTE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const SHAPE_A_COLOR: Rgb<u8> = Rgb([144, 238, 144]);
pub const SHAPE_B_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const STAFF_LINE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

const BOX_THICKNESS: u32 = 3;

/// One line of the results file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub x: u32,
    pub y: u32,
    pub height: u32,
    pub width: u32,
    pub label: String,
    pub score: f64,
}

impl DetectionRecord {
    pub fn from_note(note: &ClassifiedNote) -> Self {
        let bbox = note.detection.bbox;
        Self {
            x: bbox.x,
            y: bbox.y,
            height: bbox.height,
            width: bbox.width,
            label: note.label.as_str().to_string(),
            score: note.detection.score,
        }
    }

    /// Shape records carry no score
    pub fn from_shape(detection: &Detection, kind: SymbolKind) -> Self {
        let bbox = detection.bbox;
        Self {
            x: bbox.x,
            y: bbox.y,
            height: bbox.height,
            width: bbox.width,
            label: kind.record_label().to_string(),
            score: 0.0,
        }
    }
}

impl fmt::Display for DetectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {:?}",
            self.x, self.y, self.height, self.width, self.label, self.score
        )
    }
}

/// Records in file order: notes, then shape A, then shape B
pub fn build_records(outcome: &OmrOutcome) -> Vec<DetectionRecord> {
    let notes = outcome.notes.iter().map(DetectionRecord::from_note);
    let shapes = [SymbolKind::ShapeA, SymbolKind::ShapeB].into_iter().flat_map(|kind| {
        outcome
            .shapes(kind)
            .iter()
            .map(move |d| DetectionRecord::from_shape(d, kind))
    });
    notes.chain(shapes).collect()
}

pub fn render_records(records: &[DetectionRecord]) -> String {
    records.iter().map(|r| format!("{}\n", r)).collect()
}

/// Write the results file in one go so a failure never leaves a partial file
pub fn write_records(path: impl AsRef<Path>, records: &[DetectionRecord]) -> OmrResult<()> {
    std::fs::write(path, render_records(records))?;
    Ok(())
}

/// Serializable summary of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub staff_lines: Vec<u32>,
    pub staves: usize,
    pub records: Vec<DetectionRecord>,
}

impl JsonReport {
    pub fn from_outcome(outcome: &OmrOutcome) -> Self {
        Self {
            staff_lines: outcome.staff_lines.clone(),
            staves: outcome.staff_lines.len() / 5,
            records: build_records(outcome),
        }
    }
}

pub fn write_json_report(path: impl AsRef<Path>, outcome: &OmrOutcome) -> OmrResult<()> {
    let json = serde_json::to_string_pretty(&JsonReport::from_outcome(outcome))?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Edge map in RGB with each staff line drawn across the full width
pub fn render_staff_lines(edges: &GrayImage, lines: &[u32]) -> RgbImage {
    let mut img = DynamicImage::ImageLuma8(edges.clone()).to_rgb8();
    let width = img.width() as f32;
    for &y in lines {
        draw_line_segment_mut(&mut img, (0.0, y as f32), (width, y as f32), STAFF_LINE_COLOR);
    }
    img
}

/// Hollow box drawn inwards `BOX_THICKNESS` pixels deep.
///
/// Corners are inclusive, so the outer edge runs through (x + width, y + height).
fn draw_thick_box(img: &mut RgbImage, detection: &Detection, color: Rgb<u8>) {
    let bbox = detection.bbox;
    let (outer_width, outer_height) = (bbox.width + 1, bbox.height + 1);
    for t in 0..BOX_THICKNESS {
        if outer_width <= 2 * t || outer_height <= 2 * t {
            break;
        }
        let rect = Rect::at((bbox.x + t) as i32, (bbox.y + t) as i32)
            .of_size(outer_width - 2 * t, outer_height - 2 * t);
        draw_hollow_rect_mut(img, rect, color);
    }
}

/// Page in RGB with a box around every surviving detection
pub fn render_detections(page: &DynamicImage, outcome: &OmrOutcome) -> RgbImage {
    let mut img = page.to_rgb8();

    for note in &outcome.notes {
        draw_thick_box(&mut img, &note.detection, NOTE_COLOR);
    }
    for (kind, color) in [(SymbolKind::ShapeA, SHAPE_A_COLOR), (SymbolKind::ShapeB, SHAPE_B_COLOR)] {
        for detection in outcome.shapes(kind) {
            draw_thick_box(&mut img, detection, color);
        }
    }

    img
}
