//! Integration tests for the results file, JSON report, annotated images and config files.
//!
//! Tests cover:
//! - Record formatting for notes, unclassified notes and shapes
//! - Record order and the written results file
//! - Box and staff-line colors on the annotated images
//! - JSON report and config round trips

mod common;

use image::{GrayImage, Luma, RgbImage};
use notescan::report::{
    self, DetectionRecord, JsonReport, NOTE_COLOR, SHAPE_A_COLOR, SHAPE_B_COLOR, STAFF_LINE_COLOR,
};
use tempfile::TempDir;

use common::*;

fn classified(detection: Detection, label: PitchLabel) -> ClassifiedNote {
    ClassifiedNote {
        detection,
        label,
        staff_index: None,
    }
}

fn sample_outcome() -> OmrOutcome {
    OmrOutcome {
        staff_lines: EXPECTED_LINES.to_vec(),
        notes: vec![
            classified(detection(0, 10, 20, 10, 0.75), PitchLabel::D),
            classified(detection(1, 40, 60, 10, 0.5), PitchLabel::Unclassified),
        ],
        shapes_a: vec![detection(2, 150, 250, 12, 0.9)],
        shapes_b: vec![detection(3, 5, 100, 9, 0.8)],
        edges: GrayImage::new(200, 300),
        highlighted: RgbImage::new(200, 300),
    }
}

#[test]
fn test_note_record_format() {
    let note = classified(detection(0, 10, 20, 10, 0.75), PitchLabel::D);
    assert_eq!(DetectionRecord::from_note(&note).to_string(), "10 20 10 10 D 0.75");
}

#[test]
fn test_unclassified_note_keeps_blank_label() {
    let note = classified(detection(0, 10, 20, 10, 0.5), PitchLabel::Unclassified);
    assert_eq!(DetectionRecord::from_note(&note).to_string(), "10 20 10 10   0.5");
}

#[test]
fn test_shape_record_has_zero_score() {
    let shape = detection(0, 150, 250, 12, 0.93);
    assert_eq!(
        DetectionRecord::from_shape(&shape, SymbolKind::ShapeA).to_string(),
        "150 250 12 12 Green 0.0"
    );
    assert_eq!(
        DetectionRecord::from_shape(&shape, SymbolKind::ShapeB).to_string(),
        "150 250 12 12 Blue 0.0"
    );
}

#[test]
fn test_records_list_notes_then_shapes() {
    let records = report::build_records(&sample_outcome());

    let labels: Vec<&str> = records.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["D", " ", "Green", "Blue"]);
}

#[test]
fn test_results_file_has_one_line_per_record() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("detected.txt");
    let records = report::build_records(&sample_outcome());

    report::write_records(&path, &records)?;

    let content = std::fs::read_to_string(&path)?;
    assert_eq!(
        content,
        "10 20 10 10 D 0.75\n40 60 10 10   0.5\n150 250 12 12 Green 0.0\n5 100 9 9 Blue 0.0\n"
    );
    Ok(())
}

#[test]
fn test_empty_outcome_writes_empty_file() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("detected.txt");

    report::write_records(&path, &[])?;

    assert_eq!(std::fs::read_to_string(&path)?, "");
    Ok(())
}

#[test]
fn test_detection_boxes_are_colored_by_kind() {
    let outcome = sample_outcome();
    let page = image::DynamicImage::ImageLuma8(blank_page(200, 300));

    let annotated = report::render_detections(&page, &outcome);

    assert_eq!(annotated.dimensions(), (200, 300));
    // Three pixels of border, interior untouched
    assert_eq!(*annotated.get_pixel(10, 20), NOTE_COLOR);
    assert_eq!(*annotated.get_pixel(12, 22), NOTE_COLOR);
    assert_eq!(annotated.get_pixel(13, 23).0, [255, 255, 255]);
    assert_eq!(*annotated.get_pixel(40, 60), NOTE_COLOR);
    assert_eq!(*annotated.get_pixel(150, 250), SHAPE_A_COLOR);
    assert_eq!(*annotated.get_pixel(161, 261), SHAPE_A_COLOR);
    assert_eq!(*annotated.get_pixel(162, 262), SHAPE_A_COLOR);
    assert_eq!(*annotated.get_pixel(5, 100), SHAPE_B_COLOR);
    assert_eq!(annotated.get_pixel(100, 150).0, [255, 255, 255]);
}

#[test]
fn test_box_corners_are_inclusive() {
    let mut outcome = sample_outcome();
    outcome.notes.truncate(1);
    outcome.shapes_a.clear();
    outcome.shapes_b.clear();
    let page = image::DynamicImage::ImageLuma8(blank_page(200, 300));

    let annotated = report::render_detections(&page, &outcome);

    // 10x10 note at (10, 20): outer edge on x = 20 and y = 30
    assert_eq!(*annotated.get_pixel(20, 30), NOTE_COLOR);
    assert_eq!(*annotated.get_pixel(20, 20), NOTE_COLOR);
    assert_eq!(*annotated.get_pixel(10, 30), NOTE_COLOR);
    assert_eq!(*annotated.get_pixel(18, 28), NOTE_COLOR);
    assert_eq!(annotated.get_pixel(17, 27).0, [255, 255, 255]);
    assert_eq!(annotated.get_pixel(21, 31).0, [255, 255, 255]);
}

#[test]
fn test_staff_lines_are_drawn_across_edge_map() {
    let edges = GrayImage::from_pixel(20, 10, Luma([0u8]));

    let rendered = report::render_staff_lines(&edges, &[4]);

    for x in 0..20 {
        assert_eq!(*rendered.get_pixel(x, 4), STAFF_LINE_COLOR);
    }
    assert_eq!(rendered.get_pixel(5, 5).0, [0, 0, 0]);
}

#[test]
fn test_json_report_round_trip() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("detected.json");
    let outcome = sample_outcome();

    report::write_json_report(&path, &outcome)?;

    let loaded: JsonReport = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(loaded.staff_lines, EXPECTED_LINES.to_vec());
    assert_eq!(loaded.staves, 2);
    assert_eq!(loaded.records, report::build_records(&outcome));
    Ok(())
}

#[test]
fn test_partial_config_keeps_defaults() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("config.json");
    std::fs::write(&path, r#"{"matching": {"threshold": 0.8}, "staff": {"min_line_distance": 7}}"#)?;

    let config = OmrConfig::load_json(&path)?;

    assert_eq!(config.matching.threshold, 0.8);
    assert!(config.matching.parallel);
    assert_eq!(config.staff.min_line_distance, 7);
    assert_eq!(config.staff.on_threshold, 97);
    assert_eq!(config.nms, OmrConfig::default().nms);
    assert_eq!(config.preprocess, OmrConfig::default().preprocess);
    Ok(())
}

#[test]
fn test_config_round_trip() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("config.json");
    let mut config = OmrConfig::default();
    config.pitch.band_margin = 20;
    config.matching.deadline_ms = Some(500);

    config.write_json(&path)?;
    let loaded = OmrConfig::load_json(&path)?;

    assert_eq!(loaded, config);
    Ok(())
}

#[test]
fn test_malformed_config_is_rejected() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("config.json");
    std::fs::write(&path, "{ not json")?;

    let result = OmrConfig::load_json(&path);

    assert!(matches!(result, Err(notescan::OmrError::Json(_))));
    Ok(())
}
