use image::{DynamicImage, GrayImage, Luma};
use notescan::{BoundingBox, Detection, PitchLabel, SymbolKind, Template, TemplateSet};
use std::path::{Path, PathBuf};

pub const WHITE: Luma<u8> = Luma([255u8]);
pub const BLACK: Luma<u8> = Luma([0u8]);

/// Line tops of the two staves on the synthetic page; each line is 3 rows thick
pub const STAFF_1_TOPS: [u32; 5] = [40, 52, 64, 76, 88];
pub const STAFF_2_TOPS: [u32; 5] = [160, 172, 184, 196, 208];

/// Rows the detector reports for the staves above
pub const EXPECTED_LINES: [u32; 10] = [38, 50, 62, 74, 86, 158, 170, 182, 194, 206];

/// Note positions on the synthetic page, in discovery order, with their labels
pub const NOTE_POSITIONS: [(u32, u32); 3] = [(60, 15), (60, 120), (120, 145)];
pub const NOTE_LABELS: [PitchLabel; 3] = [PitchLabel::B, PitchLabel::C, PitchLabel::B];
pub const RING_POSITION: (u32, u32) = (150, 250);

pub fn blank_page(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, WHITE)
}

/// Draw 3-row thick black lines across the whole width
pub fn draw_staff(page: &mut GrayImage, tops: &[u32]) {
    for &top in tops {
        for y in top..top + 3 {
            for x in 0..page.width() {
                page.put_pixel(x, y, BLACK);
            }
        }
    }
}

/// Copy `template` into `page` with its top-left corner at (x, y)
pub fn stamp(page: &mut GrayImage, template: &GrayImage, x: u32, y: u32) {
    image::imageops::replace(page, template, x as i64, y as i64);
}

/// 10x10 white square with a 6x6 black head in the middle
pub fn note_head() -> GrayImage {
    GrayImage::from_fn(10, 10, |x, y| {
        if (2..8).contains(&x) && (2..8).contains(&y) { BLACK } else { WHITE }
    })
}

/// 12x12 white square with a 1-pixel 8x8 outline in the middle
pub fn ring() -> GrayImage {
    GrayImage::from_fn(12, 12, |x, y| {
        let inside = (2..10).contains(&x) && (2..10).contains(&y);
        let edge = x == 2 || x == 9 || y == 2 || y == 9;
        if inside && edge { BLACK } else { WHITE }
    })
}

/// 9x9 white square with a 7-pixel plus sign
pub fn plus() -> GrayImage {
    GrayImage::from_fn(9, 9, |x, y| {
        let arm = ((1..8).contains(&x) && y == 4) || ((1..8).contains(&y) && x == 4);
        if arm { BLACK } else { WHITE }
    })
}

pub fn template_set() -> TemplateSet {
    TemplateSet {
        note: Template::new("note", SymbolKind::Note, note_head()).expect("note template"),
        shape_a: Template::new("ring", SymbolKind::ShapeA, ring()).expect("ring template"),
        shape_b: Template::new("plus", SymbolKind::ShapeB, plus()).expect("plus template"),
    }
}

/// 200x300 page with two staves, three note heads and one ring
pub fn two_staff_page() -> DynamicImage {
    let mut page = blank_page(200, 300);
    draw_staff(&mut page, &STAFF_1_TOPS);
    draw_staff(&mut page, &STAFF_2_TOPS);

    let head = note_head();
    for (x, y) in NOTE_POSITIONS {
        stamp(&mut page, &head, x, y);
    }
    stamp(&mut page, &ring(), RING_POSITION.0, RING_POSITION.1);

    DynamicImage::ImageLuma8(page)
}

/// Binary edge map with the given rows fully on
pub fn edge_map_with_rows(width: u32, height: u32, rows: &[u32]) -> GrayImage {
    GrayImage::from_fn(width, height, |_, y| if rows.contains(&y) { Luma([255u8]) } else { Luma([0u8]) })
}

pub fn detection(index: usize, x: u32, y: u32, size: u32, score: f64) -> Detection {
    Detection {
        index,
        bbox: BoundingBox::new(x, y, size, size),
        score,
    }
}

/// Deterministic pseudo-random bytes
pub fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 56) as u8
        })
        .collect()
}

/// Write the synthetic page and the three templates into `dir`.
/// Returns (page, note, shape_a, shape_b) paths.
pub fn write_inputs(dir: &Path) -> (PathBuf, PathBuf, PathBuf, PathBuf) {
    let page = dir.join("page.png");
    let note = dir.join("note.png");
    let shape_a = dir.join("shape.png");
    let shape_b = dir.join("shape1.png");

    two_staff_page().save(&page).expect("Failed to save page");
    note_head().save(&note).expect("Failed to save note template");
    ring().save(&shape_a).expect("Failed to save shape template");
    plus().save(&shape_b).expect("Failed to save shape1 template");

    (page, note, shape_a, shape_b)
}
