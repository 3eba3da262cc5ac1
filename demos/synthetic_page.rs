//! Write a synthetic two-staff page and matching templates, then run the
//! recogniser on it.
//!
//! Usage: cargo run --example synthetic_page [OUTPUT_DIR]

use image::{GrayImage, Luma};
use notescan::{OmrPipeline, TemplateSet, report};
use std::path::PathBuf;

const WHITE: Luma<u8> = Luma([255]);
const BLACK: Luma<u8> = Luma([0]);

fn note_head() -> GrayImage {
    GrayImage::from_fn(10, 10, |x, y| {
        if (2..8).contains(&x) && (2..8).contains(&y) { BLACK } else { WHITE }
    })
}

fn ring() -> GrayImage {
    GrayImage::from_fn(12, 12, |x, y| {
        let inside = (2..10).contains(&x) && (2..10).contains(&y);
        let edge = x == 2 || x == 9 || y == 2 || y == 9;
        if inside && edge { BLACK } else { WHITE }
    })
}

fn plus() -> GrayImage {
    GrayImage::from_fn(9, 9, |x, y| {
        let arm = ((1..8).contains(&x) && y == 4) || ((1..8).contains(&y) && x == 4);
        if arm { BLACK } else { WHITE }
    })
}

fn page() -> GrayImage {
    let mut page = GrayImage::from_pixel(200, 300, WHITE);

    for top in [40, 52, 64, 76, 88, 160, 172, 184, 196, 208] {
        for y in top..top + 3 {
            for x in 0..page.width() {
                page.put_pixel(x, y, BLACK);
            }
        }
    }

    let head = note_head();
    for (x, y) in [(60, 15), (60, 120), (120, 145)] {
        image::imageops::replace(&mut page, &head, x, y);
    }
    image::imageops::replace(&mut page, &ring(), 150, 250);
    image::imageops::replace(&mut page, &plus(), 20, 270);

    page
}

fn main() -> anyhow::Result<()> {
    let out_dir = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("part2"));
    std::fs::create_dir_all(&out_dir)?;

    let page_path = out_dir.join("synthetic_page.png");
    let note_path = out_dir.join("note.png");
    let shape_a_path = out_dir.join("shape.png");
    let shape_b_path = out_dir.join("shape1.png");

    page().save(&page_path)?;
    note_head().save(&note_path)?;
    ring().save(&shape_a_path)?;
    plus().save(&shape_b_path)?;
    println!("Created {} (200x300, two staves)", page_path.display());

    let templates = TemplateSet::load(&note_path, &shape_a_path, &shape_b_path)?;
    let img = image::open(&page_path)?;
    let outcome = OmrPipeline::default().detect(&img, &templates)?;

    println!("Staff lines: {:?}", outcome.staff_lines);
    for record in report::build_records(&outcome) {
        println!("  {}", record);
    }

    Ok(())
}
