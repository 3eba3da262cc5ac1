use anyhow::Context;
use clap::Parser;
use image::ImageReader;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use notescan::report;
use notescan::{OmrConfig, OmrPipeline, SymbolKind, TemplateSet};

#[derive(Parser)]
#[command(name = "notescan")]
#[command(about = "Find notes on a sheet-music scan and label their pitch")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Note head template
    #[arg(long, value_name = "PATH", default_value = "part2/note.png")]
    note: PathBuf,

    /// First auxiliary shape template (reported as Green)
    #[arg(long, value_name = "PATH", default_value = "part2/shape.png")]
    shape_a: PathBuf,

    /// Second auxiliary shape template (reported as Blue)
    #[arg(long, value_name = "PATH", default_value = "part2/shape1.png")]
    shape_b: PathBuf,

    /// Directory for detected.txt and the annotated images
    #[arg(short, long, value_name = "DIR", default_value = "part2")]
    output_dir: PathBuf,

    /// JSON file with detection parameters
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the template correlation threshold
    #[arg(long)]
    threshold: Option<f64>,

    /// Also write detected.json
    #[arg(long)]
    json: bool,

    /// Save preprocessing stages to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let mut config = match &args.config {
        Some(path) => OmrConfig::load_json(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => OmrConfig::default(),
    };
    if let Some(threshold) = args.threshold {
        config.matching.threshold = threshold;
    }

    tracing::info!("loading image {}", args.image_path.display());
    let img = ImageReader::open(&args.image_path)
        .with_context(|| format!("Failed to open image {}", args.image_path.display()))?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image {}: {}", args.image_path.display(), e))?;
    tracing::info!("image loaded: {}x{}", img.width(), img.height());

    let templates = TemplateSet::load(&args.note, &args.shape_a, &args.shape_b)?;

    let mut pipeline = OmrPipeline::new(config);
    if let Some(debug_dir) = args.debug_out {
        pipeline = pipeline.with_debug(debug_dir)?;
    }

    let outcome = pipeline.detect(&img, &templates)?;

    // Render everything before touching the output directory
    let records = report::build_records(&outcome);
    let staff_image = report::render_staff_lines(&outcome.edges, &outcome.staff_lines);
    let notes_image = report::render_detections(&img, &outcome);

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create output directory {}", args.output_dir.display()))?;

    let records_path = args.output_dir.join("detected.txt");
    report::write_records(&records_path, &records)
        .with_context(|| format!("Failed to write {}", records_path.display()))?;
    if args.json {
        let json_path = args.output_dir.join("detected.json");
        report::write_json_report(&json_path, &outcome)
            .with_context(|| format!("Failed to write {}", json_path.display()))?;
    }
    let staff_path = args.output_dir.join("staff_lines_detected.png");
    staff_image
        .save(&staff_path)
        .with_context(|| format!("Failed to save staff line image {}", staff_path.display()))?;
    let notes_path = args.output_dir.join("notes_detected.png");
    notes_image
        .save(&notes_path)
        .with_context(|| format!("Failed to save annotated image {}", notes_path.display()))?;

    println!("\n=== Staff Lines ===");
    println!("Detected {} lines ({} full staves)", outcome.staff_lines.len(), outcome.staff_lines.len() / 5);
    if args.verbose {
        println!("  rows: {:?}", outcome.staff_lines);
    }

    println!("\n=== Notes ===");
    if outcome.notes.is_empty() {
        println!("No notes detected.");
    }
    for note in &outcome.notes {
        let label = if note.label.is_classified() { note.label.as_str() } else { "?" };
        println!(
            "  {} at ({}, {}) - score: {:.3}",
            label,
            note.detection.x(),
            note.detection.y(),
            note.detection.score
        );
    }

    for kind in [SymbolKind::ShapeA, SymbolKind::ShapeB] {
        let template = templates.get(kind);
        println!(
            "\n{} shapes ({}): {}",
            kind.record_label(),
            template.name,
            outcome.shapes(kind).len()
        );
    }

    println!("\nResults written to {}", args.output_dir.display());

    Ok(())
}
