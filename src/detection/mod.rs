pub mod matching;
pub mod nms;
pub mod pitch;
pub mod preprocessing;
pub mod staff;
pub mod steps;

use crate::config::OmrConfig;
use crate::error::OmrError;
use crate::models::{ClassifiedNote, Detection, SymbolKind};
use crate::pipeline::DebugConfig;
use anyhow::Context;
use image::{DynamicImage, GrayImage, RgbImage};
use matching::{SearchBudget, Template, TemplateSet};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Output of page preprocessing
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Binary edge map, values 0 or 255
    pub edges: GrayImage,
    /// Page with very dark pixels painted red; diagnostics only
    pub highlighted: RgbImage,
}

/// Everything a recognition run produces
#[derive(Debug, Clone)]
pub struct OmrOutcome {
    pub staff_lines: Vec<u32>,
    pub notes: Vec<ClassifiedNote>,
    pub shapes_a: Vec<Detection>,
    pub shapes_b: Vec<Detection>,
    pub edges: GrayImage,
    pub highlighted: RgbImage,
}

impl OmrOutcome {
    pub fn shapes(&self, kind: SymbolKind) -> &[Detection] {
        match kind {
            SymbolKind::ShapeA => &self.shapes_a,
            SymbolKind::ShapeB => &self.shapes_b,
            SymbolKind::Note => &[],
        }
    }
}

/// Main recognition pipeline orchestrator
pub struct OmrPipeline {
    pub config: OmrConfig,
    debug: Option<DebugConfig>,
}

impl OmrPipeline {
    pub fn new(config: OmrConfig) -> Self {
        Self { config, debug: None }
    }

    /// Dump every preprocessing stage under `output_dir` (must be empty)
    pub fn with_debug(mut self, output_dir: PathBuf) -> anyhow::Result<Self> {
        self.debug = Some(DebugConfig::new(output_dir)?);
        Ok(self)
    }

    /// Run the preprocessing steps and return the edge map and highlighted page
    pub fn preprocess(&self, img: &DynamicImage) -> anyhow::Result<Preprocessed> {
        if img.width() == 0 || img.height() == 0 {
            return Err(OmrError::EmptyImage {
                width: img.width(),
                height: img.height(),
            }
            .into());
        }

        let pipeline =
            steps::build_preprocessing_pipeline(&self.config.preprocess).with_debug_config(self.debug.clone());
        let data = pipeline.run(img.clone())?;

        let highlighted = data
            .artifact(steps::HIGHLIGHTED_ARTIFACT)
            .map(|img| img.to_rgb8())
            .ok_or_else(|| anyhow::anyhow!("Missing {} artifact", steps::HIGHLIGHTED_ARTIFACT))?;

        Ok(Preprocessed {
            edges: preprocessing::to_grayscale(&data.image),
            highlighted,
        })
    }

    /// Template search followed by suppression of overlapping hits
    pub fn find_symbols(&self, page: &GrayImage, template: &Template) -> anyhow::Result<Vec<Detection>> {
        let budget = SearchBudget::with_deadline(self.config.matching.deadline());
        let started = Instant::now();

        let candidates = matching::match_template(page, template, &self.config.matching, &budget)
            .with_context(|| format!("Template search for {} failed", template.name))?;
        let kept = nms::non_max_suppression(&candidates, self.config.nms.overlap_threshold);

        info!(
            template = %template.name,
            candidates = candidates.len(),
            kept = kept.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "symbol search"
        );

        Ok(kept)
    }

    /// Run the full recognition pipeline on a page
    pub fn detect(&self, img: &DynamicImage, templates: &TemplateSet) -> anyhow::Result<OmrOutcome> {
        debug!("preprocessing {}x{} page", img.width(), img.height());
        let Preprocessed { edges, highlighted } = self.preprocess(img)?;

        let staff_lines = staff::detect_staff_lines(&edges, &self.config.staff);
        info!(lines = staff_lines.len(), staves = staff_lines.len() / 5, "staff lines detected");

        let page = preprocessing::to_grayscale(img);
        let note_hits = self.find_symbols(&page, &templates.note)?;
        let shapes_a = self.find_symbols(&page, &templates.shape_a)?;
        let shapes_b = self.find_symbols(&page, &templates.shape_b)?;

        let notes = pitch::classify_notes(&staff_lines, &note_hits, &self.config.pitch);
        let classified = notes.iter().filter(|n| n.label.is_classified()).count();
        info!(notes = notes.len(), classified, "notes labelled");

        Ok(OmrOutcome {
            staff_lines,
            notes,
            shapes_a,
            shapes_b,
            edges,
            highlighted,
        })
    }
}

impl Default for OmrPipeline {
    fn default() -> Self {
        Self::new(OmrConfig::default())
    }
}
