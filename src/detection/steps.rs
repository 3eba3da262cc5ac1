use crate::config::PreprocessParams;
use crate::detection::preprocessing;
use crate::pipeline::{Pipeline, PipelineContext, PipelineData, PipelineStep};
use anyhow::Result;
use image::DynamicImage;

/// Artifact key under which the highlighted page is kept
pub const HIGHLIGHTED_ARTIFACT: &str = "highlighted";

/// Convert image to grayscale
pub struct GrayscaleStep;

impl PipelineStep for GrayscaleStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let gray = preprocessing::to_grayscale(&data.image);
        Ok(data.with_image(DynamicImage::ImageLuma8(gray)))
    }

    fn name(&self) -> &str {
        "Grayscale Conversion"
    }
}

/// Mark very dark pixels; the result is also kept as an artifact
pub struct HighlightStep {
    pub dark_threshold: u8,
}

impl PipelineStep for HighlightStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let gray = preprocessing::to_grayscale(&data.image);
        let highlighted = DynamicImage::ImageRgb8(preprocessing::highlight_dark(&gray, self.dark_threshold));
        Ok(data
            .with_artifact(HIGHLIGHTED_ARTIFACT, highlighted.clone())
            .with_image(highlighted))
    }

    fn name(&self) -> &str {
        "Dark Highlight"
    }
}

pub struct SmoothStep;

impl PipelineStep for SmoothStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let rgb = data.image.to_rgb8();
        let smoothed = preprocessing::smooth(&rgb);
        Ok(data.with_image(DynamicImage::ImageRgb8(smoothed)))
    }

    fn name(&self) -> &str {
        "Smoothing"
    }
}

/// Edge filter followed by the collapse to one channel
pub struct EdgeDetectionStep;

impl PipelineStep for EdgeDetectionStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let rgb = data.image.to_rgb8();
        let edges = preprocessing::find_edges(&rgb);
        Ok(data.with_image(DynamicImage::ImageLuma8(edges)))
    }

    fn name(&self) -> &str {
        "Edge Detection"
    }
}

pub struct BinarizeStep {
    pub threshold: u8,
}

impl PipelineStep for BinarizeStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let gray = preprocessing::to_grayscale(&data.image);
        let binary = preprocessing::binarize(&gray, self.threshold);
        Ok(data.with_image(DynamicImage::ImageLuma8(binary)))
    }

    fn name(&self) -> &str {
        "Binarize"
    }
}

pub struct NoiseFilterStep {
    pub radius: u8,
}

impl PipelineStep for NoiseFilterStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let gray = preprocessing::to_grayscale(&data.image);
        let filtered = preprocessing::max_filter(&gray, self.radius);
        Ok(data.with_image(DynamicImage::ImageLuma8(filtered)))
    }

    fn name(&self) -> &str {
        "Noise Filter"
    }
}

/// Build the standard page preprocessing pipeline
pub fn build_preprocessing_pipeline(params: &PreprocessParams) -> Pipeline {
    Pipeline::new()
        .add_step(Box::new(GrayscaleStep))
        .add_step(Box::new(HighlightStep {
            dark_threshold: params.dark_threshold,
        }))
        .add_step(Box::new(SmoothStep))
        .add_step(Box::new(EdgeDetectionStep))
        .add_step(Box::new(BinarizeStep {
            threshold: params.binary_threshold,
        }))
        .add_step(Box::new(NoiseFilterStep {
            radius: params.noise_filter_radius,
        }))
}
