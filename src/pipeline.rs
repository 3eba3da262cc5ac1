use anyhow::Result;
use image::DynamicImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Data that flows through the pipeline
#[derive(Clone)]
pub struct PipelineData {
    /// The current image (grayscale, color or binary depending on the step)
    pub image: DynamicImage,

    /// Named intermediate images kept for later stages or diagnostics
    pub artifacts: HashMap<String, DynamicImage>,
}

impl PipelineData {
    /// Create PipelineData for a full image
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            image,
            artifacts: HashMap::new(),
        }
    }

    /// Replace the current image, keeping artifacts
    pub fn with_image(mut self, image: DynamicImage) -> Self {
        self.image = image;
        self
    }

    /// Store a named intermediate image
    pub fn with_artifact(mut self, key: impl Into<String>, image: DynamicImage) -> Self {
        self.artifacts.insert(key.into(), image);
        self
    }

    pub fn artifact(&self, key: &str) -> Option<&DynamicImage> {
        self.artifacts.get(key)
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

impl DebugConfig {
    /// Prepare a debug directory. It must be empty or non-existent.
    pub fn new(output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        Ok(Self { output_dir })
    }

    fn save(&self, step_dir_name: &str, image: &DynamicImage) -> Result<()> {
        let step_dir = self.output_dir.join(step_dir_name);
        std::fs::create_dir_all(&step_dir)?;
        let output_path = step_dir.join("01.png");
        image
            .save(&output_path)
            .map_err(|e| anyhow::anyhow!("Failed to save debug image {}: {}", output_path.display(), e))?;
        debug!("saved debug image {}/01.png", step_dir_name);
        Ok(())
    }
}

/// Context available to all pipeline steps
#[derive(Clone, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Transform the data and hand it to the next step
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData>;

    /// Human-readable name for this step (used in logs and debug directory names)
    fn name(&self) -> &str;
}

/// Composable pipeline builder
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext::default(),
        }
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: impl AsRef<Path>) -> Result<Self> {
        self.context.debug = Some(DebugConfig::new(output_dir.as_ref().to_path_buf())?);
        Ok(self)
    }

    /// Reuse an already prepared debug directory
    pub fn with_debug_config(mut self, debug: Option<DebugConfig>) -> Self {
        self.context.debug = debug;
        self
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Box<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run all steps in order on an input image
    pub fn run(&self, input: DynamicImage) -> Result<PipelineData> {
        if let Some(debug_config) = &self.context.debug {
            debug_config.save("00_input", &input)?;
        }

        let mut data = PipelineData::from_image(input);

        for (step_idx, step) in self.steps.iter().enumerate() {
            let step_name = step.name();
            debug!(step = step_name, "running pipeline step");

            data = step.process(data, &self.context)?;

            if let Some(debug_config) = &self.context.debug {
                let step_dir_name = format!(
                    "{:02}_{}",
                    step_idx + 1,
                    step_name.to_lowercase().replace(' ', "_")
                );
                debug_config.save(&step_dir_name, &data.image)?;
            }
        }

        Ok(data)
    }

    /// Run the pipeline but stop after `num_steps` steps (useful for debugging)
    pub fn run_partial(&self, input: DynamicImage, num_steps: usize) -> Result<PipelineData> {
        let mut data = PipelineData::from_image(input);

        for step in self.steps.iter().take(num_steps) {
            debug!(step = step.name(), "running pipeline step");
            data = step.process(data, &self.context)?;
        }

        Ok(data)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
