pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;

pub use config::{MatchParams, NmsParams, OmrConfig, PitchParams, PreprocessParams, StaffParams};
pub use detection::matching::{SearchBudget, Template, TemplateSet};
pub use detection::{OmrOutcome, OmrPipeline, Preprocessed};
pub use error::{OmrError, OmrResult};
pub use models::{BoundingBox, ClassifiedNote, Detection, PitchLabel, Staff, SymbolKind};
pub use pipeline::{DebugConfig, Pipeline, PipelineContext, PipelineData, PipelineStep};
pub use report::DetectionRecord;
