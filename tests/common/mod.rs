#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from notescan for tests
pub use notescan::{
    BoundingBox, ClassifiedNote, Detection, OmrConfig, OmrOutcome, OmrPipeline, PitchLabel, Staff,
    SymbolKind, Template, TemplateSet,
};
