use std::path::PathBuf;
use std::time::Duration;

/// Errors returned by the detection stages.
///
/// Only precondition violations end up here. Degenerate numeric cases such as
/// a zero-variance correlation window are handled where they occur.
#[derive(thiserror::Error, Debug)]
pub enum OmrError {
    #[error("image has zero size ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("template `{name}` has zero size")]
    EmptyTemplate { name: String },
    #[error("correlation buffers differ in length (template={template}, region={region})")]
    LengthMismatch { template: usize, region: usize },
    #[error("template search was cancelled")]
    SearchCancelled,
    #[error("template search exceeded its deadline after {elapsed:?}")]
    DeadlineExceeded { elapsed: Duration },
    #[error("failed to load image {path}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type OmrResult<T> = Result<T, OmrError>;
