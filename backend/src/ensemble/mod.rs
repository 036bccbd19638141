pub mod media;
pub mod orchestrator;
pub mod weights;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EnsembleError {
    #[error("Please select at least one model to use for deepfake detection")]
    NoModelsSelected,
    #[error("Invalid model registry: {0}")]
    InvalidRegistry(String),
    #[error("Please upload either an image or video file")]
    NoMediaSupplied,
    #[error("Please upload an image or a video, not both")]
    BothMediaSupplied,
    #[error("Confidence threshold must be between 0 and 1, got {0}")]
    InvalidThreshold(f64),
    #[error("Number of frames must be between {min} and {max}, got {got}")]
    InvalidFrameCount { got: u32, min: u32, max: u32 },
    #[error("Media file not found: {0}")]
    MediaNotFound(PathBuf),
    #[error("Deepfake pipeline failed: {0}")]
    PipelineFailure(String),
}
