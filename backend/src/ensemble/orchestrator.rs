use log::{error, info};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use super::EnsembleError;
use super::media::MediaReference;
use super::weights::ModelWeightMap;
use crate::collaborators::{ComputeDevice, DeepfakePipelineFactory, PipelineOptions};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionVerdict {
    pub is_deepfake: bool,
    pub effective_confidence: f64,
}

impl DetectionVerdict {
    /// The pipeline only reports a boolean, so the displayed confidence is the
    /// threshold itself for a positive verdict and its complement otherwise.
    pub fn from_threshold(is_deepfake: bool, confidence_threshold: f64) -> Self {
        let effective_confidence = if is_deepfake {
            confidence_threshold
        } else {
            1.0 - confidence_threshold
        };
        Self {
            is_deepfake,
            effective_confidence,
        }
    }
}

/// Runs one deepfake detection job against a weighted model set.
#[derive(Clone)]
pub struct EnsembleDetectionOrchestrator {
    pipelines: Arc<dyn DeepfakePipelineFactory>,
    device: ComputeDevice,
}

impl EnsembleDetectionOrchestrator {
    pub fn new(pipelines: Arc<dyn DeepfakePipelineFactory>, device: ComputeDevice) -> Self {
        Self { pipelines, device }
    }

    pub fn detect(
        &self,
        media: &MediaReference,
        weights: &ModelWeightMap,
        confidence_threshold: f64,
        output_folder: &Path,
    ) -> Result<DetectionVerdict, EnsembleError> {
        if !(0.0..=1.0).contains(&confidence_threshold) {
            return Err(EnsembleError::InvalidThreshold(confidence_threshold));
        }

        let path = media.path();
        if !path.is_file() || File::open(path).is_err() {
            return Err(EnsembleError::MediaNotFound(path.to_path_buf()));
        }

        let device = self.device.as_option();
        let options = PipelineOptions {
            save_csv: true,
            num_frames: media.frame_samples(),
        };

        info!(
            "Running deepfake ensemble on {} ({}, models: {}, threshold: {:.2}, device: {})",
            path.display(),
            media.kind(),
            weights,
            confidence_threshold,
            self.device
        );

        let is_deepfake = self
            .pipelines
            .create(weights, device.as_deref(), confidence_threshold)
            .and_then(|pipeline| pipeline.detect(path, output_folder, &options))
            .map_err(|e| {
                error!("Deepfake pipeline failed for {}: {}", path.display(), e);
                EnsembleError::PipelineFailure(e.to_string())
            })?;

        let verdict = DetectionVerdict::from_threshold(is_deepfake, confidence_threshold);
        info!(
            "Deepfake verdict for {}: {} ({:.1}%)",
            path.display(),
            if verdict.is_deepfake { "deepfake" } else { "authentic" },
            verdict.effective_confidence * 100.0
        );
        Ok(verdict)
    }
}
