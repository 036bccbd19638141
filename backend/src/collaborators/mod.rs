//! Contracts of the external inference components.
//!
//! Face detection, reenactment and the deepfake ensemble all run outside this
//! process. The traits below are the only surface the service relies on; the
//! production implementations live in [`bridge`].

pub mod bridge;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::ensemble::weights::ModelWeightMap;

#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("Unknown model '{0}'")]
    UnknownModel(String),
    #[error("{0}")]
    Failed(String),
    #[error("Bridge I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed bridge response: {0}")]
    Protocol(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectOptions {
    pub save_json: bool,
    pub json_path: PathBuf,
    pub save_annotated: bool,
    pub output_folder: PathBuf,
}

pub trait Detector: Send {
    fn detect(
        &self,
        image_path: &Path,
        options: &DetectOptions,
    ) -> Result<Vec<Detection>, CollaboratorError>;
}

pub trait DetectorFactory: Send + Sync {
    fn create(&self, model: &str) -> Result<Box<dyn Detector>, CollaboratorError>;
    fn models(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReenactOptions {
    pub save_comparison: bool,
    pub resize_to_image_resolution: bool,
}

/// Animates a still face with the motion of a driving video.
///
/// With `save_comparison` set, implementations also drop
/// `comparison_{source}_by_{driving}.mp4` next to their output without
/// reporting it.
pub trait Reenactor: Send {
    fn reenact_from_video(
        &self,
        source_path: &Path,
        driving_video_path: &Path,
        output_path: &Path,
        options: &ReenactOptions,
    ) -> Result<PathBuf, CollaboratorError>;
}

pub trait ReenactorFactory: Send + Sync {
    fn create(&self, model: &str) -> Result<Box<dyn Reenactor>, CollaboratorError>;
    fn models(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PipelineOptions {
    pub save_csv: bool,
    pub num_frames: Option<u32>,
}

pub trait DeepfakePipeline: Send {
    /// Returns `true` when the ensemble judges the media to be a deepfake.
    fn detect(
        &self,
        media_path: &Path,
        output_folder: &Path,
        options: &PipelineOptions,
    ) -> Result<bool, CollaboratorError>;
}

pub trait DeepfakePipelineFactory: Send + Sync {
    fn create(
        &self,
        weights: &ModelWeightMap,
        device: Option<&str>,
        confidence_threshold: f64,
    ) -> Result<Box<dyn DeepfakePipeline>, CollaboratorError>;
}

/// Compute device handed to the pipeline. `Auto` lets the pipeline pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ComputeDevice {
    #[default]
    Auto,
    Cpu,
    Cuda(u32),
}

impl ComputeDevice {
    pub fn as_option(&self) -> Option<String> {
        match self {
            ComputeDevice::Auto => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputeDevice::Auto => write!(f, "auto"),
            ComputeDevice::Cpu => write!(f, "cpu"),
            ComputeDevice::Cuda(index) => write!(f, "cuda:{}", index),
        }
    }
}

impl FromStr for ComputeDevice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(ComputeDevice::Auto),
            "cpu" => Ok(ComputeDevice::Cpu),
            "cuda" => Ok(ComputeDevice::Cuda(0)),
            other => other
                .strip_prefix("cuda:")
                .and_then(|index| index.parse().ok())
                .map(ComputeDevice::Cuda)
                .ok_or_else(|| format!("unsupported compute device '{}'", s)),
        }
    }
}

impl TryFrom<String> for ComputeDevice {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ComputeDevice> for String {
    fn from(device: ComputeDevice) -> Self {
        device.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_devices() {
        assert_eq!("auto".parse::<ComputeDevice>(), Ok(ComputeDevice::Auto));
        assert_eq!("CPU".parse::<ComputeDevice>(), Ok(ComputeDevice::Cpu));
        assert_eq!("cuda".parse::<ComputeDevice>(), Ok(ComputeDevice::Cuda(0)));
        assert_eq!("cuda:2".parse::<ComputeDevice>(), Ok(ComputeDevice::Cuda(2)));
        assert!("tpu".parse::<ComputeDevice>().is_err());
    }

    #[test]
    fn auto_device_is_left_to_the_pipeline() {
        assert_eq!(ComputeDevice::Auto.as_option(), None);
        assert_eq!(ComputeDevice::Cuda(1).as_option(), Some("cuda:1".to_string()));
    }
}
