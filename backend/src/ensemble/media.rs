use shared::MediaKind;
use std::path::{Path, PathBuf};

use super::EnsembleError;

pub const MIN_FRAME_SAMPLES: u32 = 1;
pub const MAX_FRAME_SAMPLES: u32 = 50;

/// The single piece of media a deepfake job runs on.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaReference {
    Image(PathBuf),
    Video { path: PathBuf, frame_samples: u32 },
}

impl MediaReference {
    /// Builds the reference from the loosely-typed request fields.
    ///
    /// Empty strings count as absent. Exactly one of `image` and `video` must
    /// remain; the frame count is only checked for video.
    pub fn from_inputs(
        image: Option<&str>,
        video: Option<&str>,
        num_frames: u32,
    ) -> Result<Self, EnsembleError> {
        let image = image.map(str::trim).filter(|p| !p.is_empty());
        let video = video.map(str::trim).filter(|p| !p.is_empty());

        match (image, video) {
            (Some(_), Some(_)) => Err(EnsembleError::BothMediaSupplied),
            (None, None) => Err(EnsembleError::NoMediaSupplied),
            (Some(image), None) => Ok(MediaReference::Image(PathBuf::from(image))),
            (None, Some(video)) => {
                if !(MIN_FRAME_SAMPLES..=MAX_FRAME_SAMPLES).contains(&num_frames) {
                    return Err(EnsembleError::InvalidFrameCount {
                        got: num_frames,
                        min: MIN_FRAME_SAMPLES,
                        max: MAX_FRAME_SAMPLES,
                    });
                }
                Ok(MediaReference::Video {
                    path: PathBuf::from(video),
                    frame_samples: num_frames,
                })
            }
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            MediaReference::Image(path) => path,
            MediaReference::Video { path, .. } => path,
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            MediaReference::Image(_) => MediaKind::Image,
            MediaReference::Video { .. } => MediaKind::Video,
        }
    }

    pub fn frame_samples(&self) -> Option<u32> {
        match self {
            MediaReference::Image(_) => None,
            MediaReference::Video { frame_samples, .. } => Some(*frame_samples),
        }
    }

    pub fn file_name(&self) -> String {
        self.path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
