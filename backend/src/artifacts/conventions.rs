//! File names the collaborators are known to write their side files under.
//!
//! None of these paths come back through a collaborator's return value, so the
//! lists below are the naming contract. Order matters: the name currently
//! written comes first, older variants after it, wildcard fallbacks last.
//! Output folders are shared between jobs, so every wildcard is anchored on
//! the media stem plus a separator.

use shared::ArtifactKind;
use std::path::Path;

use super::locator::{ArtifactLocator, CandidatePattern, escape_glob};

pub const DETECTIONS_JSON: &str = "detections.json";
pub const COMPARISON_EXTENSION: &str = "mp4";

pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Extension including its leading dot, or an empty string.
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// Face-detection output image with the boxes drawn on it.
pub fn annotated_image(image_path: &Path) -> ArtifactLocator {
    let stem = file_stem(image_path);
    let ext = dotted_extension(image_path);
    ArtifactLocator::new(
        ArtifactKind::Annotated,
        vec![
            CandidatePattern::exact(format!("{stem}_annotated{ext}")),
            CandidatePattern::exact(format!("{stem}_detected{ext}")),
            CandidatePattern::exact(format!("{stem}_detection{ext}")),
            CandidatePattern::glob(format!("{}_annotated.*", escape_glob(&stem))),
        ],
    )
}

pub fn detections_json() -> ArtifactLocator {
    ArtifactLocator::new(
        ArtifactKind::Json,
        vec![CandidatePattern::exact(DETECTIONS_JSON)],
    )
}

/// Side-by-side video the reenactor writes when asked to save a comparison.
pub fn comparison_video(source_path: &Path, driving_path: &Path) -> ArtifactLocator {
    let source = file_stem(source_path);
    let driving = file_stem(driving_path);
    ArtifactLocator::new(
        ArtifactKind::Comparison,
        vec![
            CandidatePattern::exact(format!(
                "comparison_{source}_by_{driving}.{COMPARISON_EXTENSION}"
            )),
            CandidatePattern::glob(format!(
                "comparison_{}_by_*.{COMPARISON_EXTENSION}",
                escape_glob(&source)
            )),
        ],
    )
}

/// Directory handed to the reenactor as its output path.
pub fn reenactment_output_name(source_path: &Path) -> String {
    format!("{}_reenacted", file_stem(source_path))
}

/// Annotated copy of the analysed media, if the deepfake pipeline made one.
pub fn deepfake_annotated_media(media_path: &Path) -> ArtifactLocator {
    let stem = file_stem(media_path);
    let ext = dotted_extension(media_path);
    ArtifactLocator::new(
        ArtifactKind::Annotated,
        vec![
            CandidatePattern::exact(format!("{stem}_annotated{ext}")),
            CandidatePattern::glob(format!("{}_annotated.*", escape_glob(&stem))),
        ],
    )
}

/// Per-model results table the deepfake pipeline saves with `save_csv`.
pub fn deepfake_results_csv(media_path: &Path) -> ArtifactLocator {
    let stem = file_stem(media_path);
    ArtifactLocator::new(
        ArtifactKind::Csv,
        vec![
            CandidatePattern::exact(format!("{stem}_results.csv")),
            CandidatePattern::glob(format!("{}_results*.csv", escape_glob(&stem))),
        ],
    )
}
