use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

pub const DEFAULT_FACE_DETECTOR: &str = "mediapipe";
pub const DEFAULT_REENACTOR: &str = "tps";
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;
pub const DEFAULT_NUM_FRAMES: u32 = 11;

/// Task partitions under the output root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Task {
    FaceDetection,
    FaceReenactment,
    DeepfakeDetection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ArtifactKind {
    Annotated,
    Comparison,
    Json,
    Csv,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DetectFacesRequest {
    pub image_path: String,
    #[serde(default = "default_face_detector")]
    pub model_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DetectFacesResponse {
    pub job_id: String,
    pub annotated_image_path: Option<String>,
    pub json_path: Option<String>,
    pub report_text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ReenactFaceRequest {
    pub source_image_path: String,
    pub driving_video_path: String,
    #[serde(default = "default_reenactor")]
    pub model_name: String,
    #[serde(default)]
    pub resize_to_image_resolution: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ReenactFaceResponse {
    pub job_id: String,
    pub reenacted_video_path: Option<String>,
    pub comparison_video_path: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DetectDeepfakesRequest {
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub video_path: Option<String>,
    #[serde(default)]
    pub selected_models: Vec<String>,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_num_frames")]
    pub num_frames: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModelWeight {
    pub model: String,
    pub weight: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DetectDeepfakesResponse {
    pub job_id: String,
    pub media_kind: MediaKind,
    pub is_deepfake: bool,
    pub effective_confidence: f64,
    pub model_weights: Vec<ModelWeight>,
    pub annotated_media_path: Option<String>,
    pub csv_path: Option<String>,
    pub report_text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModelCatalog {
    pub face_detectors: Vec<String>,
    pub reenactors: Vec<String>,
    pub deepfake_models: Vec<ModelWeight>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UploadedFile {
    pub file_name: String,
    pub stored_path: String,
    pub sha256: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UploadResponse {
    pub files: Vec<UploadedFile>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

fn default_face_detector() -> String {
    DEFAULT_FACE_DETECTOR.to_string()
}

fn default_reenactor() -> String {
    DEFAULT_REENACTOR.to_string()
}

fn default_confidence_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_num_frames() -> u32 {
    DEFAULT_NUM_FRAMES
}
