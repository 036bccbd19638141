//! Collaborators backed by an external bridge process.
//!
//! Each call spawns the configured program with the operation name appended
//! to its arguments, writes one JSON request to its stdin and reads one JSON
//! reply from the last non-empty line of its stdout. Earlier stdout lines are
//! treated as the collaborator's own chatter and only logged.

use log::{debug, error};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use super::{
    CollaboratorError, DeepfakePipeline, DeepfakePipelineFactory, Detection, DetectOptions,
    Detector, DetectorFactory, PipelineOptions, ReenactOptions, Reenactor, ReenactorFactory,
};
use crate::ensemble::weights::ModelWeightMap;

pub const OP_DETECT_FACES: &str = "detect_faces";
pub const OP_REENACT: &str = "reenact";
pub const OP_DETECT_DEEPFAKES: &str = "detect_deepfakes";

#[derive(Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum BridgeReply<T> {
    Ok { result: T },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessBridge {
    program: String,
    args: Vec<String>,
}

impl ProcessBridge {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn call<Req, Resp>(&self, operation: &str, request: &Req) -> Result<Resp, CollaboratorError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_vec(request)?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(operation)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        debug!("Running collaborator bridge: {:?}", cmd);

        let mut child = cmd.spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(&payload) {
                Ok(()) => {}
                // the bridge may exit without reading; its status tells the story
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                Err(e) => return Err(e.into()),
            }
        }
        let output = child.wait_with_output()?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            let message = last_line(&stderr)
                .map(str::to_string)
                .unwrap_or_else(|| format!("bridge exited with {}", output.status));
            error!("Collaborator '{}' failed: {}", operation, message);
            return Err(CollaboratorError::Failed(message));
        }

        let reply_line = last_line(&stdout).ok_or_else(|| {
            CollaboratorError::Failed(format!("bridge returned no reply for '{}'", operation))
        })?;
        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            if line.trim() != reply_line {
                debug!("[{}] {}", operation, line);
            }
        }

        match serde_json::from_str::<BridgeReply<Resp>>(reply_line)? {
            BridgeReply::Ok { result } => Ok(result),
            BridgeReply::Error { message } => Err(CollaboratorError::Failed(message)),
        }
    }
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).rfind(|l| !l.is_empty())
}

fn ensure_registered(models: &[String], model: &str) -> Result<(), CollaboratorError> {
    if models.iter().any(|m| m == model) {
        Ok(())
    } else {
        Err(CollaboratorError::UnknownModel(model.to_string()))
    }
}

#[derive(Serialize)]
struct DetectFacesCall<'a> {
    model: &'a str,
    image_path: &'a Path,
    #[serde(flatten)]
    options: &'a DetectOptions,
}

#[derive(Deserialize)]
struct DetectFacesResult {
    detections: Vec<Detection>,
}

pub struct BridgeDetectorFactory {
    bridge: Arc<ProcessBridge>,
    models: Vec<String>,
}

impl BridgeDetectorFactory {
    pub fn new(bridge: Arc<ProcessBridge>, models: Vec<String>) -> Self {
        Self { bridge, models }
    }
}

impl DetectorFactory for BridgeDetectorFactory {
    fn create(&self, model: &str) -> Result<Box<dyn Detector>, CollaboratorError> {
        ensure_registered(&self.models, model)?;
        Ok(Box::new(BridgeDetector {
            bridge: self.bridge.clone(),
            model: model.to_string(),
        }))
    }

    fn models(&self) -> Vec<String> {
        self.models.clone()
    }
}

struct BridgeDetector {
    bridge: Arc<ProcessBridge>,
    model: String,
}

impl Detector for BridgeDetector {
    fn detect(
        &self,
        image_path: &Path,
        options: &DetectOptions,
    ) -> Result<Vec<Detection>, CollaboratorError> {
        let call = DetectFacesCall {
            model: &self.model,
            image_path,
            options,
        };
        let result: DetectFacesResult = self.bridge.call(OP_DETECT_FACES, &call)?;
        Ok(result.detections)
    }
}

#[derive(Serialize)]
struct ReenactCall<'a> {
    model: &'a str,
    source_path: &'a Path,
    driving_video_path: &'a Path,
    output_path: &'a Path,
    #[serde(flatten)]
    options: &'a ReenactOptions,
}

#[derive(Deserialize)]
struct ReenactResult {
    result_path: PathBuf,
}

pub struct BridgeReenactorFactory {
    bridge: Arc<ProcessBridge>,
    models: Vec<String>,
}

impl BridgeReenactorFactory {
    pub fn new(bridge: Arc<ProcessBridge>, models: Vec<String>) -> Self {
        Self { bridge, models }
    }
}

impl ReenactorFactory for BridgeReenactorFactory {
    fn create(&self, model: &str) -> Result<Box<dyn Reenactor>, CollaboratorError> {
        ensure_registered(&self.models, model)?;
        Ok(Box::new(BridgeReenactor {
            bridge: self.bridge.clone(),
            model: model.to_string(),
        }))
    }

    fn models(&self) -> Vec<String> {
        self.models.clone()
    }
}

struct BridgeReenactor {
    bridge: Arc<ProcessBridge>,
    model: String,
}

impl Reenactor for BridgeReenactor {
    fn reenact_from_video(
        &self,
        source_path: &Path,
        driving_video_path: &Path,
        output_path: &Path,
        options: &ReenactOptions,
    ) -> Result<PathBuf, CollaboratorError> {
        let call = ReenactCall {
            model: &self.model,
            source_path,
            driving_video_path,
            output_path,
            options,
        };
        let result: ReenactResult = self.bridge.call(OP_REENACT, &call)?;
        Ok(result.result_path)
    }
}

#[derive(Serialize)]
struct DetectDeepfakesCall<'a> {
    model_configs: &'a ModelWeightMap,
    device: Option<&'a str>,
    confidence_threshold: f64,
    media_path: &'a Path,
    output_folder: &'a Path,
    #[serde(flatten)]
    options: &'a PipelineOptions,
}

#[derive(Deserialize)]
struct DetectDeepfakesResult {
    is_deepfake: bool,
}

pub struct BridgePipelineFactory {
    bridge: Arc<ProcessBridge>,
}

impl BridgePipelineFactory {
    pub fn new(bridge: Arc<ProcessBridge>) -> Self {
        Self { bridge }
    }
}

impl DeepfakePipelineFactory for BridgePipelineFactory {
    fn create(
        &self,
        weights: &ModelWeightMap,
        device: Option<&str>,
        confidence_threshold: f64,
    ) -> Result<Box<dyn DeepfakePipeline>, CollaboratorError> {
        Ok(Box::new(BridgePipeline {
            bridge: self.bridge.clone(),
            weights: weights.clone(),
            device: device.map(str::to_string),
            confidence_threshold,
        }))
    }
}

struct BridgePipeline {
    bridge: Arc<ProcessBridge>,
    weights: ModelWeightMap,
    device: Option<String>,
    confidence_threshold: f64,
}

impl DeepfakePipeline for BridgePipeline {
    fn detect(
        &self,
        media_path: &Path,
        output_folder: &Path,
        options: &PipelineOptions,
    ) -> Result<bool, CollaboratorError> {
        let call = DetectDeepfakesCall {
            model_configs: &self.weights,
            device: self.device.as_deref(),
            confidence_threshold: self.confidence_threshold,
            media_path,
            output_folder,
            options,
        };
        let result: DetectDeepfakesResult = self.bridge.call(OP_DETECT_DEEPFAKES, &call)?;
        Ok(result.is_deepfake)
    }
}
