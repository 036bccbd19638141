//! In-process collaborators for handler and dispatcher tests. They write the
//! same side files the real components do so artifact discovery is exercised.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use super::FaceSuite;
use crate::artifacts::conventions::{dotted_extension, file_stem};
use crate::collaborators::{
    BoundingBox, CollaboratorError, ComputeDevice, DeepfakePipeline, DeepfakePipelineFactory,
    DetectOptions, Detection, Detector, DetectorFactory, PipelineOptions, ReenactOptions,
    Reenactor, ReenactorFactory,
};
use crate::ensemble::weights::{ModelRegistry, ModelWeightMap, RegisteredModel};

pub const FACE_DETECTORS: &[&str] = &["blazeface", "mediapipe", "ultralight"];

pub struct FakeDetectors {
    side_files: bool,
}

struct FakeDetector {
    side_files: bool,
}

impl Detector for FakeDetector {
    fn detect(
        &self,
        image_path: &Path,
        options: &DetectOptions,
    ) -> Result<Vec<Detection>, CollaboratorError> {
        if self.side_files {
            let annotated = format!(
                "{}_detected{}",
                file_stem(image_path),
                dotted_extension(image_path)
            );
            fs::write(options.output_folder.join(annotated), b"boxes")?;
            fs::write(&options.json_path, b"[]")?;
        }
        Ok(vec![Detection {
            bbox: BoundingBox {
                x1: 10.0,
                y1: 20.0,
                x2: 110.0,
                y2: 140.0,
            },
            confidence: 0.97,
        }])
    }
}

impl DetectorFactory for FakeDetectors {
    fn create(&self, model: &str) -> Result<Box<dyn Detector>, CollaboratorError> {
        if !FACE_DETECTORS.contains(&model) {
            return Err(CollaboratorError::UnknownModel(model.to_string()));
        }
        Ok(Box::new(FakeDetector {
            side_files: self.side_files,
        }))
    }

    fn models(&self) -> Vec<String> {
        FACE_DETECTORS.iter().map(|m| m.to_string()).collect()
    }
}

pub struct FakeReenactors {
    calls: Arc<Mutex<Vec<(PathBuf, bool)>>>,
}

struct FakeReenactor {
    calls: Arc<Mutex<Vec<(PathBuf, bool)>>>,
}

impl Reenactor for FakeReenactor {
    fn reenact_from_video(
        &self,
        source_path: &Path,
        driving_video_path: &Path,
        output_path: &Path,
        options: &ReenactOptions,
    ) -> Result<PathBuf, CollaboratorError> {
        self.calls
            .lock()
            .unwrap()
            .push((output_path.to_path_buf(), options.resize_to_image_resolution));

        let source = file_stem(source_path);
        let driving = file_stem(driving_video_path);
        fs::create_dir_all(output_path)?;
        let result = output_path.join(format!("{source}_by_{driving}.mp4"));
        fs::write(&result, b"video")?;
        if options.save_comparison {
            fs::write(
                output_path.join(format!("comparison_{source}_by_{driving}.mp4")),
                b"video",
            )?;
        }
        Ok(result)
    }
}

impl ReenactorFactory for FakeReenactors {
    fn create(&self, model: &str) -> Result<Box<dyn Reenactor>, CollaboratorError> {
        if model != "tps" {
            return Err(CollaboratorError::UnknownModel(model.to_string()));
        }
        Ok(Box::new(FakeReenactor {
            calls: self.calls.clone(),
        }))
    }

    fn models(&self) -> Vec<String> {
        vec!["tps".to_string()]
    }
}

pub struct FakePipelines {
    verdict: Result<bool, String>,
    annotate: bool,
    frames: Arc<Mutex<Vec<Option<u32>>>>,
}

struct FakePipeline {
    verdict: Result<bool, String>,
    annotate: bool,
    frames: Arc<Mutex<Vec<Option<u32>>>>,
}

impl DeepfakePipeline for FakePipeline {
    fn detect(
        &self,
        media_path: &Path,
        output_folder: &Path,
        options: &PipelineOptions,
    ) -> Result<bool, CollaboratorError> {
        self.frames.lock().unwrap().push(options.num_frames);
        if options.save_csv {
            fs::write(
                output_folder.join(format!("{}_results.csv", file_stem(media_path))),
                b"model,prediction\n",
            )?;
        }
        if self.annotate {
            fs::write(
                output_folder.join(format!(
                    "{}_annotated{}",
                    file_stem(media_path),
                    dotted_extension(media_path)
                )),
                b"frames",
            )?;
        }
        self.verdict.clone().map_err(CollaboratorError::Failed)
    }
}

impl DeepfakePipelineFactory for FakePipelines {
    fn create(
        &self,
        _weights: &ModelWeightMap,
        _device: Option<&str>,
        _confidence_threshold: f64,
    ) -> Result<Box<dyn DeepfakePipeline>, CollaboratorError> {
        Ok(Box::new(FakePipeline {
            verdict: self.verdict.clone(),
            annotate: self.annotate,
            frames: self.frames.clone(),
        }))
    }
}

/// Temp output root, an input directory outside it, and call logs.
pub struct Fixture {
    dir: TempDir,
    detector_side_files: bool,
    verdict: Result<bool, String>,
    annotate_deepfakes: bool,
    reenact_calls: Arc<Mutex<Vec<(PathBuf, bool)>>>,
    pipeline_frames: Arc<Mutex<Vec<Option<u32>>>>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::build(true, Ok(true))
    }

    pub fn with_detector_side_files(side_files: bool) -> Self {
        Self::build(side_files, Ok(true))
    }

    pub fn with_verdict(verdict: Result<bool, String>) -> Self {
        Self::build(true, verdict)
    }

    /// The deepfake pipeline also writes `{stem}_annotated.{ext}`.
    pub fn with_annotated_deepfakes() -> Self {
        Self {
            annotate_deepfakes: true,
            ..Self::new()
        }
    }

    fn build(detector_side_files: bool, verdict: Result<bool, String>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("in")).unwrap();
        Self {
            dir,
            detector_side_files,
            verdict,
            annotate_deepfakes: false,
            reenact_calls: Arc::new(Mutex::new(Vec::new())),
            pipeline_frames: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    /// Writes a placeholder input file and returns its path.
    pub fn media(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join("in").join(name);
        fs::write(&path, b"media").unwrap();
        path
    }

    pub fn suite(&self) -> FaceSuite {
        let registry = ModelRegistry::new(vec![
            RegisteredModel::new("resnet_inception", 0.5),
            RegisteredModel::new("efficientnet", 0.5),
        ])
        .unwrap();
        FaceSuite::new(
            self.root(),
            Arc::new(FakeDetectors {
                side_files: self.detector_side_files,
            }),
            Arc::new(FakeReenactors {
                calls: self.reenact_calls.clone(),
            }),
            Arc::new(FakePipelines {
                verdict: self.verdict.clone(),
                annotate: self.annotate_deepfakes,
                frames: self.pipeline_frames.clone(),
            }),
            registry,
            ComputeDevice::Cpu,
        )
    }

    pub fn reenact_calls(&self) -> Vec<(PathBuf, bool)> {
        self.reenact_calls.lock().unwrap().clone()
    }

    pub fn pipeline_frames(&self) -> Vec<Option<u32>> {
        self.pipeline_frames.lock().unwrap().clone()
    }
}
