use log::{info, warn};
use shared::{
    DetectDeepfakesRequest, DetectDeepfakesResponse, DetectFacesRequest, DetectFacesResponse,
    ModelCatalog, ReenactFaceRequest, ReenactFaceResponse, Task,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::artifacts::conventions;
use crate::collaborators::{
    ComputeDevice, DeepfakePipelineFactory, DetectOptions, DetectorFactory, ReenactOptions,
    ReenactorFactory,
};
use crate::ensemble::media::MediaReference;
use crate::ensemble::orchestrator::EnsembleDetectionOrchestrator;
use crate::ensemble::weights::{ModelRegistry, normalize_weights};
use crate::error::ServiceError;
use crate::report::{DeepfakeReport, ResultPresenter};

/// Entry point for the three request kinds. Holds the model registries and
/// collaborator factories for the lifetime of the server.
pub struct FaceSuite {
    output_root: PathBuf,
    detectors: Arc<dyn DetectorFactory>,
    reenactors: Arc<dyn ReenactorFactory>,
    registry: ModelRegistry,
    orchestrator: EnsembleDetectionOrchestrator,
    presenter: ResultPresenter,
}

impl FaceSuite {
    pub fn new(
        output_root: PathBuf,
        detectors: Arc<dyn DetectorFactory>,
        reenactors: Arc<dyn ReenactorFactory>,
        pipelines: Arc<dyn DeepfakePipelineFactory>,
        registry: ModelRegistry,
        device: ComputeDevice,
    ) -> Self {
        Self {
            output_root,
            detectors,
            reenactors,
            registry,
            orchestrator: EnsembleDetectionOrchestrator::new(pipelines, device),
            presenter: ResultPresenter::default(),
        }
    }

    /// `<root>/<task>` or `<root>/<task>/<model>`.
    pub fn output_dir(&self, task: Task, model: Option<&str>) -> PathBuf {
        let dir = self.output_root.join(task.as_ref());
        match model {
            Some(model) => dir.join(model),
            None => dir,
        }
    }

    pub fn catalog(&self) -> ModelCatalog {
        ModelCatalog {
            face_detectors: self.detectors.models(),
            reenactors: self.reenactors.models(),
            deepfake_models: self
                .registry
                .models()
                .iter()
                .map(|m| shared::ModelWeight {
                    model: m.name.clone(),
                    weight: m.base_weight,
                })
                .collect(),
        }
    }

    pub fn detect_faces(
        &self,
        request: &DetectFacesRequest,
    ) -> Result<DetectFacesResponse, ServiceError> {
        let job_id = Uuid::new_v4();
        info!(
            "[{}] Face detection with '{}' on {}",
            job_id, request.model_name, request.image_path
        );

        let image_path = existing_media(&request.image_path, "No image provided")?;
        let detector = self.detectors.create(&request.model_name)?;

        let output_folder = self.output_dir(Task::FaceDetection, Some(&request.model_name));
        fs::create_dir_all(&output_folder)?;
        let options = DetectOptions {
            save_json: true,
            json_path: output_folder.join(conventions::DETECTIONS_JSON),
            save_annotated: true,
            output_folder: output_folder.clone(),
        };

        let detections = detector.detect(&image_path, &options)?;
        info!("[{}] Found {} face(s)", job_id, detections.len());

        let annotated = conventions::annotated_image(&image_path).locate(&output_folder);
        if annotated.is_none() {
            warn!("[{}] No annotated image found in {}", job_id, output_folder.display());
        }
        let json = conventions::detections_json().locate(&output_folder);

        Ok(DetectFacesResponse {
            job_id: job_id.to_string(),
            annotated_image_path: annotated.map(|a| a.path_string()),
            json_path: json.map(|a| a.path_string()),
            report_text: self.presenter.render_faces(&detections),
        })
    }

    pub fn reenact_face(
        &self,
        request: &ReenactFaceRequest,
    ) -> Result<ReenactFaceResponse, ServiceError> {
        let job_id = Uuid::new_v4();
        info!(
            "[{}] Reenactment with '{}': {} driven by {}",
            job_id, request.model_name, request.source_image_path, request.driving_video_path
        );

        let source = existing_media(&request.source_image_path, "No source image provided")?;
        let driving = existing_media(&request.driving_video_path, "No driving video provided")?;
        let reenactor = self.reenactors.create(&request.model_name)?;

        let output_folder = self.output_dir(Task::FaceReenactment, Some(&request.model_name));
        fs::create_dir_all(&output_folder)?;
        let output_path = output_folder.join(conventions::reenactment_output_name(&source));
        let options = ReenactOptions {
            save_comparison: true,
            resize_to_image_resolution: request.resize_to_image_resolution,
        };

        let result_path = reenactor.reenact_from_video(&source, &driving, &output_path, &options)?;

        // the comparison lands next to whatever directory the reenactor actually used
        let mut search_dirs = vec![output_path.clone()];
        if let Some(result_dir) = result_path.parent() {
            if result_dir != output_path.as_path() {
                search_dirs.push(result_dir.to_path_buf());
            }
        }
        let comparison = conventions::comparison_video(&source, &driving).locate_any(&search_dirs);
        if comparison.is_none() {
            warn!("[{}] No comparison video found for {}", job_id, result_path.display());
        }

        let reenacted = if result_path.exists() {
            Some(result_path.to_string_lossy().into_owned())
        } else {
            warn!(
                "[{}] Reenactor reported {} but nothing is there",
                job_id,
                result_path.display()
            );
            None
        };

        Ok(ReenactFaceResponse {
            job_id: job_id.to_string(),
            reenacted_video_path: reenacted,
            comparison_video_path: comparison.map(|a| a.path_string()),
        })
    }

    pub fn detect_deepfakes(
        &self,
        request: &DetectDeepfakesRequest,
    ) -> Result<DetectDeepfakesResponse, ServiceError> {
        let job_id = Uuid::new_v4();
        info!(
            "[{}] Deepfake detection with {:?} (threshold {})",
            job_id, request.selected_models, request.confidence_threshold
        );

        let media = MediaReference::from_inputs(
            request.image_path.as_deref(),
            request.video_path.as_deref(),
            request.num_frames,
        )?;
        if let Some(unknown) = request
            .selected_models
            .iter()
            .find(|m| !self.registry.contains(m))
        {
            return Err(ServiceError::UnknownModel(unknown.clone()));
        }
        let weights = normalize_weights(&request.selected_models, &self.registry)?;

        let output_folder = self.output_dir(Task::DeepfakeDetection, None);
        fs::create_dir_all(&output_folder)?;

        let verdict = self.orchestrator.detect(
            &media,
            &weights,
            request.confidence_threshold,
            &output_folder,
        )?;

        let annotated = conventions::deepfake_annotated_media(media.path()).locate(&output_folder);
        if annotated.is_none() {
            warn!("[{}] No annotated media for {}", job_id, media.path().display());
        }
        let csv = conventions::deepfake_results_csv(media.path()).locate(&output_folder);

        let file_name = media.file_name();
        let report_text = self.presenter.render_deepfake(&DeepfakeReport {
            file_name: &file_name,
            media_kind: media.kind(),
            requested_models: &request.selected_models,
            weights: &weights,
            verdict,
            confidence_threshold: request.confidence_threshold,
            frames_analyzed: media.frame_samples(),
        });

        Ok(DetectDeepfakesResponse {
            job_id: job_id.to_string(),
            media_kind: media.kind(),
            is_deepfake: verdict.is_deepfake,
            effective_confidence: verdict.effective_confidence,
            model_weights: weights.to_model_weights(),
            annotated_media_path: annotated.map(|a| a.path_string()),
            csv_path: csv.map(|a| a.path_string()),
            report_text,
        })
    }
}

fn existing_media(path: &str, missing: &str) -> Result<PathBuf, ServiceError> {
    let path = path.trim();
    if path.is_empty() {
        return Err(ServiceError::Validation(missing.to_string()));
    }
    let path = PathBuf::from(path);
    if !path.is_file() {
        return Err(ServiceError::MediaNotFound(path));
    }
    Ok(path)
}
