use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::ErrorResponse;
use std::path::PathBuf;

use crate::collaborators::CollaboratorError;
use crate::ensemble::EnsembleError;
use crate::storage::upload_service::UploadError;

/// Failures surfaced to API callers. Rendered as `{"error": "Error: ..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("Unknown model '{0}'")]
    UnknownModel(String),
    #[error("File not found: {}", .0.display())]
    MediaNotFound(PathBuf),
    #[error("{0}")]
    PipelineFailure(String),
    #[error("Upload failed: {0}")]
    Upload(#[from] UploadError),
    #[error("Output directory error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Worker pool unavailable")]
    Blocking(#[from] actix_web::error::BlockingError),
}

impl ServiceError {
    pub fn user_message(&self) -> String {
        format!("Error: {}", self)
    }
}

impl From<EnsembleError> for ServiceError {
    fn from(err: EnsembleError) -> Self {
        match err {
            EnsembleError::MediaNotFound(path) => ServiceError::MediaNotFound(path),
            EnsembleError::PipelineFailure(message) => ServiceError::PipelineFailure(message),
            EnsembleError::InvalidRegistry(message) => ServiceError::PipelineFailure(message),
            other => ServiceError::Validation(other.to_string()),
        }
    }
}

impl From<CollaboratorError> for ServiceError {
    fn from(err: CollaboratorError) -> Self {
        match err {
            CollaboratorError::UnknownModel(model) => ServiceError::UnknownModel(model),
            other => ServiceError::PipelineFailure(other.to_string()),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) | ServiceError::UnknownModel(_) => StatusCode::BAD_REQUEST,
            ServiceError::MediaNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Upload(e) => e.status_code(),
            ServiceError::PipelineFailure(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Io(_) | ServiceError::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.user_message(),
        })
    }
}
