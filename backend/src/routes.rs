use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::{HttpResponse, error::InternalError, web};
use futures::{StreamExt, TryStreamExt};
use log::info;
use serde_json::json;
use shared::{
    DetectDeepfakesRequest, DetectFacesRequest, ErrorResponse, ReenactFaceRequest, UploadResponse,
};
use std::path::PathBuf;

use crate::dispatch::FaceSuite;
use crate::error::ServiceError;
use crate::storage::{UploadError, UploadService};

pub fn configure_routes(cfg: &mut web::ServiceConfig, output_root: PathBuf) {
    cfg.app_data(json_config())
        .service(web::resource("/api/health").route(web::get().to(health)))
        .service(web::resource("/api/models").route(web::get().to(list_models)))
        .service(web::resource("/api/uploads").route(web::post().to(upload_media)))
        .service(web::resource("/api/face-detection").route(web::post().to(detect_faces)))
        .service(web::resource("/api/face-reenactment").route(web::post().to(reenact_face)))
        .service(web::resource("/api/deepfake-detection").route(web::post().to(detect_deepfakes)))
        .service(Files::new("/outputs", output_root));
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let body = ErrorResponse {
            error: format!("Error: Invalid request body: {}", err),
        };
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

async fn list_models(suite: web::Data<FaceSuite>) -> HttpResponse {
    HttpResponse::Ok().json(suite.catalog())
}

async fn detect_faces(
    suite: web::Data<FaceSuite>,
    request: web::Json<DetectFacesRequest>,
) -> Result<HttpResponse, ServiceError> {
    let request = request.into_inner();
    let response = web::block(move || suite.detect_faces(&request)).await??;
    Ok(HttpResponse::Ok().json(response))
}

async fn reenact_face(
    suite: web::Data<FaceSuite>,
    request: web::Json<ReenactFaceRequest>,
) -> Result<HttpResponse, ServiceError> {
    let request = request.into_inner();
    let response = web::block(move || suite.reenact_face(&request)).await??;
    Ok(HttpResponse::Ok().json(response))
}

async fn detect_deepfakes(
    suite: web::Data<FaceSuite>,
    request: web::Json<DetectDeepfakesRequest>,
) -> Result<HttpResponse, ServiceError> {
    let request = request.into_inner();
    let response = web::block(move || suite.detect_deepfakes(&request)).await??;
    Ok(HttpResponse::Ok().json(response))
}

async fn upload_media(
    uploads: web::Data<UploadService>,
    mut payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    let mut files = Vec::new();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ServiceError::Validation(format!("Malformed upload: {}", e)))?
    {
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string)
            .ok_or(UploadError::InvalidFileName)?;

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| ServiceError::Validation(format!("Malformed upload: {}", e)))?;
            uploads.validate_size(data.len() + chunk.len())?;
            data.extend_from_slice(&chunk);
        }

        let uploads = uploads.clone();
        let stored = web::block(move || uploads.store(&file_name, &data)).await??;
        files.push(stored);
    }

    if files.is_empty() {
        return Err(UploadError::Empty.into());
    }
    info!("Accepted {} upload(s)", files.len());
    Ok(HttpResponse::Ok().json(UploadResponse { files }))
}
