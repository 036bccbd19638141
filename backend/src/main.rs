mod artifacts;
mod collaborators;
mod config;
mod dispatch;
mod ensemble;
mod error;
mod report;
mod routes;
mod storage;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use collaborators::bridge::{
    BridgeDetectorFactory, BridgePipelineFactory, BridgeReenactorFactory, ProcessBridge,
};
use config::AppConfig;
use dispatch::FaceSuite;
use routes::configure_routes;
use std::env;
use std::sync::Arc;
use storage::UploadService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let config = AppConfig::load().map_err(|e| {
        log::error!("Failed to load configuration: {}", e);
        std::io::Error::other(e.to_string())
    })?;
    let registry = config.deepfake_registry().map_err(|e| {
        log::error!("Invalid deepfake model registry: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    std::fs::create_dir_all(&config.output_root)?;
    log::info!("Writing outputs under {}", config.output_root.display());

    let bridge = Arc::new(ProcessBridge::new(
        config.bridge.program.clone(),
        config.bridge.args.clone(),
    ));
    log::info!(
        "Inference bridge: {} {}",
        config.bridge.program,
        config.bridge.args.join(" ")
    );

    let suite = web::Data::new(FaceSuite::new(
        config.output_root.clone(),
        Arc::new(BridgeDetectorFactory::new(
            bridge.clone(),
            config.models.face_detectors.clone(),
        )),
        Arc::new(BridgeReenactorFactory::new(
            bridge.clone(),
            config.models.reenactors.clone(),
        )),
        Arc::new(BridgePipelineFactory::new(bridge)),
        registry,
        config.device,
    ));
    let uploads = web::Data::new(UploadService::new(
        &config.output_root,
        config.max_upload_bytes,
    ));

    let output_root = config.output_root.clone();
    let bind_address = format!("0.0.0.0:{}", config.port);
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(suite.clone())
            .app_data(uploads.clone())
            .configure(|cfg| configure_routes(cfg, output_root.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}
