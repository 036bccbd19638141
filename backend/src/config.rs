use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::collaborators::ComputeDevice;
use crate::ensemble::EnsembleError;
use crate::ensemble::weights::{ModelRegistry, RegisteredModel};

pub const CONFIG_ENV: &str = "MUKH_CONFIG";
pub const OUTPUT_DIR_ENV: &str = "MUKH_OUTPUT_DIR";
pub const PORT_ENV: &str = "PORT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub port: u16,
    pub output_root: PathBuf,
    pub max_upload_bytes: usize,
    pub device: ComputeDevice,
    pub bridge: BridgeConfig,
    pub models: ModelsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub face_detectors: Vec<String>,
    pub reenactors: Vec<String>,
    pub deepfake: Vec<RegisteredModel>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8081,
            output_root: PathBuf::from("gradio_output"),
            max_upload_bytes: 200 * 1024 * 1024,
            device: ComputeDevice::Auto,
            bridge: BridgeConfig::default(),
            models: ModelsConfig::default(),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec!["scripts/mukh_bridge.py".to_string()],
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            face_detectors: vec![
                "blazeface".to_string(),
                "mediapipe".to_string(),
                "ultralight".to_string(),
            ],
            reenactors: vec!["tps".to_string()],
            deepfake: vec![
                RegisteredModel::new("resnet_inception", 0.5),
                RegisteredModel::new("efficientnet", 0.5),
            ],
        }
    }
}

impl AppConfig {
    /// Reads `$MUKH_CONFIG`, else `config/mukh.yaml`, else falls back to the
    /// built-in defaults. `PORT` and `MUKH_OUTPUT_DIR` override the file.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => {
                let path = default_config_path();
                if path.is_file() {
                    Self::from_file(&path)?
                } else {
                    log::info!(
                        "No config file at {}, using built-in defaults",
                        path.display()
                    );
                    Self::default()
                }
            }
        };

        if let Ok(port) = std::env::var(PORT_ENV) {
            config.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{} is not a valid port: {}", PORT_ENV, port)))?;
        }
        if let Ok(dir) = std::env::var(OUTPUT_DIR_ENV) {
            config.output_root = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loading config from {}", path.display());
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bridge.program.trim().is_empty() {
            return Err(ConfigError::Invalid("bridge.program must be set".to_string()));
        }
        if self.models.face_detectors.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one face detector must be registered".to_string(),
            ));
        }
        if self.models.reenactors.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one reenactor must be registered".to_string(),
            ));
        }
        if self.models.deepfake.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one deepfake model must be registered".to_string(),
            ));
        }
        self.deepfake_registry()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }

    pub fn deepfake_registry(&self) -> Result<ModelRegistry, EnsembleError> {
        ModelRegistry::new(self.models.deepfake.clone())
    }
}

fn default_config_path() -> PathBuf {
    match std::env::var("CARGO_MANIFEST_DIR") {
        Ok(manifest_dir) => PathBuf::from(manifest_dir).join("../config/mukh.yaml"),
        Err(_) => PathBuf::from("config/mukh.yaml"),
    }
}
