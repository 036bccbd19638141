use actix_web::http::StatusCode;
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};
use shared::UploadedFile;
use std::fs;
use std::path::{Path, PathBuf};

pub const UPLOADS_DIR: &str = "uploads";

const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "bmp", "gif", "mp4", "avi", "mov", "mkv", "webm",
];

lazy_static! {
    static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._-]+").unwrap();
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Missing or invalid file name")]
    InvalidFileName,
    #[error("Unsupported file format: {0}")]
    InvalidFormat(String),
    #[error("File too large")]
    FileTooLarge,
    #[error("Empty upload")]
    Empty,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UploadError::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Stores uploaded media under `<root>/uploads/<sha256>/<name>` so the stem the
/// collaborators name their side files after is the one the user uploaded.
#[derive(Clone, Debug)]
pub struct UploadService {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadService {
    pub fn new(output_root: &Path, max_bytes: usize) -> Self {
        Self {
            dir: output_root.join(UPLOADS_DIR),
            max_bytes,
        }
    }

    pub fn calculate_hash(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Keeps only the final path component and replaces anything outside
    /// `[A-Za-z0-9._-]` with `_`.
    pub fn sanitize_file_name(raw: &str) -> Result<String, UploadError> {
        let base = raw
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .trim();
        let cleaned = UNSAFE_FILENAME_CHARS.replace_all(base, "_");
        let cleaned = cleaned.trim_start_matches('.');
        if cleaned.is_empty() || cleaned.chars().all(|c| c == '_' || c == '.') {
            return Err(UploadError::InvalidFileName);
        }
        Ok(cleaned.to_string())
    }

    pub fn extract_file_extension(file_name: &str) -> Result<String, UploadError> {
        let ext = Path::new(file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .ok_or_else(|| UploadError::InvalidFormat(file_name.to_string()))?;
        if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            Ok(ext)
        } else {
            Err(UploadError::InvalidFormat(ext))
        }
    }

    pub fn validate_size(&self, size: usize) -> Result<(), UploadError> {
        if size > self.max_bytes {
            return Err(UploadError::FileTooLarge);
        }
        Ok(())
    }

    pub fn store(&self, raw_file_name: &str, data: &[u8]) -> Result<UploadedFile, UploadError> {
        if data.is_empty() {
            return Err(UploadError::Empty);
        }
        self.validate_size(data.len())?;
        let file_name = Self::sanitize_file_name(raw_file_name)?;
        Self::extract_file_extension(&file_name)?;

        let sha256 = Self::calculate_hash(data);
        let target_dir = self.dir.join(&sha256);
        let target = target_dir.join(&file_name);

        if target.is_file() {
            log::info!("Upload {} already stored at {}", file_name, target.display());
        } else {
            fs::create_dir_all(&target_dir)?;
            fs::write(&target, data)?;
            log::info!("Stored upload {} ({} bytes) at {}", file_name, data.len(), target.display());
        }

        Ok(UploadedFile {
            file_name,
            stored_path: target.to_string_lossy().into_owned(),
            sha256,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_names() {
        assert_eq!(UploadService::sanitize_file_name("face.png").unwrap(), "face.png");
        assert_eq!(
            UploadService::sanitize_file_name("../../etc/passwd.png").unwrap(),
            "passwd.png"
        );
        assert_eq!(
            UploadService::sanitize_file_name("C:\\Users\\me\\my photo (1).jpg").unwrap(),
            "my_photo_1_.jpg"
        );
        assert_eq!(UploadService::sanitize_file_name(".hidden.png").unwrap(), "hidden.png");
        assert!(UploadService::sanitize_file_name("..").is_err());
        assert!(UploadService::sanitize_file_name("").is_err());
    }

    #[test]
    fn only_media_extensions_are_accepted() {
        assert_eq!(UploadService::extract_file_extension("a.JPG").unwrap(), "jpg");
        assert_eq!(UploadService::extract_file_extension("clip.mp4").unwrap(), "mp4");
        assert!(matches!(
            UploadService::extract_file_extension("run.sh"),
            Err(UploadError::InvalidFormat(_))
        ));
        assert!(UploadService::extract_file_extension("noext").is_err());
    }

    #[test]
    fn stores_by_content_hash_keeping_the_name() {
        let root = tempfile::tempdir().unwrap();
        let service = UploadService::new(root.path(), 1024);

        let stored = service.store("face.png", b"pixels").unwrap();
        let expected_hash = UploadService::calculate_hash(b"pixels");
        assert_eq!(stored.sha256, expected_hash);
        assert_eq!(stored.file_name, "face.png");
        let path = PathBuf::from(&stored.stored_path);
        assert_eq!(path, root.path().join("uploads").join(&expected_hash).join("face.png"));
        assert_eq!(fs::read(&path).unwrap(), b"pixels");

        let again = service.store("face.png", b"pixels").unwrap();
        assert_eq!(again, stored);
    }

    #[test]
    fn rejects_oversized_and_empty_uploads() {
        let root = tempfile::tempdir().unwrap();
        let service = UploadService::new(root.path(), 4);
        assert!(matches!(
            service.store("face.png", b"too large"),
            Err(UploadError::FileTooLarge)
        ));
        assert!(matches!(service.store("face.png", b""), Err(UploadError::Empty)));
        assert_eq!(UploadError::FileTooLarge.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
