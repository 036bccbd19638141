pub mod conventions;
pub mod locator;

use serde::Serialize;
use shared::ArtifactKind;
use std::path::PathBuf;

/// A side file some collaborator wrote. Discovered, never owned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputArtifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

impl OutputArtifact {
    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}
