//! Reads a serialized bundle from disk and turns it into an [`ArtifactBundle`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::bundle::ArtifactBundle;
use crate::error::ModelLoadError;

/// Loads the artifact at a fixed path.
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    path: PathBuf,
}

impl ArtifactLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loader for `<model_dir>/<filename>`.
    pub fn from_dir(model_dir: &Path, filename: &str) -> Self {
        Self::new(model_dir.join(filename))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read, migrate and validate the artifact.
    ///
    /// A missing file is reported as [`ModelLoadError::NotFound`]; callers may
    /// retry once the artifact is in place.
    pub async fn load(&self) -> Result<ArtifactBundle, ModelLoadError> {
        info!(path = %self.path.display(), "loading model artifact");

        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "model artifact not found, inference will fail");
                return Err(ModelLoadError::NotFound(self.path.clone()));
            }
            Err(source) => {
                return Err(ModelLoadError::Unreadable {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let bundle = ArtifactBundle::from_slice(&bytes)?;
        for m in bundle.migrations() {
            info!(migration = m.name, version = m.version, "migrated legacy model attributes");
        }
        info!(
            labels = bundle.labels().len(),
            features = bundle.feature_width(),
            bytes = bytes.len(),
            "model loaded"
        );
        Ok(bundle)
    }
}
