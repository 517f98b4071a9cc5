//! Lazily loads the artifact and serves predictions from it.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::OnceCell;
use tracing::{debug, error};

use crate::bundle::ArtifactBundle;
use crate::error::{InferenceError, LoadErrorKind};
use crate::features::vectorize;
use crate::loader::ArtifactLoader;
use crate::predictor::{PredictionResult, decode};

/// Whether the engine holds a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    NotLoaded,
    Loaded,
}

/// Owns the model for the life of the process.
///
/// The first `predict` loads the artifact. Concurrent callers wait for that
/// single load instead of starting their own. A failed load leaves the engine
/// `NotLoaded` and the next call tries again; a successful one is final.
#[derive(Debug)]
pub struct InferenceEngine {
    loader: ArtifactLoader,
    bundle: OnceCell<Arc<ArtifactBundle>>,
    load_attempts: AtomicUsize,
}

impl InferenceEngine {
    pub fn new(loader: ArtifactLoader) -> Self {
        Self {
            loader,
            bundle: OnceCell::new(),
            load_attempts: AtomicUsize::new(0),
        }
    }

    /// An engine that starts out `Loaded` with `bundle`.
    pub fn with_bundle(loader: ArtifactLoader, bundle: ArtifactBundle) -> Self {
        Self {
            loader,
            bundle: OnceCell::new_with(Some(Arc::new(bundle))),
            load_attempts: AtomicUsize::new(0),
        }
    }

    pub fn loader(&self) -> &ArtifactLoader {
        &self.loader
    }

    pub fn state(&self) -> EngineState {
        if self.bundle.initialized() {
            EngineState::Loaded
        } else {
            EngineState::NotLoaded
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state() == EngineState::Loaded
    }

    /// How many times the artifact has been read from storage.
    pub fn load_attempts(&self) -> usize {
        self.load_attempts.load(Ordering::SeqCst)
    }

    /// Return the loaded bundle, loading it first if needed.
    pub async fn ensure_loaded(&self) -> Result<Arc<ArtifactBundle>, InferenceError> {
        let bundle = self
            .bundle
            .get_or_try_init(|| async {
                let attempt = self.load_attempts.fetch_add(1, Ordering::SeqCst) + 1;
                debug!(attempt, "model not loaded, loading now");
                self.loader.load().await.map(Arc::new)
            })
            .await
            .map_err(|e| {
                if e.kind() != LoadErrorKind::NotFound {
                    error!(error = %e, path = %self.loader.path().display(), "error loading model");
                }
                InferenceError::ModelNotLoaded(e)
            })?;
        Ok(Arc::clone(bundle))
    }

    /// Predict labels for one issue.
    pub async fn predict(
        &self,
        title: Option<&str>,
        body: Option<&str>,
    ) -> Result<PredictionResult, InferenceError> {
        let bundle = self.ensure_loaded().await?;

        let result = vectorize(&bundle, title, body)
            .and_then(|features| decode(&bundle, &features))
            .inspect_err(|e| error!(error = %e, "prediction failed"))?;

        debug!(labels = ?result.labels, "prediction complete");
        Ok(result)
    }
}
