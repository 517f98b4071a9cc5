use std::path::PathBuf;

use thiserror::Error;

/// Why an artifact could not become an [`ArtifactBundle`](crate::ArtifactBundle).
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model artifact not found at {0}")]
    NotFound(PathBuf),

    #[error("failed to read model artifact {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact is corrupt: {0}")]
    Corrupt(String),

    #[error("model artifact is missing required part '{0}'")]
    Incomplete(&'static str),

    #[error("model artifact schema mismatch: {what} expected {expected}, found {actual}")]
    SchemaMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Coarse category of a [`ModelLoadError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    NotFound,
    Corrupt,
    SchemaMismatch,
}

impl ModelLoadError {
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            Self::NotFound(_) => LoadErrorKind::NotFound,
            Self::Unreadable { .. } | Self::Corrupt(_) | Self::Incomplete(_) => {
                LoadErrorKind::Corrupt
            }
            Self::SchemaMismatch { .. } => LoadErrorKind::SchemaMismatch,
        }
    }
}

/// Failure while vectorizing or decoding a request against a loaded bundle.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("feature vector has width {actual}, classifier expects {expected}")]
    FeatureWidth { expected: usize, actual: usize },

    #[error("{what} has {actual} columns, label space has {expected}")]
    OutputWidth {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("probability for '{label}' is out of range: {value}")]
    InvalidProbability { label: String, value: f64 },

    #[error("sparse column {index} is outside dimension {dim}")]
    IndexOutOfRange { index: usize, dim: usize },
}

/// Error returned by [`InferenceEngine::predict`](crate::InferenceEngine::predict).
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Models are not loaded: {0}")]
    ModelNotLoaded(#[source] ModelLoadError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}
