//! Multi-label issue classification.
//!
//! An [`InferenceEngine`] lazily loads an [`ArtifactBundle`] (two TF-IDF
//! vectorizers, a label space and a classifier chain) and predicts labels
//! with a confidence score for every label the model knows.

pub mod bundle;
pub mod classifier;
pub mod engine;
pub mod error;
pub mod features;
pub mod loader;
pub mod migrate;
pub mod normalize;
pub mod predictor;
pub mod sparse;
pub mod vectorizer;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use bundle::{ArtifactBundle, LabelSpace};
pub use classifier::{MultiLabelClassifier, ProbabilityRow};
pub use engine::{EngineState, InferenceEngine};
pub use error::{InferenceError, LoadErrorKind, ModelLoadError, PredictionError};
pub use loader::ArtifactLoader;
pub use predictor::PredictionResult;
