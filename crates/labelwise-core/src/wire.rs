//! Request and response bodies exchanged with HTTP clients.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single issue to classify.
///
/// Both fields are required on the wire; an empty string is a valid value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionInput {
    /// The issue title.
    pub title: String,
    /// The issue body.
    pub body: String,
}

/// Predicted labels for one issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionOutput {
    /// Labels the classifier assigned, in label-space order. May be empty.
    pub labels: Vec<String>,
    /// Confidence for every label the model knows, predicted or not.
    #[serde(default)]
    pub confidence_scores: Option<BTreeMap<String, f64>>,
}

/// Liveness report for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub app_name: String,
    /// Whether the model artifact has been loaded yet.
    pub model_loaded: bool,
}

impl HealthStatus {
    pub fn healthy(app_name: impl Into<String>, model_loaded: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            app_name: app_name.into(),
            model_loaded,
        }
    }
}

/// Error payload returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
