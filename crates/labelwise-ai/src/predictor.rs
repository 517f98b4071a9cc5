//! Decodes classifier output into labels and per-label confidence.

use std::collections::BTreeMap;

use labelwise_core::PredictionOutput;

use crate::bundle::ArtifactBundle;
use crate::error::PredictionError;
use crate::sparse::SparseVector;

/// Labels and scores for one issue.
///
/// `confidence_scores` always has one entry per label in the label space,
/// whether or not that label was predicted.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    /// Predicted labels in label-space order.
    pub labels: Vec<String>,
    pub confidence_scores: BTreeMap<String, f64>,
}

impl From<PredictionResult> for PredictionOutput {
    fn from(result: PredictionResult) -> Self {
        PredictionOutput {
            labels: result.labels,
            confidence_scores: Some(result.confidence_scores),
        }
    }
}

/// Run the bundle's classifier on `features` and map columns to labels.
pub fn decode(
    bundle: &ArtifactBundle,
    features: &SparseVector,
) -> Result<PredictionResult, PredictionError> {
    let space = bundle.labels();
    let classifier = bundle.classifier();

    let indicator = classifier.predict_indicator(features)?;
    check_width("indicator", space.len(), indicator.len())?;

    let proba = classifier.predict_proba(features)?.into_dense();
    check_width("probabilities", space.len(), proba.len())?;

    let labels = space
        .iter()
        .zip(&indicator)
        .filter(|(_, hit)| **hit)
        .map(|(label, _)| label.to_string())
        .collect();

    let mut confidence_scores = BTreeMap::new();
    for (label, p) in space.iter().zip(proba) {
        if !(0.0..=1.0).contains(&p) {
            return Err(PredictionError::InvalidProbability {
                label: label.to_string(),
                value: p,
            });
        }
        confidence_scores.insert(label.to_string(), p);
    }

    Ok(PredictionResult {
        labels,
        confidence_scores,
    })
}

fn check_width(what: &'static str, expected: usize, actual: usize) -> Result<(), PredictionError> {
    if expected == actual {
        Ok(())
    } else {
        Err(PredictionError::OutputWidth {
            what,
            expected,
            actual,
        })
    }
}
