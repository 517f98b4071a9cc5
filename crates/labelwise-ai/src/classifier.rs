//! Multi-output classifiers: the capability interface the predictor decodes
//! through, and the logistic chain model stored in artifacts.
//!
//! A chain runs one binary estimator per label in `order`. Link `k` sees the
//! feature vector followed by the binary predictions of links `0..k`, so its
//! coefficient vector has `n_features_in + k` entries. One-vs-rest models are
//! the same without the feedback columns.

use serde::{Deserialize, Serialize};

use crate::error::{ModelLoadError, PredictionError};
use crate::sparse::SparseVector;

/// A probabilistic multi-label model over a fixed-width feature vector.
pub trait MultiLabelClassifier: Send + Sync {
    /// Number of output columns (one per label).
    fn n_outputs(&self) -> usize;

    /// Width of the feature vector the model was trained on.
    fn n_features_in(&self) -> usize;

    /// One indicator per output column.
    fn predict_indicator(&self, features: &SparseVector) -> Result<Vec<bool>, PredictionError>;

    /// One probability per output column.
    fn predict_proba(&self, features: &SparseVector) -> Result<ProbabilityRow, PredictionError>;
}

/// Probabilities for one input row, in whichever layout the model produces.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbabilityRow {
    Dense(Vec<f64>),
    Sparse(SparseVector),
}

impl ProbabilityRow {
    pub fn len(&self) -> usize {
        match self {
            Self::Dense(v) => v.len(),
            Self::Sparse(v) => v.dim(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_dense(self) -> Vec<f64> {
        match self {
            Self::Dense(v) => v,
            Self::Sparse(v) => v.to_dense(),
        }
    }
}

/// Estimator family shared by every link of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    Logistic,
}

/// Hyperparameters of the per-label estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorTemplate {
    pub kind: EstimatorKind,
    /// A link predicts 1 when its probability is strictly above this value.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    0.5
}

/// Marker value left in a retired attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Retired {
    Deprecated,
}

/// Contents of the legacy `base_estimator` attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegacySlot {
    Retired(Retired),
    Template(EstimatorTemplate),
}

impl LegacySlot {
    pub const DEPRECATED: LegacySlot = LegacySlot::Retired(Retired::Deprecated);
}

/// Access to the current and legacy estimator attributes of a stored model.
///
/// Migrations touch stored classifiers only through this trait.
pub trait EstimatorSlots {
    fn estimator(&self) -> Option<&EstimatorTemplate>;
    fn legacy_estimator(&self) -> Option<&LegacySlot>;
    fn set_estimator(&mut self, template: EstimatorTemplate);
    fn set_legacy_estimator(&mut self, slot: LegacySlot);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainKind {
    ClassifierChain,
    OneVsRest,
}

/// A fitted binary logistic estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearEstimator {
    pub coef: Vec<f64>,
    pub intercept: f64,
}

/// The `model` part of an artifact, as deserialized and before migrations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredClassifier {
    pub kind: ChainKind,
    pub n_features_in: usize,
    pub estimators: Vec<LinearEstimator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimator: Option<EstimatorTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_estimator: Option<LegacySlot>,
}

impl EstimatorSlots for StoredClassifier {
    fn estimator(&self) -> Option<&EstimatorTemplate> {
        self.estimator.as_ref()
    }

    fn legacy_estimator(&self) -> Option<&LegacySlot> {
        self.base_estimator.as_ref()
    }

    fn set_estimator(&mut self, template: EstimatorTemplate) {
        self.estimator = Some(template);
    }

    fn set_legacy_estimator(&mut self, slot: LegacySlot) {
        self.base_estimator = Some(slot);
    }
}

/// A chain (or one-vs-rest set) of logistic estimators.
#[derive(Debug, Clone)]
pub struct ChainClassifier {
    kind: ChainKind,
    n_features_in: usize,
    order: Vec<usize>,
    estimators: Vec<LinearEstimator>,
    template: EstimatorTemplate,
}

/// Per-row output of a chain, in label column order.
struct ChainOutput {
    indicator: Vec<bool>,
    proba: Vec<f64>,
}

impl ChainClassifier {
    /// Build from a migrated stored classifier, checking its internal shape.
    pub fn from_stored(stored: StoredClassifier) -> Result<Self, ModelLoadError> {
        let template = stored.estimator.ok_or_else(|| {
            ModelLoadError::Corrupt("classifier has no estimator template".into())
        })?;
        if !(0.0..=1.0).contains(&template.threshold) {
            return Err(ModelLoadError::Corrupt(format!(
                "estimator threshold {} is outside [0, 1]",
                template.threshold
            )));
        }

        let n_outputs = stored.estimators.len();
        let order = match (stored.kind, stored.order) {
            (ChainKind::ClassifierChain, Some(order)) => order,
            _ => (0..n_outputs).collect(),
        };
        if !is_permutation(&order, n_outputs) {
            return Err(ModelLoadError::Corrupt(format!(
                "chain order {order:?} is not a permutation of 0..{n_outputs}"
            )));
        }

        for (link, est) in stored.estimators.iter().enumerate() {
            let expected = match stored.kind {
                ChainKind::ClassifierChain => stored.n_features_in + link,
                ChainKind::OneVsRest => stored.n_features_in,
            };
            if est.coef.len() != expected {
                return Err(ModelLoadError::SchemaMismatch {
                    what: "estimator coefficients",
                    expected,
                    actual: est.coef.len(),
                });
            }
            if !est.intercept.is_finite() || est.coef.iter().any(|c| !c.is_finite()) {
                return Err(ModelLoadError::Corrupt(format!(
                    "estimator {link} has non-finite weights"
                )));
            }
        }

        Ok(Self {
            kind: stored.kind,
            n_features_in: stored.n_features_in,
            order,
            estimators: stored.estimators,
            template,
        })
    }

    pub fn kind(&self) -> ChainKind {
        self.kind
    }

    pub fn template(&self) -> &EstimatorTemplate {
        &self.template
    }

    fn run(&self, features: &SparseVector) -> Result<ChainOutput, PredictionError> {
        if features.dim() != self.n_features_in {
            return Err(PredictionError::FeatureWidth {
                expected: self.n_features_in,
                actual: features.dim(),
            });
        }

        let n = self.estimators.len();
        let mut indicator = vec![false; n];
        let mut proba = vec![0.0; n];
        let mut previous: Vec<f64> = Vec::with_capacity(n);

        for (link, (est, &col)) in self.estimators.iter().zip(&self.order).enumerate() {
            let mut z = est.intercept + features.dot(&est.coef);
            if self.kind == ChainKind::ClassifierChain {
                let feedback = &est.coef[self.n_features_in..self.n_features_in + link];
                z += feedback
                    .iter()
                    .zip(&previous)
                    .map(|(w, y)| w * y)
                    .sum::<f64>();
            }
            let p = sigmoid(z);
            let hit = p > self.template.threshold;
            previous.push(if hit { 1.0 } else { 0.0 });
            indicator[col] = hit;
            proba[col] = p;
        }

        Ok(ChainOutput { indicator, proba })
    }
}

impl MultiLabelClassifier for ChainClassifier {
    fn n_outputs(&self) -> usize {
        self.estimators.len()
    }

    fn n_features_in(&self) -> usize {
        self.n_features_in
    }

    fn predict_indicator(&self, features: &SparseVector) -> Result<Vec<bool>, PredictionError> {
        Ok(self.run(features)?.indicator)
    }

    fn predict_proba(&self, features: &SparseVector) -> Result<ProbabilityRow, PredictionError> {
        Ok(ProbabilityRow::Dense(self.run(features)?.proba))
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn is_permutation(order: &[usize], n: usize) -> bool {
    if order.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    order
        .iter()
        .all(|&i| i < n && !std::mem::replace(&mut seen[i], true))
}
