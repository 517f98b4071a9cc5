//! The loaded model: two vectorizers, the label space and a classifier.
//!
//! An [`ArtifactBundle`] only exists when all four parts are present and
//! mutually consistent. It is never mutated after construction.

use std::collections::HashSet;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::classifier::{ChainClassifier, MultiLabelClassifier, StoredClassifier};
use crate::error::ModelLoadError;
use crate::migrate::{AppliedMigration, run_migrations};
use crate::vectorizer::TfidfVectorizer;

/// Artifact key of the title vectorizer.
pub const TITLE_VECTORIZER_KEY: &str = "tfidf_title";
/// Artifact key of the body vectorizer.
pub const BODY_VECTORIZER_KEY: &str = "tfidf_body";
/// Artifact key of the label binarizer.
pub const LABEL_SPACE_KEY: &str = "mlb";
/// Artifact key of the classifier.
pub const CLASSIFIER_KEY: &str = "model";

/// Ordered, duplicate-free labels; position `i` is classifier output column `i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSpace {
    classes: Vec<String>,
}

impl LabelSpace {
    pub fn new(classes: Vec<String>) -> Result<Self, ModelLoadError> {
        let space = Self { classes };
        space.validate()?;
        Ok(space)
    }

    fn validate(&self) -> Result<(), ModelLoadError> {
        if self.classes.is_empty() {
            return Err(ModelLoadError::Corrupt("label space is empty".into()));
        }
        let mut seen = HashSet::with_capacity(self.classes.len());
        for label in &self.classes {
            if !seen.insert(label.as_str()) {
                return Err(ModelLoadError::Corrupt(format!(
                    "label '{label}' appears more than once"
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn get(&self, column: usize) -> Option<&str> {
        self.classes.get(column).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }
}

pub struct ArtifactBundle {
    title_vectorizer: TfidfVectorizer,
    body_vectorizer: TfidfVectorizer,
    labels: LabelSpace,
    classifier: Box<dyn MultiLabelClassifier>,
    migrations: Vec<AppliedMigration>,
}

impl ArtifactBundle {
    /// Assemble a bundle, checking that the parts fit together:
    /// the classifier has one output per label and takes the title columns
    /// followed by the body columns as input.
    pub fn new(
        title_vectorizer: TfidfVectorizer,
        body_vectorizer: TfidfVectorizer,
        labels: LabelSpace,
        classifier: Box<dyn MultiLabelClassifier>,
    ) -> Result<Self, ModelLoadError> {
        if classifier.n_outputs() != labels.len() {
            return Err(ModelLoadError::SchemaMismatch {
                what: "classifier outputs",
                expected: labels.len(),
                actual: classifier.n_outputs(),
            });
        }

        let width = title_vectorizer.dim() + body_vectorizer.dim();
        if classifier.n_features_in() != width {
            return Err(ModelLoadError::SchemaMismatch {
                what: "classifier input width",
                expected: width,
                actual: classifier.n_features_in(),
            });
        }

        Ok(Self {
            title_vectorizer,
            body_vectorizer,
            labels,
            classifier,
            migrations: Vec::new(),
        })
    }

    /// Parse a serialized artifact, run migrations on its classifier and validate it.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelLoadError> {
        let root: Value = serde_json::from_slice(bytes)
            .map_err(|e| ModelLoadError::Corrupt(format!("invalid artifact document: {e}")))?;
        let Value::Object(mut parts) = root else {
            return Err(ModelLoadError::Corrupt(
                "artifact document is not an object".into(),
            ));
        };

        let title: TfidfVectorizer = take_part(&mut parts, TITLE_VECTORIZER_KEY)?;
        let body: TfidfVectorizer = take_part(&mut parts, BODY_VECTORIZER_KEY)?;
        let labels: LabelSpace = take_part(&mut parts, LABEL_SPACE_KEY)?;
        let mut stored: StoredClassifier = take_part(&mut parts, CLASSIFIER_KEY)?;

        title.validate(TITLE_VECTORIZER_KEY)?;
        body.validate(BODY_VECTORIZER_KEY)?;
        labels.validate()?;

        let migrations = run_migrations(&mut stored);
        let classifier = ChainClassifier::from_stored(stored)?;

        let mut bundle = Self::new(title, body, labels, Box::new(classifier))?;
        bundle.migrations = migrations;
        Ok(bundle)
    }

    pub fn title_vectorizer(&self) -> &TfidfVectorizer {
        &self.title_vectorizer
    }

    pub fn body_vectorizer(&self) -> &TfidfVectorizer {
        &self.body_vectorizer
    }

    pub fn labels(&self) -> &LabelSpace {
        &self.labels
    }

    pub fn classifier(&self) -> &dyn MultiLabelClassifier {
        self.classifier.as_ref()
    }

    /// Migrations that rewrote the stored classifier during load.
    pub fn migrations(&self) -> &[AppliedMigration] {
        &self.migrations
    }

    /// Total feature width: title columns then body columns.
    pub fn feature_width(&self) -> usize {
        self.title_vectorizer.dim() + self.body_vectorizer.dim()
    }
}

impl fmt::Debug for ArtifactBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactBundle")
            .field("labels", &self.labels)
            .field("title_dim", &self.title_vectorizer.dim())
            .field("body_dim", &self.body_vectorizer.dim())
            .field("migrations", &self.migrations)
            .finish()
    }
}

fn take_part<T: DeserializeOwned>(
    parts: &mut Map<String, Value>,
    key: &'static str,
) -> Result<T, ModelLoadError> {
    let value = parts.remove(key).ok_or(ModelLoadError::Incomplete(key))?;
    if value.is_null() {
        return Err(ModelLoadError::Incomplete(key));
    }
    serde_json::from_value(value).map_err(|e| ModelLoadError::Corrupt(format!("{key}: {e}")))
}
