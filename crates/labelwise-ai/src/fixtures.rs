//! A small, hand-weighted chain model for tests.
//!
//! Title vocabulary: `crash error docs feature`. Body vocabulary:
//! `crash stack trace typo readme please`. Labels, in chain order:
//!
//! - `bug`: crash/error in the title, crash or a stack trace in the body.
//! - `documentation`: docs in the title, typo/readme in the body; less likely after `bug`.
//! - `enhancement`: intercept low enough that it never fires.
//!
//! Empty text predicts no labels.

use std::path::{Path, PathBuf};

use serde_json::{Value, json};

use crate::bundle::ArtifactBundle;

pub const LABELS: [&str; 3] = ["bug", "documentation", "enhancement"];

pub const MODEL_FILENAME: &str = "classifier.json";

const TITLE_TERMS: [&str; 4] = ["crash", "error", "docs", "feature"];
const BODY_TERMS: [&str; 6] = ["crash", "stack", "trace", "typo", "readme", "please"];

fn vectorizer(terms: &[&str]) -> Value {
    let vocabulary: serde_json::Map<String, Value> = terms
        .iter()
        .enumerate()
        .map(|(i, t)| (t.to_string(), Value::from(i)))
        .collect();
    let idf = vec![1.0; terms.len()];
    json!({
        "vocabulary": vocabulary,
        "idf": idf,
        "ngram_range": [1, 1],
        "sublinear_tf": false,
        "norm": "l2",
    })
}

/// Coefficients of one chain link: `weights` are `(column, value)` pairs over
/// the `10 + link` inputs.
fn link(link: usize, weights: &[(usize, f64)], intercept: f64) -> Value {
    let mut coef = vec![0.0; TITLE_TERMS.len() + BODY_TERMS.len() + link];
    for &(col, w) in weights {
        coef[col] = w;
    }
    json!({ "coef": coef, "intercept": intercept })
}

/// The artifact document.
pub fn bundle_json() -> Value {
    let body = TITLE_TERMS.len();
    json!({
        "tfidf_title": vectorizer(&TITLE_TERMS),
        "tfidf_body": vectorizer(&BODY_TERMS),
        "mlb": { "classes": LABELS },
        "model": {
            "kind": "classifier_chain",
            "n_features_in": TITLE_TERMS.len() + BODY_TERMS.len(),
            "order": [0, 1, 2],
            "estimator": { "kind": "logistic", "threshold": 0.5 },
            "estimators": [
                link(0, &[(0, 3.0), (1, 2.0), (body, 2.0), (body + 1, 1.5), (body + 2, 1.5)], -1.5),
                link(1, &[(2, 4.0), (body + 3, 3.0), (body + 4, 3.0), (10, -1.0)], -1.5),
                link(2, &[(3, 2.0), (body + 5, 1.0), (10, -0.5), (11, -0.5)], -6.0),
            ],
        },
    })
}

/// The artifact stored under its legacy attribute layout.
pub fn legacy_bundle_json() -> Value {
    let mut doc = bundle_json();
    if let Some(model) = doc["model"].as_object_mut()
        && let Some(template) = model.remove("estimator")
    {
        model.insert("base_estimator".into(), template);
    }
    doc
}

pub fn bundle() -> ArtifactBundle {
    let bytes = serde_json::to_vec(&bundle_json()).expect("fixture serializes");
    ArtifactBundle::from_slice(&bytes).expect("fixture is valid")
}

/// Write `doc` to `dir/MODEL_FILENAME`, returning the path.
pub fn write_artifact(dir: &Path, doc: &Value) -> PathBuf {
    let path = dir.join(MODEL_FILENAME);
    let bytes = serde_json::to_vec_pretty(doc).expect("fixture serializes");
    std::fs::write(&path, bytes).expect("write fixture artifact");
    path
}

/// A temporary directory holding the fixture artifact.
pub fn artifact_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    write_artifact(dir.path(), &bundle_json());
    dir
}
