//! TF-IDF text vectorizer over a fixed, pretrained vocabulary.
//!
//! Tokens are maximal runs of word characters (Unicode alphanumerics and `_`)
//! at least two characters long. Word n-grams join consecutive tokens with a
//! single space. Terms missing from the vocabulary are ignored.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{ModelLoadError, PredictionError};
use crate::sparse::SparseVector;

/// Row normalization applied after TF-IDF weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    L1,
}

/// A fitted TF-IDF vectorizer as stored in the artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default = "default_true")]
    lowercase: bool,
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default = "default_norm")]
    norm: Option<Norm>,
    #[serde(default)]
    stop_words: Option<HashSet<String>>,
}

/// Longest word n-gram an artifact may ask for.
pub const MAX_NGRAM: usize = 16;

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_true() -> bool {
    true
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

impl TfidfVectorizer {
    /// Build a vectorizer from a vocabulary and IDF weights, with default options.
    pub fn new(vocabulary: HashMap<String, usize>, idf: Vec<f64>) -> Result<Self, ModelLoadError> {
        let v = Self {
            vocabulary,
            idf,
            ngram_range: default_ngram_range(),
            lowercase: true,
            sublinear_tf: false,
            norm: default_norm(),
            stop_words: None,
        };
        v.validate("vectorizer")?;
        Ok(v)
    }

    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        self.ngram_range = (min_n, max_n);
        self
    }

    pub fn with_norm(mut self, norm: Option<Norm>) -> Self {
        self.norm = norm;
        self
    }

    pub fn with_sublinear_tf(mut self, sublinear_tf: bool) -> Self {
        self.sublinear_tf = sublinear_tf;
        self
    }

    /// Output dimensionality, fixed at training time.
    pub fn dim(&self) -> usize {
        self.idf.len()
    }

    /// Check internal consistency. `part` names the artifact key in errors.
    pub fn validate(&self, part: &str) -> Result<(), ModelLoadError> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n || max_n > MAX_NGRAM {
            return Err(ModelLoadError::Corrupt(format!(
                "{part}: invalid ngram_range ({min_n}, {max_n}), n-grams must lie in 1..={MAX_NGRAM}"
            )));
        }

        let dim = self.dim();
        let mut seen = vec![false; dim];
        for (term, &col) in &self.vocabulary {
            if col >= dim {
                return Err(ModelLoadError::Corrupt(format!(
                    "{part}: term '{term}' maps to column {col}, idf has {dim} entries"
                )));
            }
            if std::mem::replace(&mut seen[col], true) {
                return Err(ModelLoadError::Corrupt(format!(
                    "{part}: column {col} is assigned to more than one term"
                )));
            }
        }

        if let Some(bad) = self.idf.iter().find(|w| !w.is_finite()) {
            return Err(ModelLoadError::Corrupt(format!(
                "{part}: non-finite idf weight {bad}"
            )));
        }
        Ok(())
    }

    /// Vectorize one document. Empty text yields the all-zero vector.
    ///
    /// Fails only if the vocabulary points outside the idf table, which
    /// [`validate`](Self::validate) rules out for loaded artifacts.
    pub fn transform(&self, text: &str) -> Result<SparseVector, PredictionError> {
        let lowered;
        let text = if self.lowercase {
            lowered = text.to_lowercase();
            lowered.as_str()
        } else {
            text
        };

        let tokens: Vec<&str> = tokenize(text)
            .filter(|t| {
                self.stop_words
                    .as_ref()
                    .is_none_or(|stop| !stop.contains(*t))
            })
            .collect();

        let mut counts: HashMap<usize, f64> = HashMap::new();
        let (min_n, max_n) = self.ngram_range;
        for n in min_n..=max_n.min(tokens.len()) {
            for window in tokens.windows(n) {
                let term = window.join(" ");
                if let Some(&col) = self.vocabulary.get(&term) {
                    *counts.entry(col).or_insert(0.0) += 1.0;
                }
            }
        }

        let pairs = counts
            .into_iter()
            .map(|(col, tf)| {
                let idf = self.idf.get(col).copied().ok_or(PredictionError::IndexOutOfRange {
                    index: col,
                    dim: self.dim(),
                })?;
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                Ok((col, tf * idf))
            })
            .collect::<Result<Vec<_>, PredictionError>>()?;

        let mut row = SparseVector::from_pairs(self.dim(), pairs)?;
        if let Some(norm) = self.norm {
            normalize(&mut row, norm);
        }
        Ok(row)
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().nth(1).is_some())
}

fn normalize(row: &mut SparseVector, norm: Norm) {
    let values = row.values_mut();
    let total: f64 = match norm {
        Norm::L2 => values.iter().map(|x| x * x).sum::<f64>().sqrt(),
        Norm::L1 => values.iter().map(|x| x.abs()).sum(),
    };
    if total > 0.0 {
        for x in values.iter_mut() {
            *x /= total;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(terms: &[&str]) -> HashMap<String, usize> {
        terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i))
            .collect()
    }

    #[test]
    fn tokenizer_drops_single_chars_and_punctuation() {
        let tokens: Vec<&str> = tokenize("a crash, in x_y-module!").collect();
        assert_eq!(tokens, vec!["crash", "in", "x_y", "module"]);
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let v = TfidfVectorizer::new(vocab(&["crash", "error"]), vec![1.0, 1.0]).unwrap();
        let row = v.transform("").unwrap();
        assert_eq!(row.dim(), 2);
        assert_eq!(row.nnz(), 0);
    }

    #[test]
    fn weights_are_l2_normalized() {
        let v = TfidfVectorizer::new(vocab(&["crash", "error"]), vec![1.0, 2.0]).unwrap();
        let dense = v.transform("crash error crash").unwrap().to_dense();
        // tf*idf = [2, 2] -> unit length.
        assert!((dense[0] - dense[1]).abs() < 1e-12);
        let norm: f64 = dense.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unnormalized_sublinear_tf() {
        let v = TfidfVectorizer::new(vocab(&["crash"]), vec![2.0])
            .unwrap()
            .with_norm(None)
            .with_sublinear_tf(true);
        let dense = v.transform("crash crash").unwrap().to_dense();
        assert!((dense[0] - 2.0 * (1.0 + 2f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn bigrams_are_matched() {
        let v = TfidfVectorizer::new(vocab(&["stack", "stack trace"]), vec![1.0, 1.0])
            .unwrap()
            .with_ngram_range(1, 2)
            .with_norm(None);
        assert_eq!(v.transform("Stack trace attached").unwrap().to_dense(), vec![1.0, 1.0]);
    }

    #[test]
    fn stop_words_are_skipped_before_ngrams() {
        let json = serde_json::json!({
            "vocabulary": {"null pointer": 0},
            "idf": [1.0],
            "ngram_range": [2, 2],
            "norm": null,
            "stop_words": ["the"],
        });
        let v: TfidfVectorizer = serde_json::from_value(json).unwrap();
        assert_eq!(v.transform("null the pointer").unwrap().to_dense(), vec![1.0]);
    }

    #[test]
    fn huge_ngram_range_is_rejected() {
        let json = serde_json::json!({
            "vocabulary": {"crash": 0},
            "idf": [1.0],
            "ngram_range": [1, 100_000_000_000u64],
        });
        let v: TfidfVectorizer = serde_json::from_value(json).unwrap();
        assert!(matches!(
            v.validate("tfidf_title"),
            Err(ModelLoadError::Corrupt(_))
        ));
    }

    #[test]
    fn ngram_loop_stops_at_token_count() {
        // Built without validation: transform must still finish promptly.
        let json = serde_json::json!({
            "vocabulary": {"crash": 0, "crash now": 1},
            "idf": [1.0, 1.0],
            "ngram_range": [1, 100_000_000_000u64],
            "norm": null,
        });
        let v: TfidfVectorizer = serde_json::from_value(json).unwrap();
        assert_eq!(v.transform("crash now").unwrap().to_dense(), vec![1.0, 1.0]);
        assert_eq!(v.transform("").unwrap().nnz(), 0);
    }

    #[test]
    fn ngram_range_up_to_limit_is_valid() {
        let v = TfidfVectorizer::new(vocab(&["crash"]), vec![1.0])
            .unwrap()
            .with_ngram_range(1, MAX_NGRAM);
        assert!(v.validate("tfidf_body").is_ok());
    }

    #[test]
    fn vocabulary_outside_idf_is_a_prediction_error() {
        // Skips validation, so the bad column reaches transform.
        let json = serde_json::json!({
            "vocabulary": {"crash": 3},
            "idf": [1.0],
        });
        let v: TfidfVectorizer = serde_json::from_value(json).unwrap();
        let err = v.transform("crash").unwrap_err();
        assert!(matches!(
            err,
            PredictionError::IndexOutOfRange { index: 3, dim: 1 }
        ));
    }

    #[test]
    fn validate_rejects_column_outside_idf() {
        let err = TfidfVectorizer::new(vocab(&["crash", "error"]), vec![1.0]).unwrap_err();
        assert!(matches!(err, ModelLoadError::Corrupt(_)));
    }

    #[test]
    fn validate_rejects_shared_column() {
        let mut vocabulary = vocab(&["crash"]);
        vocabulary.insert("error".into(), 0);
        let err = TfidfVectorizer::new(vocabulary, vec![1.0]).unwrap_err();
        assert!(matches!(err, ModelLoadError::Corrupt(_)));
    }

    #[test]
    fn serde_defaults() {
        let v: TfidfVectorizer =
            serde_json::from_value(serde_json::json!({"vocabulary": {}, "idf": []})).unwrap();
        assert_eq!(v.ngram_range, (1, 1));
        assert!(v.lowercase);
        assert_eq!(v.norm, Some(Norm::L2));
    }
}
