//! Turns a `(title, body)` pair into the classifier's input row.

use crate::bundle::ArtifactBundle;
use crate::error::PredictionError;
use crate::normalize::normalize;
use crate::sparse::SparseVector;

/// Vectorize one issue.
///
/// Title and body are normalized and vectorized independently, then joined
/// title first: columns `0..title_dim` hold the title, the rest hold the
/// body. The classifier was trained on that column order; swapping the halves
/// would still produce a row of the right width, just the wrong one.
pub fn vectorize(
    bundle: &ArtifactBundle,
    title: Option<&str>,
    body: Option<&str>,
) -> Result<SparseVector, PredictionError> {
    let title = normalize(title);
    let body = normalize(body);

    let title_row = bundle.title_vectorizer().transform(&title)?;
    let body_row = bundle.body_vectorizer().transform(&body)?;
    Ok(title_row.hstack(&body_row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn width_is_sum_of_vectorizers() {
        let bundle = fixtures::bundle();
        let row = vectorize(&bundle, Some("Crash"), Some("stack trace")).unwrap();
        assert_eq!(
            row.dim(),
            bundle.title_vectorizer().dim() + bundle.body_vectorizer().dim()
        );
    }

    #[test]
    fn title_occupies_leading_columns() {
        let bundle = fixtures::bundle();
        let title_dim = bundle.title_vectorizer().dim();

        let row = vectorize(&bundle, Some("crash"), None).unwrap();
        assert!(row.iter().all(|(i, _)| i < title_dim));

        let row = vectorize(&bundle, None, Some("crash")).unwrap();
        assert!(row.iter().all(|(i, _)| i >= title_dim));
    }

    #[test]
    fn swapping_inputs_changes_row() {
        let bundle = fixtures::bundle();
        let original = vectorize(&bundle, Some("docs crash"), Some("readme typo")).unwrap();
        let swapped = vectorize(&bundle, Some("readme typo"), Some("docs crash")).unwrap();
        assert_ne!(original, swapped);
    }

    #[test]
    fn missing_and_empty_text_are_zero() {
        let bundle = fixtures::bundle();
        let row = vectorize(&bundle, None, Some("   ")).unwrap();
        assert_eq!(row.nnz(), 0);
        assert_eq!(row.dim(), bundle.feature_width());
    }

    #[test]
    fn input_is_normalized_first() {
        let bundle = fixtures::bundle();
        assert_eq!(
            vectorize(&bundle, Some("  CRASH "), Some("Stack")).unwrap(),
            vectorize(&bundle, Some("crash"), Some("stack")).unwrap()
        );
    }
}
