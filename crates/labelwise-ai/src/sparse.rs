//! Sparse row vectors produced by the vectorizers and consumed by classifiers.

use crate::error::PredictionError;

/// A fixed-width vector storing only its non-zero entries.
///
/// `indices` are strictly increasing and every index is `< dim`.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    dim: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseVector {
    /// The all-zero vector of width `dim`.
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from `(index, value)` pairs in any order. Zero values are dropped
    /// and duplicate indices are summed.
    pub fn from_pairs(
        dim: usize,
        mut pairs: Vec<(usize, f64)>,
    ) -> Result<Self, PredictionError> {
        pairs.sort_by_key(|&(i, _)| i);

        let mut indices: Vec<usize> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f64> = Vec::with_capacity(pairs.len());
        for (index, value) in pairs {
            if index >= dim {
                return Err(PredictionError::IndexOutOfRange { index, dim });
            }
            if indices.last() == Some(&index) {
                if let Some(last) = values.last_mut() {
                    *last += value;
                }
            } else {
                indices.push(index);
                values.push(value);
            }
        }

        let mut v = Self {
            dim,
            indices,
            values,
        };
        v.retain_nonzero();
        Ok(v)
    }

    /// Build from a dense slice, keeping non-zero entries.
    pub fn from_dense(dense: &[f64]) -> Self {
        let mut v = Self::zeros(dense.len());
        for (i, &x) in dense.iter().enumerate() {
            if x != 0.0 {
                v.indices.push(i);
                v.values.push(x);
            }
        }
        v
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dim];
        for (i, x) in self.iter() {
            dense[i] = x;
        }
        dense
    }

    /// Dot product with a dense weight slice. Entries beyond `weights.len()` contribute nothing.
    pub fn dot(&self, weights: &[f64]) -> f64 {
        self.iter()
            .filter_map(|(i, x)| weights.get(i).map(|w| w * x))
            .sum()
    }

    /// Horizontal concatenation: `self` occupies columns `0..self.dim`,
    /// `other` is shifted to start at `self.dim`.
    pub fn hstack(&self, other: &SparseVector) -> SparseVector {
        let mut indices = Vec::with_capacity(self.nnz() + other.nnz());
        let mut values = Vec::with_capacity(self.nnz() + other.nnz());
        indices.extend_from_slice(&self.indices);
        values.extend_from_slice(&self.values);
        indices.extend(other.indices.iter().map(|i| i + self.dim));
        values.extend_from_slice(&other.values);
        SparseVector {
            dim: self.dim + other.dim,
            indices,
            values,
        }
    }

    fn retain_nonzero(&mut self) {
        let mut keep = 0;
        for k in 0..self.indices.len() {
            if self.values[k] != 0.0 {
                self.indices[keep] = self.indices[k];
                self.values[keep] = self.values[k];
                keep += 1;
            }
        }
        self.indices.truncate(keep);
        self.values.truncate(keep);
    }
}
