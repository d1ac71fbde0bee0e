//! Index-labelled numeric sequences.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Numeric sequence with an ordered integer index.
///
/// Index labels are time stamps or row numbers. A series built with
/// [`Series::from_values`] gets the positional index `0..n`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    index: Vec<i64>,
    values: Vec<f64>,
}

impl Series {
    /// Create a series from explicit index labels and values.
    ///
    /// # Errors
    /// Returns [`AnalysisError::LengthMismatch`] if `index` and `values`
    /// differ in length.
    pub fn new(index: Vec<i64>, values: Vec<f64>) -> Result<Self> {
        if index.len() != values.len() {
            return Err(AnalysisError::LengthMismatch {
                what: "series values".into(),
                expected: index.len(),
                found: values.len(),
            });
        }
        Ok(Self { index, values })
    }

    /// Create a series with the positional index `0..values.len()`.
    pub fn from_values(values: Vec<f64>) -> Self {
        let index = (0..values.len() as i64).collect();
        Self { index, values }
    }

    pub fn index(&self) -> &[i64] {
        &self.index
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether both series carry the same labels in the same order.
    pub fn is_aligned_with(&self, other: &Series) -> bool {
        self.index == other.index
    }

    /// Split at position `cut` into `(before, after)`.
    ///
    /// Before holds positions `< cut`, after holds positions `>= cut`.
    /// A cut past the end yields an empty after slice.
    pub fn split_at(&self, cut: usize) -> (&[f64], &[f64]) {
        self.values.split_at(cut.min(self.values.len()))
    }

    /// Whether every label is strictly greater than the one before it.
    pub fn is_strictly_ascending(&self) -> bool {
        self.index.windows(2).all(|pair| pair[0] < pair[1])
    }

    /// Number of leading observations whose label is strictly below `label`.
    pub fn position_of_label(&self, label: i64) -> usize {
        self.index.partition_point(|&idx| idx < label)
    }

    /// Elementwise `self - other` on the shared index.
    ///
    /// # Errors
    /// Returns [`AnalysisError::Alignment`] if the indices differ. No
    /// reindexing is ever attempted.
    pub fn sub(&self, other: &Series) -> Result<Series> {
        if !self.is_aligned_with(other) {
            return Err(AnalysisError::alignment("minuend and subtrahend"));
        }
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a - b)
            .collect();
        Ok(Series {
            index: self.index.clone(),
            values,
        })
    }
}
