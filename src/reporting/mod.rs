//! Tidy outputs for downstream analysis and plotting.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::error::{MarkerError, Result};

pub mod annotation;

pub use annotation::{AnnotationOptions, AnnotationTable, LevelAssignment};

/// One cell of a group × feature matrix in long form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRecord<T> {
    pub group: String,
    pub feature: String,
    pub value: T,
}

/// Flatten a group × feature matrix into one record per cell, row by row.
pub fn to_long<T, G, F>(
    matrix: ArrayView2<T>,
    group_labels: &[G],
    feature_labels: &[F],
) -> Result<Vec<LongRecord<T>>>
where
    T: Clone,
    G: AsRef<str>,
    F: AsRef<str>,
{
    if group_labels.len() != matrix.nrows() {
        return Err(MarkerError::ShapeMismatch {
            context: "group labels",
            expected: matrix.nrows(),
            found: group_labels.len(),
        });
    }
    if feature_labels.len() != matrix.ncols() {
        return Err(MarkerError::ShapeMismatch {
            context: "feature labels",
            expected: matrix.ncols(),
            found: feature_labels.len(),
        });
    }

    let mut records = Vec::with_capacity(matrix.len());
    for (row, group) in matrix.rows().into_iter().zip(group_labels) {
        for (value, feature) in row.iter().zip(feature_labels) {
            records.push(LongRecord {
                group: group.as_ref().to_string(),
                feature: feature.as_ref().to_string(),
                value: value.clone(),
            });
        }
    }
    Ok(records)
}
