//! Expression matrix extraction.
//!
//! Expression data arrives either dense (`ndarray::Array2`) or sparse (`nalgebra_sparse`
//! CSR/CSC, cells × features). The aggregation routines work on dense arrays only, so every input
//! is densified through the [`Densify`] trait, optionally restricted to a subset of columns.
//! Densification trades memory for speed; it never changes values.

use std::collections::HashSet;

use log::debug;
use nalgebra_sparse::{CscMatrix, CsrMatrix};
use ndarray::{Array2, Axis};
use single_utilities::traits::FloatOps;

use crate::error::{MarkerError, Result};

pub mod matching;

pub use matching::{FeatureIndex, match_features, resolve_matches, select_columns};

/// A cells × features matrix that can be turned into a dense array.
pub trait Densify<T> {
    /// Number of cells (rows)
    fn n_obs(&self) -> usize;

    /// Number of features (columns)
    fn n_vars(&self) -> usize;

    fn to_dense(&self) -> Array2<T>;

    /// Dense copy of the given columns, in the given order. Columns may repeat.
    fn to_dense_columns(&self, columns: &[usize]) -> Result<Array2<T>>;
}

fn check_columns(columns: &[usize], n_vars: usize) -> Result<()> {
    match columns.iter().find(|&&c| c >= n_vars) {
        Some(&index) => Err(MarkerError::IndexOutOfBounds {
            context: "feature columns",
            index,
            len: n_vars,
        }),
        None => Ok(()),
    }
}

/// For each source column, the output positions it fills.
fn column_targets(columns: &[usize], n_vars: usize) -> Vec<Vec<usize>> {
    let mut targets = vec![Vec::new(); n_vars];
    for (out, &col) in columns.iter().enumerate() {
        targets[col].push(out);
    }
    targets
}

impl<T> Densify<T> for Array2<T>
where
    T: FloatOps,
{
    fn n_obs(&self) -> usize {
        self.nrows()
    }

    fn n_vars(&self) -> usize {
        self.ncols()
    }

    fn to_dense(&self) -> Array2<T> {
        self.clone()
    }

    fn to_dense_columns(&self, columns: &[usize]) -> Result<Array2<T>> {
        check_columns(columns, self.ncols())?;
        Ok(self.select(Axis(1), columns))
    }
}

impl<T> Densify<T> for CsrMatrix<T>
where
    T: FloatOps,
{
    fn n_obs(&self) -> usize {
        self.nrows()
    }

    fn n_vars(&self) -> usize {
        self.ncols()
    }

    fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::zeros((self.nrows(), self.ncols()));
        for (row, col, &value) in self.triplet_iter() {
            dense[[row, col]] = value;
        }
        dense
    }

    fn to_dense_columns(&self, columns: &[usize]) -> Result<Array2<T>> {
        check_columns(columns, self.ncols())?;
        let targets = column_targets(columns, self.ncols());
        let mut dense = Array2::zeros((self.nrows(), columns.len()));
        for (row, col, &value) in self.triplet_iter() {
            for &out in &targets[col] {
                dense[[row, out]] = value;
            }
        }
        Ok(dense)
    }
}

impl<T> Densify<T> for CscMatrix<T>
where
    T: FloatOps,
{
    fn n_obs(&self) -> usize {
        self.nrows()
    }

    fn n_vars(&self) -> usize {
        self.ncols()
    }

    fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::zeros((self.nrows(), self.ncols()));
        for (row, col, &value) in self.triplet_iter() {
            dense[[row, col]] = value;
        }
        dense
    }

    fn to_dense_columns(&self, columns: &[usize]) -> Result<Array2<T>> {
        check_columns(columns, self.ncols())?;
        let mut dense = Array2::zeros((self.nrows(), columns.len()));
        for (out, &col) in columns.iter().enumerate() {
            let lane = self.col(col);
            for (&row, &value) in lane.row_indices().iter().zip(lane.values()) {
                dense[[row, out]] = value;
            }
        }
        Ok(dense)
    }
}

/// Dense expression matrix and the names of its columns.
///
/// With `features`, the requested names are intersected with `var_names`: only presence counts,
/// so duplicates collapse and the result follows the order of `var_names`. Requested names that
/// are absent are dropped. Without `features`, every column is returned.
pub fn get_expr<M, T, V, F>(
    matrix: &M,
    var_names: &[V],
    features: Option<&[F]>,
) -> Result<(Array2<T>, Vec<String>)>
where
    M: Densify<T>,
    V: AsRef<str>,
    F: AsRef<str>,
{
    if var_names.len() != matrix.n_vars() {
        return Err(MarkerError::ShapeMismatch {
            context: "feature names",
            expected: matrix.n_vars(),
            found: var_names.len(),
        });
    }

    let Some(features) = features else {
        let names = var_names.iter().map(|v| v.as_ref().to_string()).collect();
        return Ok((matrix.to_dense(), names));
    };

    let requested: HashSet<&str> = features.iter().map(AsRef::as_ref).collect();
    let mut seen = HashSet::with_capacity(requested.len());
    let selected: Vec<&str> = var_names
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| requested.contains(name) && seen.insert(*name))
        .collect();

    if selected.len() < requested.len() {
        debug!(
            "{} of {} requested features are not present in the matrix",
            requested.len() - selected.len(),
            requested.len()
        );
    }

    let columns = select_columns(&selected, var_names)?;
    let expr = matrix.to_dense_columns(&columns)?;
    Ok((expr, selected.into_iter().map(str::to_string).collect()))
}
