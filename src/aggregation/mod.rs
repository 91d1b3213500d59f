//! Masked per-group statistics over a dense expression matrix.
//!
//! Expression is laid out cells × features; group membership is a boolean matrix of
//! groups × cells, one row per group. Groups may overlap. All functions return a
//! groups × features matrix, and each group is computed only from its own member cells.
//!
//! ## Empty groups
//!
//! - [`masked_max`] multiplies by the mask before reducing, so cells outside a group contribute 0
//!   and a group without members yields 0 for every feature.
//! - [`masked_mean`] and [`masked_frac_nonzero`] divide by the group size and return
//!   [`MarkerError::EmptyGroup`] rather than NaN.
//! - [`GroupStats::compute`] is lenient: it fills empty groups with NaN and reports the group
//!   sizes, so a valid zero can be told apart from an empty-group artefact.
//!
//! ## NaN values
//!
//! A NaN in a member cell propagates to that group's max and mean for the feature. A NaN in a
//! cell outside the group never reaches the group's statistics. NaN is not above zero, so it
//! counts as unexpressed in the expressed fractions.

use log::{debug, warn};
use ndarray::{Array, Array2, ArrayBase, ArrayView2, Axis, Data, RemoveAxis, Zip};
use num_traits::{Float, Zero};
use single_utilities::traits::FloatOpsTS;

use crate::error::{MarkerError, Result};

pub mod masks;

pub use masks::GroupMasks;

fn check_masks<T>(x: &ArrayView2<T>, masks: &ArrayView2<bool>) -> Result<()> {
    if masks.ncols() != x.nrows() {
        return Err(MarkerError::ShapeMismatch {
            context: "group masks",
            expected: x.nrows(),
            found: masks.ncols(),
        });
    }
    Ok(())
}

/// Number of member cells in every group
pub fn group_sizes(masks: ArrayView2<bool>) -> Vec<usize> {
    masks
        .rows()
        .into_iter()
        .map(|mask| mask.iter().filter(|&&m| m).count())
        .collect()
}

#[inline]
fn nan_max<T: FloatOpsTS>(a: T, b: T) -> T {
    if <T as Float>::is_nan(a) || <T as Float>::is_nan(b) {
        <T as Float>::nan()
    } else {
        Float::max(a, b)
    }
}

/// Per-group maximum of `x * mask` over cells.
///
/// Groups are processed in parallel; each group owns its output row, so the result does not
/// depend on scheduling.
pub fn masked_max<T>(x: ArrayView2<T>, masks: ArrayView2<bool>) -> Result<Array2<T>>
where
    T: FloatOpsTS,
{
    check_masks(&x, &masks)?;
    let n_cells = x.nrows();
    debug!(
        "masked_max over {} groups x {} features ({} cells)",
        masks.nrows(),
        x.ncols(),
        n_cells
    );

    let mut out = Array2::from_elem((masks.nrows(), x.ncols()), <T as Float>::neg_infinity());
    Zip::from(out.rows_mut())
        .and(masks.rows())
        .par_for_each(|mut acc, mask| {
            let mut members = 0;
            for (cell, _) in mask.iter().enumerate().filter(|&(_, &m)| m) {
                members += 1;
                Zip::from(&mut acc)
                    .and(x.row(cell))
                    .for_each(|a, &v| *a = nan_max(*a, v));
            }
            // masked-out cells were multiplied to zero
            if members < n_cells || n_cells == 0 {
                acc.mapv_inplace(|a| nan_max(a, T::zero()));
            }
        });

    Ok(out)
}

/// Per-group sums of `values` over member rows only, in parallel across groups.
fn masked_sums<T>(values: ArrayView2<T>, masks: ArrayView2<bool>) -> Array2<T>
where
    T: FloatOpsTS,
{
    let mut out = Array2::zeros((masks.nrows(), values.ncols()));
    Zip::from(out.rows_mut())
        .and(masks.rows())
        .par_for_each(|mut acc, mask| {
            for (cell, _) in mask.iter().enumerate().filter(|&(_, &m)| m) {
                Zip::from(&mut acc)
                    .and(values.row(cell))
                    .for_each(|a, &v| *a = *a + v);
            }
        });
    out
}

/// Divide each row of `sums` by its group size. Empty groups become NaN and are returned.
fn divide_by_sizes<T>(sums: &mut Array2<T>, sizes: &[usize]) -> Vec<usize>
where
    T: FloatOpsTS,
{
    let mut empty = Vec::new();
    for (g, (mut row, &size)) in sums.rows_mut().into_iter().zip(sizes).enumerate() {
        if size == 0 {
            row.fill(<T as Float>::nan());
            empty.push(g);
        } else {
            let n = T::from(size).unwrap();
            row.mapv_inplace(|v| v / n);
        }
    }
    empty
}

/// Group means that fail on the first empty group, named through `group_name`.
fn strict_group_means<T, N>(
    values: ArrayView2<T>,
    masks: ArrayView2<bool>,
    group_name: N,
) -> Result<Array2<T>>
where
    T: FloatOpsTS,
    N: Fn(usize) -> String,
{
    let sizes = group_sizes(masks.view());
    if let Some(g) = sizes.iter().position(|&s| s == 0) {
        return Err(MarkerError::EmptyGroup {
            group: group_name(g),
        });
    }
    let mut sums = masked_sums(values, masks);
    divide_by_sizes(&mut sums, &sizes);
    Ok(sums)
}

fn expressed<T>(x: ArrayView2<T>) -> Array2<T>
where
    T: FloatOpsTS,
{
    x.mapv(|v| if v > T::zero() { T::one() } else { T::zero() })
}

pub(crate) fn masked_mean_named<T, N>(
    x: ArrayView2<T>,
    masks: ArrayView2<bool>,
    group_name: N,
) -> Result<Array2<T>>
where
    T: FloatOpsTS,
    N: Fn(usize) -> String,
{
    check_masks(&x, &masks)?;
    debug!(
        "masked_mean over {} groups x {} features",
        masks.nrows(),
        x.ncols()
    );
    strict_group_means(x, masks, group_name)
}

pub(crate) fn masked_frac_nonzero_named<T, N>(
    x: ArrayView2<T>,
    masks: ArrayView2<bool>,
    group_name: N,
) -> Result<Array2<T>>
where
    T: FloatOpsTS,
    N: Fn(usize) -> String,
{
    check_masks(&x, &masks)?;
    strict_group_means(expressed(x).view(), masks, group_name)
}

/// Per-group mean over member cells: `sum(x * mask) / sum(mask)`.
///
/// Returns [`MarkerError::EmptyGroup`] (with the group's row index) if any mask selects no cell.
pub fn masked_mean<T>(x: ArrayView2<T>, masks: ArrayView2<bool>) -> Result<Array2<T>>
where
    T: FloatOpsTS,
{
    masked_mean_named(x, masks, |g| g.to_string())
}

/// Per-group fraction of member cells with a value strictly above zero.
pub fn masked_frac_nonzero<T>(x: ArrayView2<T>, masks: ArrayView2<bool>) -> Result<Array2<T>>
where
    T: FloatOpsTS,
{
    masked_frac_nonzero_named(x, masks, |g| g.to_string())
}

/// Fraction of entries along `axis` that are strictly greater than zero.
///
/// A lane of length zero yields NaN.
pub fn frac_nonzero<A, S, D>(x: &ArrayBase<S, D>, axis: Axis) -> Array<f64, D::Smaller>
where
    A: PartialOrd + Zero,
    S: Data<Elem = A>,
    D: RemoveAxis,
{
    let zero = A::zero();
    x.map_axis(axis, |lane| {
        let positive = lane.iter().filter(|&v| *v > zero).count();
        positive as f64 / lane.len() as f64
    })
}

/// Max, mean and expressed fraction per group, together with the group sizes.
#[derive(Debug, Clone)]
pub struct GroupStats<T> {
    pub max: Array2<T>,
    /// NaN rows for groups without members
    pub mean: Array2<T>,
    /// NaN rows for groups without members
    pub frac_nonzero: Array2<T>,
    pub group_sizes: Vec<usize>,
}

impl<T> GroupStats<T>
where
    T: FloatOpsTS,
{
    pub fn compute(x: ArrayView2<T>, masks: ArrayView2<bool>) -> Result<Self> {
        let max = masked_max(x.view(), masks.view())?;

        let sizes = group_sizes(masks.view());

        let mut mean = masked_sums(x.view(), masks.view());
        let empty = divide_by_sizes(&mut mean, &sizes);

        let mut frac_nonzero = masked_sums(expressed(x.view()).view(), masks.view());
        divide_by_sizes(&mut frac_nonzero, &sizes);

        if !empty.is_empty() {
            warn!(
                "{} of {} groups have no member cells; their mean is NaN and their max is 0",
                empty.len(),
                sizes.len()
            );
        }

        Ok(GroupStats {
            max,
            mean,
            frac_nonzero,
            group_sizes: sizes,
        })
    }

    pub fn n_groups(&self) -> usize {
        self.group_sizes.len()
    }

    pub fn is_empty_group(&self, group: usize) -> bool {
        self.group_sizes.get(group).is_some_and(|&s| s == 0)
    }

    /// Row indices of groups without member cells
    pub fn empty_groups(&self) -> Vec<usize> {
        self.group_sizes
            .iter()
            .enumerate()
            .filter_map(|(g, &s)| if s == 0 { Some(g) } else { None })
            .collect()
    }
}
