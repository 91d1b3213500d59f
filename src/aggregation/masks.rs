//! Named group membership masks.
//!
//! [`GroupMasks`] pairs group names with a groups × cells boolean matrix, builds it from per-cell
//! labels, and reports empty groups by name when aggregating.

use std::collections::HashMap;

use ndarray::{Array2, ArrayView1, ArrayView2};
use single_utilities::traits::FloatOpsTS;

use super::{GroupStats, masked_frac_nonzero_named, masked_max, masked_mean_named};
use crate::error::{MarkerError, Result};

/// Named boolean membership masks, one row per group and one column per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMasks {
    groups: Vec<String>,
    masks: Array2<bool>,
}

impl GroupMasks {
    /// Wrap an existing groups × cells mask matrix.
    pub fn new(groups: Vec<String>, masks: Array2<bool>) -> Result<Self> {
        if groups.len() != masks.nrows() {
            return Err(MarkerError::ShapeMismatch {
                context: "group names",
                expected: masks.nrows(),
                found: groups.len(),
            });
        }
        Ok(GroupMasks { groups, masks })
    }

    /// One group per distinct label, in order of first appearance. Every cell belongs to
    /// exactly one group.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut groups: Vec<String> = Vec::new();
        let mut lookup: HashMap<&str, usize> = HashMap::new();
        let assignments: Vec<usize> = labels
            .iter()
            .map(|label| {
                let label = label.as_ref();
                *lookup.entry(label).or_insert_with(|| {
                    groups.push(label.to_string());
                    groups.len() - 1
                })
            })
            .collect();

        let mut masks = Array2::from_elem((groups.len(), labels.len()), false);
        for (cell, &group) in assignments.iter().enumerate() {
            masks[[group, cell]] = true;
        }
        GroupMasks { groups, masks }
    }

    /// Groups from cells carrying several labels each; a cell may fall into many groups.
    pub fn from_multi_labels<L, S>(labels: &[L]) -> Self
    where
        L: AsRef<[S]>,
        S: AsRef<str>,
    {
        let mut groups: Vec<String> = Vec::new();
        let mut lookup: HashMap<String, usize> = HashMap::new();
        let mut members: Vec<(usize, usize)> = Vec::new();
        for (cell, cell_labels) in labels.iter().enumerate() {
            for label in cell_labels.as_ref() {
                let label = label.as_ref();
                let group = match lookup.get(label) {
                    Some(&g) => g,
                    None => {
                        groups.push(label.to_string());
                        lookup.insert(label.to_string(), groups.len() - 1);
                        groups.len() - 1
                    }
                };
                members.push((group, cell));
            }
        }

        let mut masks = Array2::from_elem((groups.len(), labels.len()), false);
        for (group, cell) in members {
            masks[[group, cell]] = true;
        }
        GroupMasks { groups, masks }
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn masks(&self) -> ArrayView2<'_, bool> {
        self.masks.view()
    }

    pub fn mask(&self, group: &str) -> Option<ArrayView1<'_, bool>> {
        self.groups
            .iter()
            .position(|g| g == group)
            .map(|row| self.masks.row(row))
    }

    pub fn n_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn n_cells(&self) -> usize {
        self.masks.ncols()
    }

    pub fn group_sizes(&self) -> Vec<usize> {
        super::group_sizes(self.masks.view())
    }

    fn group_name(&self, group: usize) -> String {
        self.groups[group].clone()
    }

    /// See [`masked_max`].
    pub fn max<T: FloatOpsTS>(&self, x: ArrayView2<T>) -> Result<Array2<T>> {
        masked_max(x, self.masks.view())
    }

    /// See [`masked_mean`](super::masked_mean); an empty group is reported by name.
    pub fn mean<T: FloatOpsTS>(&self, x: ArrayView2<T>) -> Result<Array2<T>> {
        masked_mean_named(x, self.masks.view(), |g| self.group_name(g))
    }

    /// See [`masked_frac_nonzero`](super::masked_frac_nonzero); an empty group is reported by name.
    pub fn frac_nonzero<T: FloatOpsTS>(&self, x: ArrayView2<T>) -> Result<Array2<T>> {
        masked_frac_nonzero_named(x, self.masks.view(), |g| self.group_name(g))
    }

    pub fn stats<T: FloatOpsTS>(&self, x: ArrayView2<T>) -> Result<GroupStats<T>> {
        GroupStats::compute(x, self.masks.view())
    }
}
