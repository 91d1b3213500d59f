//! Resolving requested feature names against a feature universe.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::error::{MarkerError, Result};

/// Name → column lookup over a feature universe, built once and reused for every query.
///
/// Duplicate names in the universe resolve to their first occurrence.
#[derive(Debug, Clone)]
pub struct FeatureIndex<'a> {
    lookup: HashMap<&'a str, usize>,
    len: usize,
}

impl<'a> FeatureIndex<'a> {
    pub fn new<S: AsRef<str>>(universe: &'a [S]) -> Self {
        let mut lookup = HashMap::with_capacity(universe.len());
        for (i, name) in universe.iter().enumerate() {
            lookup.entry(name.as_ref()).or_insert(i);
        }
        FeatureIndex {
            lookup,
            len: universe.len(),
        }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains_key(name)
    }

    /// Size of the universe, duplicates included
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of every requested name, in request order; `None` where the name is absent.
    pub fn match_all<S>(&self, requested: &[S]) -> Vec<Option<usize>>
    where
        S: AsRef<str> + Sync,
    {
        requested
            .par_iter()
            .map(|name| self.get(name.as_ref()))
            .collect()
    }
}

/// Match `requested` names against `universe`, returning the first-occurrence index of each
/// name or `None` when it is absent. The output has the same length and order as `requested`.
pub fn match_features<A, B>(requested: &[A], universe: &[B]) -> Vec<Option<usize>>
where
    A: AsRef<str> + Sync,
    B: AsRef<str>,
{
    FeatureIndex::new(universe).match_all(requested)
}

/// Turn match results into column indices, failing on the first unresolved name.
pub fn resolve_matches<S: AsRef<str>>(
    requested: &[S],
    matches: &[Option<usize>],
) -> Result<Vec<usize>> {
    if requested.len() != matches.len() {
        return Err(MarkerError::ShapeMismatch {
            context: "feature matches",
            expected: requested.len(),
            found: matches.len(),
        });
    }

    requested
        .iter()
        .zip(matches)
        .map(|(name, idx)| {
            idx.ok_or_else(|| MarkerError::FeatureNotFound {
                feature: name.as_ref().to_string(),
            })
        })
        .collect()
}

/// Column indices for `requested`, or [`MarkerError::FeatureNotFound`] if any name is absent.
pub fn select_columns<A, B>(requested: &[A], universe: &[B]) -> Result<Vec<usize>>
where
    A: AsRef<str> + Sync,
    B: AsRef<str>,
{
    resolve_matches(requested, &match_features(requested, universe))
}
