//! Hierarchical marker-gene dictionaries.
//!
//! A [`MarkerHierarchy`] maps cell-type names to a [`MarkerNode`], which carries the marker genes
//! for that cell type and, optionally, a nested hierarchy of finer subtypes. Hierarchies are
//! usually read once from a YAML document (see [`config`]) and treated as immutable afterwards.
//!
//! ## Example
//!
//! ```rust
//! use single_markers::markers::MarkerHierarchy;
//!
//! let hierarchy = MarkerHierarchy::from_yaml_str(
//!     "Neuron:\n  marker_genes: [STMN2, DCX]\n  subtypes:\n    Excitatory:\n      marker_genes: [SLC17A7]\n",
//! )
//! .unwrap();
//! assert_eq!(hierarchy.depth(), 2);
//! ```

use std::collections::{BTreeSet, HashMap};

pub mod config;
pub mod encoding;

pub use config::read_yaml;
pub use encoding::{BinaryMarkerMatrix, dict_to_binary};

/// A single cell type: its marker genes and, if it is further subdivided, its subtypes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarkerNode {
    /// Marker genes in the order they were declared
    pub marker_genes: Vec<String>,
    /// Nested subtypes; `None` marks a leaf
    pub subtypes: Option<MarkerHierarchy>,
}

impl MarkerNode {
    /// Create a leaf node from a list of marker genes
    pub fn leaf<I, S>(marker_genes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MarkerNode {
            marker_genes: marker_genes.into_iter().map(Into::into).collect(),
            subtypes: None,
        }
    }

    /// Attach a subtype hierarchy to this node
    pub fn with_subtypes(mut self, subtypes: MarkerHierarchy) -> Self {
        self.subtypes = Some(subtypes);
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.subtypes.is_none()
    }
}

/// Ordered mapping from cell-type name to [`MarkerNode`].
///
/// Names are unique within one level; insertion order is preserved and drives the row order of
/// everything derived from the hierarchy.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarkerHierarchy {
    entries: Vec<(String, MarkerNode)>,
    positions: HashMap<String, usize>,
}

impl MarkerHierarchy {
    pub fn new() -> Self {
        MarkerHierarchy::default()
    }

    /// Insert a cell type, replacing (and returning) an existing node with the same name.
    /// A replaced node keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, node: MarkerNode) -> Option<MarkerNode> {
        let name = name.into();
        match self.positions.get(&name) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, node)),
            None => {
                self.positions.insert(name.clone(), self.entries.len());
                self.entries.push((name, node));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&MarkerNode> {
        self.positions.get(name).map(|&pos| &self.entries[pos].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MarkerNode)> {
        self.entries.iter().map(|(n, node)| (n.as_str(), node))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Number of levels in the hierarchy.
    ///
    /// A level containing only leaves has depth 1; every nested `subtypes` level adds one. An
    /// empty hierarchy has depth 0.
    pub fn depth(&self) -> usize {
        self.entries
            .iter()
            .map(|(_, node)| 1 + node.subtypes.as_ref().map_or(0, MarkerHierarchy::depth))
            .max()
            .unwrap_or(0)
    }

    /// Marker genes of every cell type at this level, in insertion order.
    pub fn markers(&self) -> Vec<(&str, &[String])> {
        self.entries
            .iter()
            .map(|(n, node)| (n.as_str(), node.marker_genes.as_slice()))
            .collect()
    }

    /// All nodes `level` steps below this one (0 is this level), flattened across parents.
    ///
    /// Iterating `0..self.depth()` visits every level of the hierarchy top-down.
    pub fn level(&self, level: usize) -> Vec<(&str, &MarkerNode)> {
        let mut out = Vec::new();
        self.collect_level(level, &mut out);
        out
    }

    fn collect_level<'a>(&'a self, level: usize, out: &mut Vec<(&'a str, &'a MarkerNode)>) {
        for (name, node) in &self.entries {
            if level == 0 {
                out.push((name.as_str(), node));
            } else if let Some(subtypes) = &node.subtypes {
                subtypes.collect_level(level - 1, out);
            }
        }
    }

    /// Sorted, de-duplicated union of all marker genes at every level.
    pub fn all_marker_genes(&self) -> Vec<String> {
        let mut genes = BTreeSet::new();
        self.collect_genes(&mut genes);
        genes.into_iter().map(str::to_string).collect()
    }

    fn collect_genes<'a>(&'a self, genes: &mut BTreeSet<&'a str>) {
        for (_, node) in &self.entries {
            genes.extend(node.marker_genes.iter().map(String::as_str));
            if let Some(subtypes) = &node.subtypes {
                subtypes.collect_genes(genes);
            }
        }
    }
}

impl<S: Into<String>> FromIterator<(S, MarkerNode)> for MarkerHierarchy {
    fn from_iter<I: IntoIterator<Item = (S, MarkerNode)>>(iter: I) -> Self {
        let mut hierarchy = MarkerHierarchy::new();
        for (name, node) in iter {
            hierarchy.insert(name, node);
        }
        hierarchy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brain() -> MarkerHierarchy {
        let neuron_subtypes: MarkerHierarchy = [
            (
                "Excitatory",
                MarkerNode::leaf(["SLC17A7"]).with_subtypes(
                    [("Cortical", MarkerNode::leaf(["TBR1"]))].into_iter().collect(),
                ),
            ),
            ("Inhibitory", MarkerNode::leaf(["GAD1", "GAD2"])),
        ]
        .into_iter()
        .collect();

        [
            (
                "Neuron",
                MarkerNode::leaf(["STMN2", "DCX"]).with_subtypes(neuron_subtypes),
            ),
            ("Glia", MarkerNode::leaf(["GFAP"])),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_depth_of_leaf_only_hierarchy() {
        let h: MarkerHierarchy = [("A", MarkerNode::leaf(["g1"])), ("B", MarkerNode::leaf(["g2"]))]
            .into_iter()
            .collect();
        assert_eq!(h.depth(), 1);
    }

    #[test]
    fn test_depth_of_nested_hierarchy() {
        assert_eq!(brain().depth(), 3);
    }

    #[test]
    fn test_depth_of_empty_hierarchy() {
        assert_eq!(MarkerHierarchy::new().depth(), 0);
    }

    #[test]
    fn test_empty_subtypes_count_as_one_level() {
        let h: MarkerHierarchy = [(
            "A",
            MarkerNode::leaf(["g1"]).with_subtypes(MarkerHierarchy::new()),
        )]
        .into_iter()
        .collect();
        assert_eq!(h.depth(), 1);
    }

    #[test]
    fn test_levels_flatten_across_parents() {
        let h = brain();
        let names = |level: usize| {
            h.level(level)
                .into_iter()
                .map(|(n, _)| n)
                .collect::<Vec<_>>()
        };
        assert_eq!(names(0), vec!["Neuron", "Glia"]);
        assert_eq!(names(1), vec!["Excitatory", "Inhibitory"]);
        assert_eq!(names(2), vec!["Cortical"]);
        assert!(names(3).is_empty());
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut h = brain();
        let old = h.insert("Neuron", MarkerNode::leaf(["RBFOX3"]));
        assert!(old.is_some());
        assert_eq!(h.names().collect::<Vec<_>>(), vec!["Neuron", "Glia"]);
        assert_eq!(h.depth(), 1);
    }

    #[test]
    fn test_many_cell_types_keep_order_and_lookup() {
        let mut h: MarkerHierarchy = (0..10_000)
            .map(|i| (format!("type{i}"), MarkerNode::leaf([format!("g{i}")])))
            .collect();
        assert_eq!(h.len(), 10_000);
        assert_eq!(h.get("type9999").unwrap().marker_genes, vec!["g9999"]);
        assert!(h.get("type10000").is_none());

        h.insert("type5000", MarkerNode::leaf(["replaced"]));
        assert_eq!(h.len(), 10_000);
        assert_eq!(h.names().nth(5000), Some("type5000"));
        assert_eq!(h.get("type5000").unwrap().marker_genes, vec!["replaced"]);
    }

    #[test]
    fn test_all_marker_genes_sorted_unique() {
        let mut h = brain();
        h.insert("Astro", MarkerNode::leaf(["GFAP", "AQP4"]));
        assert_eq!(
            h.all_marker_genes(),
            vec!["AQP4", "DCX", "GAD1", "GAD2", "GFAP", "SLC17A7", "STMN2", "TBR1"]
        );
    }

    #[test]
    fn test_markers_keep_declared_order() {
        let h = brain();
        let markers = h.markers();
        assert_eq!(markers[0].0, "Neuron");
        assert_eq!(markers[0].1, ["STMN2".to_string(), "DCX".to_string()]);
        assert_eq!(markers[1].0, "Glia");
    }
}
