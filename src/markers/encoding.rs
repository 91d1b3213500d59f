use std::collections::{BTreeSet, HashMap};

use ndarray::{Array2, ArrayView1};

use super::MarkerHierarchy;

/// Binary (group × gene) marker membership matrix.
///
/// Rows follow the insertion order of the input mapping, columns are the sorted union of all
/// genes. An entry is 1 if the gene is listed for the group, however often, and 0 otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMarkerMatrix {
    pub groups: Vec<String>,
    pub genes: Vec<String>,
    pub values: Array2<u8>,
}

impl BinaryMarkerMatrix {
    pub fn nrows(&self) -> usize {
        self.groups.len()
    }

    pub fn ncols(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group_index(&self, group: &str) -> Option<usize> {
        self.groups.iter().position(|g| g == group)
    }

    pub fn gene_index(&self, gene: &str) -> Option<usize> {
        self.genes.binary_search_by(|g| g.as_str().cmp(gene)).ok()
    }

    /// Membership value for one (group, gene) pair, `None` if either label is unknown
    pub fn get(&self, group: &str, gene: &str) -> Option<u8> {
        let row = self.group_index(group)?;
        let col = self.gene_index(gene)?;
        Some(self.values[[row, col]])
    }

    pub fn row(&self, group: &str) -> Option<ArrayView1<'_, u8>> {
        self.group_index(group).map(|row| self.values.row(row))
    }
}

/// Encode a `group → genes` mapping as a binary membership matrix.
///
/// Repeated genes within a group collapse to a single 1. A group listed twice is merged into one
/// row at its first position. An empty input produces a matrix with zero rows.
pub fn dict_to_binary<I, K, V, G>(groups: I) -> BinaryMarkerMatrix
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: IntoIterator<Item = G>,
    G: AsRef<str>,
{
    let mut rows: Vec<(String, Vec<String>)> = Vec::new();
    let mut row_of: HashMap<String, usize> = HashMap::new();
    for (group, genes) in groups {
        let group = group.as_ref();
        let genes = genes.into_iter().map(|g| g.as_ref().to_string());
        match row_of.get(group) {
            Some(&row) => rows[row].1.extend(genes),
            None => {
                row_of.insert(group.to_string(), rows.len());
                rows.push((group.to_string(), genes.collect()));
            }
        }
    }

    let gene_set: BTreeSet<&str> = rows
        .iter()
        .flat_map(|(_, genes)| genes.iter().map(String::as_str))
        .collect();
    let genes: Vec<String> = gene_set.into_iter().map(str::to_string).collect();
    let gene_idx: HashMap<&str, usize> = genes
        .iter()
        .enumerate()
        .map(|(i, g)| (g.as_str(), i))
        .collect();

    let mut values = Array2::<u8>::zeros((rows.len(), genes.len()));
    for (row, (_, group_genes)) in rows.iter().enumerate() {
        for gene in group_genes {
            values[[row, gene_idx[gene.as_str()]]] = 1;
        }
    }

    BinaryMarkerMatrix {
        groups: rows.into_iter().map(|(name, _)| name).collect(),
        genes,
        values,
    }
}

impl MarkerHierarchy {
    /// Binary marker matrix of this level's cell types.
    pub fn to_binary(&self) -> BinaryMarkerMatrix {
        dict_to_binary(self.markers())
    }
}
