//! Per-level cell-type assignments combined into one table.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

/// Class assigned to one group at one hierarchy level, with the expression that supported it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelAssignment {
    pub group: String,
    pub class: String,
    pub expr: f64,
}

impl LevelAssignment {
    pub fn new(group: impl Into<String>, class: impl Into<String>, expr: f64) -> Self {
        LevelAssignment {
            group: group.into(),
            class: class.into(),
            expr,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationOptions {
    /// Assignments with `expr` at or below this are dropped; 0 disables the filter
    pub min_expr: f64,
}

impl Default for AnnotationOptions {
    fn default() -> Self {
        AnnotationOptions { min_expr: 0.1 }
    }
}

/// Groups × levels table of assigned classes. A cell is `None` when the group has no (valid)
/// assignment at that level.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotationTable {
    levels: Vec<String>,
    groups: Vec<String>,
    classes: Vec<Vec<Option<String>>>,
}

impl AnnotationTable {
    /// Outer-join the assignments of every level on the group name.
    ///
    /// Columns follow the level order, rows the order in which groups first appear.
    pub fn from_levels<I, K, V>(levels: I, options: &AnnotationOptions) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: ToString,
        V: IntoIterator<Item = LevelAssignment>,
    {
        let mut table = AnnotationTable::default();
        let mut row_of: HashMap<String, usize> = HashMap::new();

        for (level, assignments) in levels {
            let col = table.levels.len();
            table.levels.push(level.to_string());
            for row in &mut table.classes {
                row.push(None);
            }

            for a in assignments {
                if options.min_expr > 0.0 && !(a.expr > options.min_expr) {
                    continue;
                }
                let row = match row_of.get(&a.group) {
                    Some(&row) => row,
                    None => {
                        table.groups.push(a.group.clone());
                        table.classes.push(vec![None; col + 1]);
                        row_of.insert(a.group.clone(), table.groups.len() - 1);
                        table.groups.len() - 1
                    }
                };
                let cell = &mut table.classes[row][col];
                if cell.is_some() {
                    debug!(
                        "Group '{}' assigned twice at level '{}'; keeping the first",
                        a.group, table.levels[col]
                    );
                    continue;
                }
                *cell = Some(a.class);
            }
        }
        table
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn n_rows(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn row_index(&self, group: &str) -> Option<usize> {
        self.groups.iter().position(|g| g == group)
    }

    pub fn row(&self, group: &str) -> Option<&[Option<String>]> {
        self.row_index(group).map(|r| self.classes[r].as_slice())
    }

    pub fn get(&self, group: &str, level: &str) -> Option<&str> {
        let row = self.row_index(group)?;
        let col = self.levels.iter().position(|l| l == level)?;
        self.classes[row][col].as_deref()
    }

    pub fn column(&self, level: &str) -> Option<Vec<Option<&str>>> {
        let col = self.levels.iter().position(|l| l == level)?;
        Some(self.classes.iter().map(|row| row[col].as_deref()).collect())
    }

    /// Deepest level with an assignment for `group`.
    pub fn finest(&self, group: &str) -> Option<&str> {
        self.row(group)?.iter().rev().find_map(|c| c.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn levels() -> Vec<(usize, Vec<LevelAssignment>)> {
        vec![
            (
                1,
                vec![
                    LevelAssignment::new("c1", "Neuron", 2.0),
                    LevelAssignment::new("c2", "Glia", 0.05),
                    LevelAssignment::new("c3", "Neuron", 1.0),
                ],
            ),
            (
                2,
                vec![
                    LevelAssignment::new("c1", "Excitatory", 0.8),
                    LevelAssignment::new("c3", "Inhibitory", 0.1),
                    LevelAssignment::new("c4", "Astrocyte", 0.5),
                ],
            ),
        ]
    }

    #[test]
    fn test_filter_and_outer_join() {
        let table = AnnotationTable::from_levels(levels(), &AnnotationOptions::default());
        assert_eq!(table.levels(), ["1", "2"]);
        assert_eq!(table.groups(), ["c1", "c3", "c4"]);
        assert_eq!(table.n_rows(), 3);
        assert!(!table.is_empty());
        assert_eq!(table.get("c1", "2"), Some("Excitatory"));
        assert_eq!(table.get("c3", "2"), None);
        assert_eq!(table.column("1").unwrap(), vec![Some("Neuron"), Some("Neuron"), None]);
        assert_eq!(table.finest("c1"), Some("Excitatory"));
        assert_eq!(table.finest("c3"), Some("Neuron"));
        assert_eq!(table.finest("c2"), None);
    }

    #[test]
    fn test_everything_filtered_out() {
        let table = AnnotationTable::from_levels(
            vec![("1", vec![LevelAssignment::new("c1", "Neuron", 0.01)])],
            &AnnotationOptions::default(),
        );
        assert!(table.is_empty());
        assert_eq!(table.n_rows(), 0);
        assert_eq!(table.levels(), ["1"]);
        assert_eq!(table.column("1").unwrap(), Vec::<Option<&str>>::new());
    }

    #[test]
    fn test_zero_min_expr_keeps_everything() {
        let table = AnnotationTable::from_levels(levels(), &AnnotationOptions { min_expr: 0.0 });
        assert_eq!(table.groups(), ["c1", "c2", "c3", "c4"]);
        assert_eq!(table.get("c2", "1"), Some("Glia"));
        assert_eq!(table.get("c3", "2"), Some("Inhibitory"));
        assert_eq!(table.row("c4").unwrap(), [None, Some("Astrocyte".to_string())]);
    }
}
