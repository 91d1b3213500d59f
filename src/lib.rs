//! # single-markers
//!
//! Hierarchical marker-gene dictionaries and masked group statistics for cell-type annotation of
//! single-cell data, part of the single-rust ecosystem.
//!
//! Annotation walks a nested cell-type → marker-gene hierarchy level by level. At each level the
//! expression of the marker genes is summarised per group of cells (per cluster, or per
//! candidate class), and those summaries are what downstream scoring uses to assign labels.
//!
//! ## Core Features
//!
//! - **Marker hierarchies**: YAML-backed nested dictionaries with eager validation, depth and
//!   per-level traversal
//! - **Binary marker encoding**: group × gene membership matrices
//! - **Feature matching**: name → column resolution against a feature universe
//! - **Masked aggregation**: per-group max, mean and expressed fraction over overlapping boolean
//!   masks, parallelised across groups
//! - **Reporting**: long-format records and multi-level annotation tables
//!
//! ## Quick Start
//!
//! ```rust
//! use ndarray::array;
//! use single_markers::aggregation::GroupMasks;
//! use single_markers::expression::get_expr;
//! use single_markers::markers::MarkerHierarchy;
//! use single_markers::reporting::to_long;
//!
//! let hierarchy = MarkerHierarchy::from_yaml_str(
//!     "T cell:\n  marker_genes: [CD3E]\nB cell:\n  marker_genes: [MS4A1]\n",
//! )
//! .unwrap();
//! let genes = hierarchy.all_marker_genes();
//!
//! // 3 cells x 3 genes
//! let counts = array![[1.0, 0.0, 4.0], [2.0, 0.0, 0.0], [0.0, 3.0, 1.0]];
//! let var_names = ["CD3E", "MS4A1", "ACTB"];
//! let (expr, features) = get_expr(&counts, &var_names, Some(genes.as_slice())).unwrap();
//!
//! let clusters = GroupMasks::from_labels(&["0", "0", "1"]);
//! let mean = clusters.mean(expr.view()).unwrap();
//! let records = to_long(mean.view(), clusters.groups(), &features).unwrap();
//! assert_eq!(records.len(), 4);
//! ```
//!
//! ## Module Organization
//!
//! - **[`markers`]**: Marker hierarchy model, YAML configuration and binary encoding
//! - **[`expression`]**: Densification of dense/sparse matrices and feature matching
//! - **[`aggregation`]**: Masked per-group statistics
//! - **[`reporting`]**: Long-format records and annotation tables

pub mod aggregation;
pub mod error;
pub mod expression;
pub mod markers;
pub mod reporting;

pub use error::{MarkerError, Result};
