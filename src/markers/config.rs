//! Reading and writing marker hierarchies as YAML documents.
//!
//! The expected layout is one mapping per level, keyed by cell type:
//!
//! ```yaml
//! Neuron:
//!   marker_genes: [STMN2, DCX]
//!   subtypes:
//!     Excitatory:
//!       marker_genes: [SLC17A7]
//! Glia:
//!   marker_genes: [GFAP]
//! ```
//!
//! Every node must carry a `marker_genes` sequence; this is checked while parsing. A `subtypes`
//! entry that is missing, null, or not a mapping leaves the node as a leaf.

use std::path::Path;

use anyhow::Context;
use log::debug;
use serde_yaml::{Mapping, Value};

use super::{MarkerHierarchy, MarkerNode};
use crate::error::{MarkerError, Result};

const MARKER_GENES_KEY: &str = "marker_genes";
const SUBTYPES_KEY: &str = "subtypes";

/// Read a marker hierarchy from a YAML file.
pub fn read_yaml(path: impl AsRef<Path>) -> anyhow::Result<MarkerHierarchy> {
    let path = path.as_ref();
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read marker hierarchy from: {:?}", path))?;
    let hierarchy = MarkerHierarchy::from_yaml_str(&yaml)
        .with_context(|| format!("Failed to parse marker hierarchy YAML from: {:?}", path))?;

    debug!(
        "Loaded marker hierarchy from {:?}: {} top-level cell types, depth {}",
        path,
        hierarchy.len(),
        hierarchy.depth()
    );
    Ok(hierarchy)
}

impl MarkerHierarchy {
    /// Parse a hierarchy from YAML text. An empty document yields an empty hierarchy.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(MarkerHierarchy::new());
        }
        let value: Value = serde_yaml::from_str(yaml)?;
        Self::from_value(&value)
    }

    /// Build a hierarchy from an already-parsed YAML value.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(MarkerHierarchy::new()),
            other => parse_hierarchy(other, ""),
        }
    }

    /// Convert back into a YAML value, keeping insertion order.
    pub fn to_value(&self) -> Value {
        let mut mapping = Mapping::new();
        for (name, node) in self.iter() {
            let mut fields = Mapping::new();
            fields.insert(
                Value::String(MARKER_GENES_KEY.to_string()),
                Value::Sequence(
                    node.marker_genes
                        .iter()
                        .map(|g| Value::String(g.clone()))
                        .collect(),
                ),
            );
            if let Some(subtypes) = &node.subtypes {
                fields.insert(Value::String(SUBTYPES_KEY.to_string()), subtypes.to_value());
            }
            mapping.insert(Value::String(name.to_string()), Value::Mapping(fields));
        }
        Value::Mapping(mapping)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.to_value())?)
    }
}

fn parse_hierarchy(value: &Value, path: &str) -> Result<MarkerHierarchy> {
    let mapping = match value {
        Value::Mapping(mapping) => mapping,
        other => {
            return Err(MarkerError::configuration(
                path,
                format!("expected a mapping of cell types, found {}", kind(other)),
            ));
        }
    };

    let mut hierarchy = MarkerHierarchy::new();
    for (key, node) in mapping {
        let name = scalar_to_string(key).ok_or_else(|| {
            MarkerError::configuration(
                path,
                format!("cell-type names must be scalars, found {}", kind(key)),
            )
        })?;
        let node_path = if path.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", path, name)
        };
        let node = parse_node(node, &node_path)?;
        hierarchy.insert(name, node);
    }
    Ok(hierarchy)
}

fn parse_node(value: &Value, path: &str) -> Result<MarkerNode> {
    let fields = match value {
        Value::Mapping(fields) => fields,
        other => {
            return Err(MarkerError::configuration(
                path,
                format!("expected a cell-type mapping, found {}", kind(other)),
            ));
        }
    };

    let marker_genes = match fields.get(MARKER_GENES_KEY) {
        Some(Value::Sequence(genes)) => genes
            .iter()
            .enumerate()
            .map(|(i, gene)| {
                scalar_to_string(gene).ok_or_else(|| {
                    MarkerError::configuration(
                        path,
                        format!("marker gene at index {} must be a scalar, found {}", i, kind(gene)),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?,
        Some(other) => {
            return Err(MarkerError::configuration(
                path,
                format!("'{}' must be a sequence, found {}", MARKER_GENES_KEY, kind(other)),
            ));
        }
        None => {
            return Err(MarkerError::configuration(
                path,
                format!("missing required '{}'", MARKER_GENES_KEY),
            ));
        }
    };

    let subtypes = match fields.get(SUBTYPES_KEY) {
        Some(sub @ Value::Mapping(_)) => Some(parse_hierarchy(sub, path)?),
        Some(Value::Null) | None => None,
        Some(other) => {
            debug!(
                "Ignoring non-mapping '{}' ({}) at '{}'; treating it as a leaf",
                SUBTYPES_KEY,
                kind(other),
                path
            );
            None
        }
    };

    Ok(MarkerNode {
        marker_genes,
        subtypes,
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
