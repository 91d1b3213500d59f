use thiserror::Error;

/// Errors raised by the marker hierarchy and aggregation routines.
#[derive(Error, Debug)]
pub enum MarkerError {
    #[error("Invalid marker hierarchy at '{path}': {reason}")]
    Configuration { path: String, reason: String },

    #[error("Feature not found: {feature}")]
    FeatureNotFound { feature: String },

    #[error("Group '{group}' has no member cells")]
    EmptyGroup { group: String },

    #[error("Shape mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Index {index} out of bounds for {context} of length {len}")]
    IndexOutOfBounds {
        context: &'static str,
        index: usize,
        len: usize,
    },

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl MarkerError {
    pub(crate) fn configuration(path: &str, reason: impl Into<String>) -> Self {
        let path = if path.is_empty() { "<root>" } else { path };
        MarkerError::Configuration {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MarkerError>;
