//! Error types for the mapper engine.
//!
//! Every runtime error carries the dotted JSON path of the value that
//! caused it (for example `address.lines[2]`). Errors raised deep in a
//! recursive traversal propagate upward unchanged.
//!
//! # Example
//! ```rust
//! use modelspec_mapper::MapperError;
//!
//! let error = MapperError::cast("age", "Number", "\"abc\"");
//! assert_eq!(error.path(), Some("age"));
//! assert_eq!(error.to_string(), "Cannot cast \"abc\" to Number at 'age'");
//! ```

use modelspec::SchemaError;
use thiserror::Error;

/// Errors raised while serializing or deserializing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapperError {
    /// The input does not have the structure the declared type expects.
    /// Only raised in strict mode; otherwise the engine coerces.
    #[error("Shape mismatch at '{path}': expected {expected}, found {found}")]
    ShapeMismatch {
        /// Location of the offending value
        path: String,
        /// Expected shape
        expected: String,
        /// Actual shape
        found: String,
    },

    /// The value cannot be converted into the declared type.
    #[error("Cannot cast {value} to {target} at '{path}'")]
    Cast {
        /// Location of the offending value
        path: String,
        /// Target type name
        target: String,
        /// Rendered input value
        value: String,
    },

    /// A required property is missing or a constraint is violated.
    #[error("Validation failed at '{path}': {message}")]
    Validation {
        /// Location of the offending value
        path: String,
        /// Human-readable reason
        message: String,
    },

    /// The input carries a key the class does not declare.
    #[error("Unknown property '{property}' at '{path}'")]
    UnknownProperty {
        /// Location of the object holding the key
        path: String,
        /// The unexpected key
        property: String,
    },

    /// A lifecycle hook rejected the value.
    #[error("Hook failed at '{path}': {message}")]
    Hook {
        /// Location of the hooked value
        path: String,
        /// Message returned by the hook
        message: String,
    },

    /// Class metadata could not be resolved.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl MapperError {
    /// Create a `ShapeMismatch` error.
    pub fn shape(path: impl Into<String>, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            path: path.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a `Cast` error.
    pub fn cast(path: impl Into<String>, target: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Cast {
            path: path.into(),
            target: target.into(),
            value: value.into(),
        }
    }

    /// Create a `Validation` error.
    pub fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a `Hook` error.
    pub fn hook(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Location of the offending value, if the error has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::ShapeMismatch { path, .. }
            | Self::Cast { path, .. }
            | Self::Validation { path, .. }
            | Self::UnknownProperty { path, .. }
            | Self::Hook { path, .. } => Some(path),
            Self::Schema(_) => None,
        }
    }
}

/// Result type for mapper operations.
pub type MapperResult<T> = Result<T, MapperError>;
