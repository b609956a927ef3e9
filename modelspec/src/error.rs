//! Error types for metadata registration and schema generation.
//!
//! Every error in this crate is fatal for the call that raised it: a
//! malformed model declaration cannot be repaired by retrying, so callers
//! are expected to surface these errors immediately.
//!
//! # Example
//! ```rust
//! use modelspec::{CollectionKind, EntityStore, PropertyOptions, SchemaError};
//!
//! let mut store = EntityStore::new();
//! let tags = store.register_class("Tags");
//! let err = store
//!     .register_property(tags, "values", PropertyOptions::new().string().collection(CollectionKind::Set))
//!     .unwrap_err();
//! assert!(matches!(err, SchemaError::UnsupportedType { .. }));
//! ```

use thiserror::Error;

use crate::ir::ClassId;

/// Errors raised by the entity store, the schema builder and the spec generator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// The declared type has no schema representation (e.g. a Set collection).
    #[error("Unsupported type: {container} is not supported for property '{property}' of class '{class}'")]
    UnsupportedType {
        /// Name of the unsupported container kind
        container: String,
        /// Class declaring the property
        class: String,
        /// Property key
        property: String,
    },

    /// Two distinct classes share the same schema name.
    #[error("Schema collision: two distinct classes are named '{name}'")]
    SchemaCollision {
        /// The colliding definition name
        name: String,
    },

    /// The class identifier was never registered in the store.
    #[error("Unknown class: {0}")]
    UnknownClass(ClassId),

    /// A class (transitively) extends itself.
    #[error("Inheritance cycle detected for class '{class}'")]
    InheritanceCycle {
        /// Class at which the cycle was detected
        class: String,
    },

    /// The metadata declared for a class or property is malformed.
    #[error("Invalid metadata on '{class}.{property}': {message}")]
    InvalidMetadata {
        /// Class declaring the metadata
        class: String,
        /// Property key, or `*` for class-level metadata
        property: String,
        /// Human-readable reason
        message: String,
    },
}

impl SchemaError {
    /// Create an `UnsupportedType` error.
    pub fn unsupported(
        container: impl Into<String>,
        class: impl Into<String>,
        property: impl Into<String>,
    ) -> Self {
        Self::UnsupportedType {
            container: container.into(),
            class: class.into(),
            property: property.into(),
        }
    }

    /// Create an `InvalidMetadata` error.
    pub fn invalid(
        class: impl Into<String>,
        property: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidMetadata {
            class: class.into(),
            property: property.into(),
            message: message.into(),
        }
    }
}

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;
