//! Intermediate Representation (IR) module.
//!
//! This module defines the data structures shared by the entity store, the
//! schema builder and the mapper engine: type descriptors, validation rules,
//! class/property metadata and the JSON-Schema-shaped output tree.

pub mod metadata;
pub mod schema;
pub mod types;
pub mod validation;

pub use metadata::{ClassMetadata, PropertyMetadata, VirtualRef};
pub use schema::{
    AdditionalProperties, DiscriminatorObject, JsonSchema, SchemaDocument, VirtualRefSchema,
};
pub use types::{ClassId, CollectionKind, Composition, PropertyType, TypeDescriptor};
pub use validation::ValidationRule;
