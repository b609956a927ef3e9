//! # modelspec
//!
//! Compile declared data models into JSON Schema, Swagger 2 and OpenAPI 3
//! documents.
//!
//! ## Overview
//!
//! Models are registered explicitly in an [`EntityStore`]: every property
//! carries a statically declared [`TypeDescriptor`] plus the constraints
//! that would otherwise come from annotations. The [`SchemaBuilder`] walks
//! the store and produces a [`JsonSchema`] tree, emitting nested models as
//! `$ref` pointers into a shared definitions map so that cyclic models
//! build in bounded time. The [`SpecGenerator`] aggregates the schemas of
//! every operation of every controller into one document.
//!
//! The runtime (de)serializer driven by the same metadata lives in the
//! `modelspec-mapper` crate.
//!
//! ## Quick Start
//!
//! ```rust
//! use modelspec::{build_schema, EntityStore, PropertyOptions, PropertyType};
//!
//! let mut store = EntityStore::new();
//! let pet = store
//!     .define("Pet")
//!     .property("name", PropertyOptions::new().string().required())
//!     .build()
//!     .unwrap();
//! let owner = store
//!     .define("Owner")
//!     .property("pets", PropertyOptions::new().array_of(PropertyType::Model(pet)))
//!     .build()
//!     .unwrap();
//!
//! let document = build_schema(&store, owner).unwrap();
//! assert!(document.definitions.contains_key("Pet"));
//! ```
//!
//! ## Type Mappings
//!
//! | Declared type | Schema |
//! |---------------|--------|
//! | `String`, `Symbol` | `{"type": "string"}` |
//! | `Number` | `{"type": "number"}` |
//! | `Integer` | `{"type": "integer"}` |
//! | `Boolean` | `{"type": "boolean"}` |
//! | `Date` | `{"type": "string", "format": "date-time"}` |
//! | `Any` | `{}` |
//! | `Model(id)` | `{"$ref": "#/definitions/<Name>"}` |
//! | `Composite` | `allOf` / `anyOf` / `oneOf` over the members |
//! | `Discriminated(base)` | `oneOf` over the children plus `discriminator` |
//!
//! | Collection | Schema |
//! |------------|--------|
//! | `Array` | `{"type": "array", "items": ...}` |
//! | `Map` | `{"type": "object", "additionalProperties": ...}` |
//! | `Set` | rejected with [`SchemaError::UnsupportedType`] |
//!
//! ## Property Options
//!
//! | Option | Schema keyword |
//! |--------|----------------|
//! | `required()` | entry in the parent `required` |
//! | `minimum(n)` / `maximum(n)` | `minimum` / `maximum` |
//! | `exclusive_minimum(n)` / `exclusive_maximum(n)` | `exclusiveMinimum` / `exclusiveMaximum` |
//! | `multiple_of(n)` | `multipleOf` |
//! | `min_length(n)` / `max_length(n)` | `minLength` / `maxLength` |
//! | `pattern(re)` / `format(f)` | `pattern` / `format` |
//! | `enum_values(..)` | `enum` |
//! | `min_items(n)` / `max_items(n)` | `minItems` / `maxItems` |
//! | `default_value(v)` / `example(v)` | `default` / `example` |
//! | `read_only()` / `write_only()` | `readOnly` / `writeOnly` |
//! | `alias(name)` | property key |
//! | `ignore()` | property omitted |
//! | `groups(..)` | property omitted unless a group is requested |
//! | `virtual_ref(..)` | property omitted, recorded under `virtuals` |

pub mod config;
pub mod error;
pub mod generator;
pub mod ir;
pub mod merge;
pub mod store;

pub use config::{CollisionPolicy, SchemaOptions, SpecOptions, SpecType};
pub use error::{SchemaError, SchemaResult};
pub use generator::{
    build_schema, build_schema_with, build_spec, ControllerMetadata, DefinitionRegistry,
    HttpMethod, OperationMetadata, ParamLocation, ParameterMetadata, ResponseMetadata,
    SchemaBuilder, SpecDocument, SpecGenerator,
};
pub use ir::{
    AdditionalProperties, ClassId, ClassMetadata, CollectionKind, Composition,
    DiscriminatorObject, JsonSchema, PropertyMetadata, PropertyType, SchemaDocument,
    TypeDescriptor, ValidationRule, VirtualRef, VirtualRefSchema,
};
pub use merge::{deep_merge, merge_by_field, merge_reducer_by, DeepMergeOptions, MergeReducer};
pub use store::{EntityStore, ModelBuilder, PropertyOptions};
