//! # modelspec-mapper
//!
//! Convert between JSON and typed runtime values using the metadata
//! declared in a [`modelspec::EntityStore`].
//!
//! ## Overview
//!
//! The same property declarations that produce a schema drive the
//! [`JsonMapper`]: aliases rename keys, groups and `read_only`/`write_only`
//! filter properties, defaults fill absent values and constraint rules are
//! checked when validation is requested. Types are converted through a
//! pluggable [`TypeRegistry`].
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use modelspec::{EntityStore, PropertyOptions};
//! use modelspec_mapper::{DeserializeOptions, JsonMapper, MapperError};
//! use serde_json::json;
//!
//! let mut store = EntityStore::new();
//! let person = store
//!     .define("Person")
//!     .property("age", PropertyOptions::new().number().minimum(0.0))
//!     .build()
//!     .unwrap();
//!
//! let mapper = JsonMapper::new(Arc::new(store));
//! let options = DeserializeOptions::new().with_validate(true);
//!
//! let error = mapper.deserialize(&json!({"age": -1}), person, &options).unwrap_err();
//! assert!(matches!(error, MapperError::Validation { .. }));
//! assert_eq!(error.path(), Some("age"));
//! ```
//!
//! ## Conversions
//!
//! | Declared type | JSON | Runtime |
//! |---------------|------|---------|
//! | `String` | string | `Value::String` |
//! | `Number` | number | `Value::Integer` or `Value::Float` |
//! | `Integer` | integer | `Value::Integer` |
//! | `Boolean` | boolean | `Value::Bool` |
//! | `Date` | ISO-8601 string | `Value::Date` |
//! | `Symbol` | description string | fresh `Value::Symbol` |
//! | `Any` | any | untyped `Value` |
//! | `Model(id)` | object | `Value::Object` tagged with the class |
//!
//! Outside strict mode a scalar is wrapped when an array is declared and
//! primitive values are coerced when the conversion is lossless.

pub mod context;
pub mod error;
pub mod hooks;
pub mod mapper;
pub mod options;
pub mod types;
pub mod value;

mod deserializer;
mod serializer;
mod validation;

pub use context::{MappingContext, PathSegment};
pub use error::{MapperError, MapperResult};
pub use hooks::HookSet;
pub use mapper::JsonMapper;
pub use options::{AdditionalPropertiesPolicy, DeserializeOptions, SerializeOptions};
pub use types::{DateMapper, PrimitiveKind, PrimitiveMapper, SymbolMapper, TypeMapper, TypeRegistry};
pub use value::{Instance, Symbol, Value};
