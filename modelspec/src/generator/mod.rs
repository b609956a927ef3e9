//! Schema and document generation.
//!
//! - [`json_schema`]: compiles one class into a [`JsonSchema`](crate::ir::JsonSchema) tree
//! - [`registry`]: the shared definitions map with collision detection
//! - [`operation`]: endpoint metadata
//! - [`spec`]: Swagger 2 / OpenAPI 3 document assembly

pub mod json_schema;
pub mod operation;
pub mod registry;
pub mod spec;

pub use json_schema::{build_schema, build_schema_with, SchemaBuilder};
pub use operation::{
    ControllerMetadata, HttpMethod, OperationMetadata, ParamLocation, ParameterMetadata,
    ResponseMetadata,
};
pub use registry::DefinitionRegistry;
pub use spec::{
    build_spec, SpecComponents, SpecDocument, SpecGenerator, SpecInfo, SpecMediaType,
    SpecOperation, SpecParameter, SpecRequestBody, SpecResponse, SpecTag,
};
