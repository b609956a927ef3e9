//! Spec generator: aggregates controllers into a Swagger 2 or OpenAPI 3
//! document.
//!
//! Every model reachable from a parameter or response is compiled once into
//! the shared definitions map (`definitions` or `components.schemas`).

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use super::json_schema::{locate, SchemaBuilder};
use super::operation::{ControllerMetadata, OperationMetadata, ParamLocation, ParameterMetadata};
use crate::config::{SpecOptions, SpecType};
use crate::error::{SchemaError, SchemaResult};
use crate::ir::JsonSchema;
use crate::merge::{deep_merge, merge_by_field, merge_reducer_by, DeepMergeOptions};
use crate::store::EntityStore;

const JSON_MEDIA_TYPE: &str = "application/json";
const SWAGGER_VERSION: &str = "2.0";
const OPENAPI_VERSION: &str = "3.0.1";

// ============================================================================
// Document Types
// ============================================================================

/// Generated API document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swagger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openapi: Option<String>,
    pub info: SpecInfo,
    pub paths: IndexMap<String, IndexMap<String, SpecOperation>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub definitions: IndexMap<String, JsonSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<SpecComponents>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<SpecTag>,
}

impl SpecDocument {
    /// Serialize to a JSON value.
    pub fn to_value(&self) -> SchemaResult<Value> {
        serde_json::to_value(self)
            .map_err(|err| SchemaError::invalid("document", "*", err.to_string()))
    }

    /// Named model schemas, wherever the flavor stores them.
    pub fn schemas(&self) -> &IndexMap<String, JsonSchema> {
        match &self.components {
            Some(components) => &components.schemas,
            None => &self.definitions,
        }
    }
}

/// `info` object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecInfo {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `components` object (OpenAPI 3).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpecComponents {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, JsonSchema>,
}

/// Top-level tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecTag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Operation object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecOperation {
    pub operation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,
    pub parameters: Vec<SpecParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<SpecRequestBody>,
    pub responses: IndexMap<String, SpecResponse>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

/// Parameter object.
///
/// OpenAPI 3 nests the type under `schema`. Swagger 2 inlines primitive
/// keywords next to `name`/`in` and only uses `schema` for bodies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecParameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<JsonSchema>,
    #[serde(flatten)]
    pub inline: Option<JsonSchema>,
}

/// Request body object (OpenAPI 3).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecRequestBody {
    pub content: IndexMap<String, SpecMediaType>,
    pub required: bool,
}

/// Media type object (OpenAPI 3).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecMediaType {
    pub schema: JsonSchema,
}

/// Response object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecResponse {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<JsonSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, SpecMediaType>>,
}

// ============================================================================
// Generator
// ============================================================================

/// Builds API documents from controller metadata.
pub struct SpecGenerator<'a> {
    store: &'a EntityStore,
    options: SpecOptions,
}

impl<'a> SpecGenerator<'a> {
    /// Create a generator.
    pub fn new(store: &'a EntityStore, options: SpecOptions) -> Self {
        Self { store, options }
    }

    /// Build the typed document.
    pub fn build(&self, controllers: &[ControllerMetadata]) -> SchemaResult<SpecDocument> {
        self.options
            .validate()
            .map_err(|message| SchemaError::invalid("SpecOptions", "*", message))?;

        let spec_type = self.options.spec_type;
        let mut builder = SchemaBuilder::new(self.store, self.options.schema_options());
        let mut paths: IndexMap<String, IndexMap<String, SpecOperation>> = IndexMap::new();
        let mut tags: Vec<SpecTag> = Vec::new();

        for controller in controllers {
            for operation in &controller.operations {
                let path = convert_path(&join_paths(&controller.path, &operation.path));
                trace!(
                    controller = %controller.name,
                    method = %operation.method,
                    path = %path,
                    "Building operation"
                );

                let spec_operation = self.operation(&mut builder, controller, operation)?;
                for tag in &spec_operation.tags {
                    if !tags.iter().any(|t| &t.name == tag) {
                        let description = (tag == &controller.name)
                            .then(|| controller.description.clone())
                            .flatten();
                        tags.push(SpecTag {
                            name: tag.clone(),
                            description,
                        });
                    }
                }

                paths
                    .entry(path)
                    .or_default()
                    .insert(operation.method.as_str().to_string(), spec_operation);
            }
        }

        let (schemas, _) = builder.finish();
        debug!(
            paths = paths.len(),
            schemas = schemas.len(),
            tags = tags.len(),
            "Spec build complete"
        );

        let info = SpecInfo {
            title: self.options.title.clone(),
            version: self.options.version.clone(),
            description: self.options.description.clone(),
        };

        Ok(match spec_type {
            SpecType::OpenApi3 => SpecDocument {
                swagger: None,
                openapi: Some(OPENAPI_VERSION.to_string()),
                info,
                paths,
                definitions: IndexMap::new(),
                components: Some(SpecComponents { schemas }),
                tags,
            },
            SpecType::Swagger2 | SpecType::Json => SpecDocument {
                swagger: Some(SWAGGER_VERSION.to_string()),
                openapi: None,
                info,
                paths,
                definitions: schemas,
                components: None,
                tags,
            },
        })
    }

    /// Build the document and merge it over the configured base document.
    pub fn build_value(&self, controllers: &[ControllerMetadata]) -> SchemaResult<Value> {
        let generated = self.build(controllers)?.to_value()?;
        Ok(match &self.options.base {
            Some(base) => deep_merge(base, &generated, &document_merge_options()),
            None => generated,
        })
    }

    fn operation(
        &self,
        builder: &mut SchemaBuilder<'_>,
        controller: &ControllerMetadata,
        operation: &OperationMetadata,
    ) -> SchemaResult<SpecOperation> {
        let spec_type = self.options.spec_type;
        let swagger = spec_type != SpecType::OpenApi3;

        let mut parameters = Vec::new();
        let mut request_body = None;
        for parameter in &operation.parameters {
            let schema = builder
                .descriptor_schema(&parameter.descriptor, &parameter.rules)
                .map_err(|err| locate(err, &controller.name, &parameter.name))?;

            if parameter.location == ParamLocation::Body {
                if swagger {
                    parameters.push(SpecParameter {
                        name: parameter.name.clone(),
                        location: ParamLocation::Body.as_str().to_string(),
                        required: parameter.required,
                        description: parameter.description.clone(),
                        schema: Some(schema),
                        inline: None,
                    });
                } else {
                    request_body = Some(SpecRequestBody {
                        content: json_content(schema),
                        required: parameter.required,
                    });
                }
                continue;
            }

            parameters.push(build_parameter(parameter, schema, swagger));
        }

        let mut responses = IndexMap::new();
        for (status, response) in &operation.responses {
            let schema = match &response.descriptor {
                Some(descriptor) => Some(
                    builder
                        .descriptor_schema(descriptor, &[])
                        .map_err(|err| locate(err, &controller.name, &operation.handler))?,
                ),
                None => None,
            };
            let (schema, content) = match (schema, swagger) {
                (Some(schema), true) => (Some(schema), None),
                (Some(schema), false) => (None, Some(json_content(schema))),
                (None, _) => (None, None),
            };
            responses.insert(
                status.to_string(),
                SpecResponse {
                    description: response.description.clone(),
                    schema,
                    content,
                },
            );
        }
        if responses.is_empty() {
            responses.insert(
                "200".to_string(),
                SpecResponse {
                    description: "Success".to_string(),
                    schema: None,
                    content: None,
                },
            );
        }

        let media = if swagger {
            vec![JSON_MEDIA_TYPE.to_string()]
        } else {
            Vec::new()
        };

        Ok(SpecOperation {
            operation_id: operation
                .operation_id
                .clone()
                .unwrap_or_else(|| operation_id(&controller.name, &operation.handler)),
            summary: operation.summary.clone(),
            description: operation.description.clone(),
            consumes: media.clone(),
            produces: media,
            parameters,
            request_body,
            responses,
            tags: if operation.tags.is_empty() {
                vec![controller.name.clone()]
            } else {
                operation.tags.clone()
            },
            deprecated: operation.deprecated,
        })
    }
}

/// Build a document with the given options and return it as JSON.
pub fn build_spec(
    store: &EntityStore,
    controllers: &[ControllerMetadata],
    options: SpecOptions,
) -> SchemaResult<Value> {
    SpecGenerator::new(store, options).build_value(controllers)
}

// ============================================================================
// Helpers
// ============================================================================

fn build_parameter(parameter: &ParameterMetadata, schema: JsonSchema, swagger: bool) -> SpecParameter {
    let mut spec = SpecParameter {
        name: parameter.name.clone(),
        location: parameter.location.as_str().to_string(),
        required: parameter.required,
        description: parameter.description.clone(),
        schema: None,
        inline: None,
    };
    if swagger && !schema.is_reference() {
        let mut inline = schema;
        if spec.description.is_none() {
            spec.description = inline.description.take();
        } else {
            inline.description = None;
        }
        spec.inline = Some(inline);
    } else {
        spec.schema = Some(schema);
    }
    spec
}

fn json_content(schema: JsonSchema) -> IndexMap<String, SpecMediaType> {
    let mut content = IndexMap::new();
    content.insert(JSON_MEDIA_TYPE.to_string(), SpecMediaType { schema });
    content
}

fn document_merge_options() -> DeepMergeOptions {
    DeepMergeOptions::new()
        .with_reducer("tags", merge_by_field("name"))
        .with_reducer(
            "parameters",
            merge_reducer_by(|a, b| a.get("name") == b.get("name") && a.get("in") == b.get("in")),
        )
}

/// Join a controller base path and an operation path.
pub fn join_paths(base: &str, path: &str) -> String {
    let joined = format!(
        "/{}/{}",
        base.trim_matches('/'),
        path.trim_matches('/')
    );
    let segments: Vec<&str> = joined.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// Convert express-style parameters (`/:id`) into templated ones (`/{id}`).
pub fn convert_path(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => format!("{{{}}}", name.trim_end_matches('?')),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Default operation id: lower camel controller name plus upper camel handler.
pub fn operation_id(controller: &str, handler: &str) -> String {
    format!("{}{}", camel_case(controller, false), camel_case(handler, true))
}

fn camel_case(input: &str, upper_first: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for (index, word) in input
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if index == 0 && !upper_first {
                out.extend(first.to_lowercase());
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::operation::{HttpMethod, ResponseMetadata};
    use crate::ir::PropertyType;
    use crate::store::PropertyOptions;
    use serde_json::json;

    #[test]
    fn test_operation_id() {
        assert_eq!(operation_id("MyController", "get"), "myControllerGet");
        assert_eq!(operation_id("UsersCtrl", "find_by_id"), "usersCtrlFindById");
    }

    #[test]
    fn test_paths() {
        assert_eq!(join_paths("/", "/"), "/");
        assert_eq!(join_paths("/users", "/"), "/users");
        assert_eq!(join_paths("/users/", ":id"), "/users/:id");
        assert_eq!(convert_path("/users/:id/pets/:petId?"), "/users/{id}/pets/{petId}");
    }

    #[test]
    fn test_swagger_inline_parameters() {
        let store = EntityStore::new();
        let controller = ControllerMetadata::new("Users", "/users").with_operation(
            OperationMetadata::new(HttpMethod::Get, "/:id", "get")
                .with_parameter(
                    ParameterMetadata::path("id", PropertyType::String)
                        .with_description("User id"),
                )
                .with_parameter(ParameterMetadata::query("limit", PropertyType::Integer)),
        );

        let options = SpecOptions::new("Users", "1.0.0").with_spec_type(SpecType::Swagger2);
        let document = SpecGenerator::new(&store, options)
            .build(&[controller])
            .unwrap()
            .to_value()
            .unwrap();

        assert_eq!(document["swagger"], json!("2.0"));
        assert_eq!(
            document["paths"]["/users/{id}"]["get"],
            json!({
                "operationId": "usersGet",
                "consumes": ["application/json"],
                "produces": ["application/json"],
                "parameters": [
                    {"name": "id", "in": "path", "required": true, "description": "User id", "type": "string"},
                    {"name": "limit", "in": "query", "required": false, "type": "integer"}
                ],
                "responses": {"200": {"description": "Success"}},
                "tags": ["Users"]
            })
        );
    }

    #[test]
    fn test_openapi_response_content() {
        let mut store = EntityStore::new();
        let user = store
            .define("User")
            .property("id", PropertyOptions::new().string())
            .build()
            .unwrap();
        let controller = ControllerMetadata::new("Users", "/users").with_operation(
            OperationMetadata::new(HttpMethod::Get, "/", "list").with_response(
                200,
                ResponseMetadata::with_body("Users", crate::ir::TypeDescriptor::array(PropertyType::Model(user))),
            ),
        );

        let document = SpecGenerator::new(&store, SpecOptions::default())
            .build(&[controller])
            .unwrap();
        assert_eq!(document.schemas().len(), 1);

        let value = document.to_value().unwrap();
        assert_eq!(
            value["paths"]["/users"]["get"]["responses"],
            json!({
                "200": {
                    "description": "Users",
                    "content": {
                        "application/json": {
                            "schema": {"type": "array", "items": {"$ref": "#/components/schemas/User"}}
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_invalid_options() {
        let store = EntityStore::new();
        let options = SpecOptions::default().with_spec_type(SpecType::Json);
        assert!(SpecGenerator::new(&store, options).build(&[]).is_err());
    }
}
