//! Schema IR node definitions.
//!
//! [`JsonSchema`] is the canonical output tree: a JSON-Schema-shaped node
//! that serializes directly into the documents consumed by API tooling.
//! [`SchemaDocument`] bundles a root node with the named definitions and
//! relational side channel collected while building it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::config::SpecType;

/// A JSON Schema node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSchema {
    /// Pointer to a named definition
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// JSON type name ("string", "object", ...)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,

    /// Title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Object properties in declaration order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, JsonSchema>>,

    /// Required property names in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Item schema for arrays
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<JsonSchema>>,

    /// Value schema for maps, or an open/closed flag for objects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,

    /// Members that must all match
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<JsonSchema>,

    /// Members of which at least one must match
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<JsonSchema>,

    /// Members of which exactly one must match
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<JsonSchema>,

    /// Discriminator for polymorphic `oneOf`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<DiscriminatorObject>,

    /// Allowed values
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    /// Format hint ("date-time", "email", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Regular expression for strings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Inclusive lower bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,

    /// Inclusive upper bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,

    /// Exclusive lower bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Number>,

    /// Exclusive upper bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Number>,

    /// Divisor constraint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,

    /// Minimum string length
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    /// Maximum string length
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    /// Minimum number of items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,

    /// Maximum number of items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,

    /// Default value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Example value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    /// Whether null is accepted
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,

    /// Present in responses only
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,

    /// Present in requests only
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub write_only: bool,
}

impl JsonSchema {
    /// Create a schema with the given JSON type.
    pub fn of_type(schema_type: impl Into<String>) -> Self {
        Self {
            schema_type: Some(schema_type.into()),
            ..Self::default()
        }
    }

    /// Create a string schema.
    pub fn string() -> Self {
        Self::of_type("string")
    }

    /// Create a number schema.
    pub fn number() -> Self {
        Self::of_type("number")
    }

    /// Create an integer schema.
    pub fn integer() -> Self {
        Self::of_type("integer")
    }

    /// Create a boolean schema.
    pub fn boolean() -> Self {
        Self::of_type("boolean")
    }

    /// Create an object schema without properties.
    pub fn object() -> Self {
        Self::of_type("object")
    }

    /// Create an array schema.
    pub fn array(items: JsonSchema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of_type("array")
        }
    }

    /// Create a string-keyed map schema.
    pub fn map(values: JsonSchema) -> Self {
        Self {
            additional_properties: Some(AdditionalProperties::Schema(Box::new(values))),
            ..Self::object()
        }
    }

    /// Create a reference to a named definition.
    pub fn reference(pointer: impl Into<String>) -> Self {
        Self {
            reference: Some(pointer.into()),
            ..Self::default()
        }
    }

    /// Check if this node is a bare `$ref`.
    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Add a property.
    pub fn with_property(mut self, name: impl Into<String>, schema: JsonSchema) -> Self {
        self.properties
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), schema);
        self
    }

    /// Mark a property as required.
    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the format.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Serialize to a JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// `additionalProperties` keyword: a flag or a value schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// Open or closed object
    Bool(bool),
    /// Schema every extra value must match
    Schema(Box<JsonSchema>),
}

/// Discriminator object for polymorphic `oneOf` schemas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscriminatorObject {
    /// Property holding the discriminator value
    pub property_name: String,

    /// Discriminator value -> definition pointer
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub mapping: IndexMap<String, String>,
}

/// Resolution options of a virtual (data-layer) relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualRefSchema {
    /// Name of the referenced model
    #[serde(rename = "ref")]
    pub reference: String,

    /// Field on this model
    pub local_field: String,

    /// Field on the referenced model
    pub foreign_field: String,

    /// One-vs-many cardinality
    pub just_one: bool,

    /// Resolve to a count instead of documents
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub count: bool,

    /// Extra options forwarded to the data layer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

/// Result of a schema build for one root class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Root schema
    pub schema: JsonSchema,

    /// Named definitions referenced from the root, keyed by class name
    #[serde(default)]
    pub definitions: IndexMap<String, JsonSchema>,

    /// Relational properties omitted from `properties`
    #[serde(default)]
    pub virtuals: IndexMap<String, VirtualRefSchema>,

    /// Flavor the `$ref` pointers were built for
    #[serde(default)]
    pub spec_type: SpecType,
}

impl SchemaDocument {
    /// Render the root schema with `definitions` and `virtuals` inlined.
    ///
    /// Definitions land where the `$ref` pointers of `spec_type` point:
    /// `definitions` for JSON Schema and Swagger 2, `components.schemas`
    /// for OpenAPI 3.
    pub fn to_value(&self) -> Value {
        let mut value = self.schema.to_value();
        if let Value::Object(map) = &mut value {
            if !self.definitions.is_empty() {
                let definitions = serde_json::to_value(&self.definitions).unwrap_or(Value::Null);
                match self.spec_type {
                    SpecType::Json | SpecType::Swagger2 => {
                        map.insert("definitions".to_string(), definitions);
                    }
                    SpecType::OpenApi3 => {
                        let mut components = Map::new();
                        components.insert("schemas".to_string(), definitions);
                        map.insert("components".to_string(), Value::Object(components));
                    }
                }
            }
            if !self.virtuals.is_empty() {
                let virtuals = serde_json::to_value(&self.virtuals).unwrap_or(Value::Null);
                map.insert("virtuals".to_string(), virtuals);
            }
        }
        value
    }
}

/// Convert a float into a JSON number, keeping integral values integral.
pub fn json_number(value: f64) -> Option<Number> {
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value <= i64::MAX as f64 {
        Some(Number::from(value as i64))
    } else {
        Number::from_f64(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_with_properties() {
        let schema = JsonSchema::object()
            .with_property("name", JsonSchema::string())
            .with_property("age", JsonSchema::number())
            .with_required("name");

        assert_eq!(
            schema.to_value(),
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "age": {"type": "number"}
                },
                "required": ["name"]
            })
        );
    }

    #[test]
    fn test_reference_serializes_dollar_ref() {
        let schema = JsonSchema::reference("#/definitions/User");
        assert!(schema.is_reference());
        assert_eq!(schema.to_value(), json!({"$ref": "#/definitions/User"}));
    }

    #[test]
    fn test_map_schema() {
        let schema = JsonSchema::map(JsonSchema::integer());
        assert_eq!(
            schema.to_value(),
            json!({"type": "object", "additionalProperties": {"type": "integer"}})
        );
    }

    #[test]
    fn test_flags_are_omitted_when_false() {
        let mut schema = JsonSchema::string();
        assert_eq!(schema.to_value(), json!({"type": "string"}));

        schema.read_only = true;
        assert_eq!(schema.to_value(), json!({"type": "string", "readOnly": true}));
    }

    #[test]
    fn test_json_number_keeps_integers() {
        assert_eq!(json_number(150.0), Some(Number::from(150)));
        assert_eq!(json_number(0.5), Number::from_f64(0.5));
        assert_eq!(json_number(f64::NAN), None);
    }

    #[test]
    fn test_document_inlines_definitions_and_virtuals() {
        let mut doc = SchemaDocument {
            schema: JsonSchema::object(),
            ..SchemaDocument::default()
        };
        assert_eq!(doc.to_value(), json!({"type": "object"}));

        doc.definitions.insert("Child".into(), JsonSchema::object());
        doc.virtuals.insert(
            "children".into(),
            VirtualRefSchema {
                reference: "Child".into(),
                local_field: "_id".into(),
                foreign_field: "parent".into(),
                just_one: false,
                count: false,
                options: None,
            },
        );

        assert_eq!(
            doc.to_value(),
            json!({
                "type": "object",
                "definitions": {"Child": {"type": "object"}},
                "virtuals": {
                    "children": {
                        "ref": "Child",
                        "localField": "_id",
                        "foreignField": "parent",
                        "justOne": false
                    }
                }
            })
        );
    }

    #[test]
    fn test_openapi_document_nests_definitions_under_components() {
        let mut doc = SchemaDocument {
            schema: JsonSchema::object()
                .with_property("child", JsonSchema::reference("#/components/schemas/Child")),
            spec_type: SpecType::OpenApi3,
            ..SchemaDocument::default()
        };
        doc.definitions.insert("Child".into(), JsonSchema::object());

        assert_eq!(
            doc.to_value(),
            json!({
                "type": "object",
                "properties": {"child": {"$ref": "#/components/schemas/Child"}},
                "components": {"schemas": {"Child": {"type": "object"}}}
            })
        );
    }
}
