//! Class and property metadata.
//!
//! These are the shapes collected by the entity store. A [`ClassMetadata`]
//! returned from the store is the merged view over the inheritance chain
//! and is shared immutably once built.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{ClassId, TypeDescriptor};
use super::validation::ValidationRule;

/// Metadata of a single declared property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyMetadata {
    /// Property key on the model
    pub key: String,

    /// Custom wire name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Declared type
    #[serde(default)]
    pub descriptor: TypeDescriptor,

    /// Whether the property must be present
    #[serde(default)]
    pub required: bool,

    /// Whether null is an accepted value
    #[serde(default)]
    pub nullable: bool,

    /// Validation constraints, one per keyword
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<ValidationRule>,

    /// Default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Example value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    /// Title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Excluded from schemas and from both mapping directions
    #[serde(default)]
    pub ignore: bool,

    /// Only present in outgoing payloads
    #[serde(default)]
    pub read_only: bool,

    /// Only present in incoming payloads
    #[serde(default)]
    pub write_only: bool,

    /// Groups the property belongs to; empty means every group
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,

    /// Relation resolved by the data layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_ref: Option<VirtualRef>,
}

impl PropertyMetadata {
    /// Create metadata for a property of the given type.
    pub fn new(key: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        Self {
            key: key.into(),
            alias: None,
            descriptor,
            required: false,
            nullable: false,
            rules: Vec::new(),
            default: None,
            example: None,
            title: None,
            description: None,
            ignore: false,
            read_only: false,
            write_only: false,
            groups: Vec::new(),
            virtual_ref: None,
        }
    }

    /// Key used on the wire.
    pub fn schema_key(&self, use_alias: bool) -> &str {
        match (&self.alias, use_alias) {
            (Some(alias), true) => alias,
            _ => &self.key,
        }
    }

    /// Check if the property is visible for the requested groups.
    ///
    /// Untagged properties are always visible. Tagged properties are only
    /// visible when one of their groups is requested.
    pub fn matches_groups(&self, requested: Option<&[String]>) -> bool {
        if self.groups.is_empty() {
            return true;
        }
        match requested {
            Some(requested) => self.groups.iter().any(|g| requested.contains(g)),
            None => false,
        }
    }

    /// Check if the property is a data-layer relation.
    pub fn is_virtual(&self) -> bool {
        self.virtual_ref.is_some()
    }
}

/// Data-layer relation declared on a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualRef {
    /// Referenced model
    pub target: ClassId,

    /// Field on the declaring model
    pub local_field: String,

    /// Field on the referenced model
    pub foreign_field: String,

    /// Single document rather than a list
    pub just_one: bool,

    /// Resolve to a count
    #[serde(default)]
    pub count: bool,

    /// Extra options forwarded untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

impl VirtualRef {
    /// Relation joining `_id` on the declaring model to `foreign_field` on `target`.
    pub fn new(target: ClassId, foreign_field: impl Into<String>) -> Self {
        Self {
            target,
            local_field: "_id".to_string(),
            foreign_field: foreign_field.into(),
            just_one: true,
            count: false,
            options: None,
        }
    }

    /// Set the local field.
    #[must_use = "This method returns a new VirtualRef and does not modify self"]
    pub fn with_local_field(mut self, field: impl Into<String>) -> Self {
        self.local_field = field.into();
        self
    }

    /// Resolve to a list of documents.
    #[must_use = "This method returns a new VirtualRef and does not modify self"]
    pub fn many(mut self) -> Self {
        self.just_one = false;
        self
    }

    /// Resolve to a count.
    #[must_use = "This method returns a new VirtualRef and does not modify self"]
    pub fn count(mut self) -> Self {
        self.count = true;
        self
    }

    /// Attach data-layer options.
    #[must_use = "This method returns a new VirtualRef and does not modify self"]
    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }
}

/// Merged metadata of a class over its inheritance chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassMetadata {
    /// Class identity
    pub id: ClassId,

    /// Class name, used as definition key
    pub name: String,

    /// Direct parent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ClassId>,

    /// Title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Properties, parent-first
    pub properties: IndexMap<String, PropertyMetadata>,

    /// Discriminator property, inherited from the nearest ancestor declaring it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator_key: Option<String>,

    /// Discriminator value identifying this class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator_value: Option<String>,

    /// Whether unknown keys are part of the shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,
}

impl ClassMetadata {
    /// Look up a property by model key.
    pub fn property(&self, key: &str) -> Option<&PropertyMetadata> {
        self.properties.get(key)
    }

    /// Look up a property by wire key.
    pub fn property_by_schema_key(&self, name: &str, use_alias: bool) -> Option<&PropertyMetadata> {
        self.properties
            .values()
            .find(|p| p.schema_key(use_alias) == name)
    }

    /// Properties that carry a schema representation, in declaration order.
    pub fn schema_properties(&self) -> impl Iterator<Item = &PropertyMetadata> {
        self.properties.values().filter(|p| !p.ignore)
    }
}
