//! Schema builder: compiles class metadata into [`JsonSchema`] trees.
//!
//! Nested models are emitted as `$ref` pointers into a shared definitions
//! map. A class is marked in progress before its body is built, so a
//! reference back to it (directly or through a longer cycle) resolves to a
//! pointer instead of recursing.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, trace};

use super::registry::DefinitionRegistry;
use crate::config::SchemaOptions;
use crate::error::{SchemaError, SchemaResult};
use crate::ir::{
    AdditionalProperties, ClassId, ClassMetadata, CollectionKind, Composition,
    DiscriminatorObject, JsonSchema, PropertyMetadata, PropertyType, SchemaDocument,
    TypeDescriptor, ValidationRule, VirtualRefSchema,
};
use crate::store::EntityStore;

/// Stateful builder shared by every schema of one document.
pub struct SchemaBuilder<'a> {
    store: &'a EntityStore,
    options: SchemaOptions,
    registry: DefinitionRegistry,
    root: Option<ClassId>,
    root_body: Option<JsonSchema>,
    in_progress: HashSet<ClassId>,
    built: HashSet<ClassId>,
    referenced: HashSet<ClassId>,
    virtuals: IndexMap<String, VirtualRefSchema>,
}

impl<'a> SchemaBuilder<'a> {
    /// Create a builder reading from `store`.
    pub fn new(store: &'a EntityStore, options: SchemaOptions) -> Self {
        let registry = DefinitionRegistry::new(options.collision);
        Self {
            store,
            options,
            registry,
            root: None,
            root_body: None,
            in_progress: HashSet::new(),
            built: HashSet::new(),
            referenced: HashSet::new(),
            virtuals: IndexMap::new(),
        }
    }

    /// Options in use.
    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    /// Build the schema of a class inline.
    ///
    /// The class itself only lands in the definitions map if one of its
    /// descendants refers back to it. Virtual properties of this class are
    /// collected into the side channel.
    pub fn build_root(&mut self, class: ClassId) -> SchemaResult<JsonSchema> {
        let meta = self.store.class_metadata(class)?;
        self.registry.claim(&meta.name, class)?;

        self.root = Some(class);
        self.in_progress.insert(class);
        let body = self.build_object(&meta)?;
        self.in_progress.remove(&class);
        self.built.insert(class);

        if self.referenced.contains(&class) {
            trace!(class = %meta.name, "Root class is self-referenced, adding definition");
            self.registry.define(&meta.name, body.clone());
        }
        self.root_body = Some(body.clone());
        Ok(body)
    }

    /// Ensure `class` is in the definitions map and return a pointer to it.
    pub fn model_ref(&mut self, class: ClassId) -> SchemaResult<JsonSchema> {
        let meta = self.store.class_metadata(class)?;
        let pointer = self.options.spec_type.ref_pointer(&meta.name);

        if self.in_progress.contains(&class) || self.built.contains(&class) {
            self.referenced.insert(class);
            if !self.registry.contains(&meta.name) {
                let body = match &self.root_body {
                    Some(body) if self.root == Some(class) => body.clone(),
                    _ => JsonSchema::default(),
                };
                self.registry.define(&meta.name, body);
            }
            return Ok(JsonSchema::reference(pointer));
        }

        self.registry.claim(&meta.name, class)?;
        // Reserve the slot so definitions keep first-encounter order.
        self.registry.define(&meta.name, JsonSchema::default());

        trace!(class = %meta.name, "Building definition");
        self.in_progress.insert(class);
        let body = self.build_object(&meta)?;
        self.in_progress.remove(&class);
        self.built.insert(class);
        self.registry.define(&meta.name, body);

        Ok(JsonSchema::reference(pointer))
    }

    /// Schema of a declared type with its constraints.
    ///
    /// Item-level rules go on the element schema, `minItems`/`maxItems` on
    /// the collection. Rules are never attached to a bare `$ref`.
    pub fn descriptor_schema(
        &mut self,
        descriptor: &TypeDescriptor,
        rules: &[ValidationRule],
    ) -> SchemaResult<JsonSchema> {
        let mut element = self.element_schema(&descriptor.ty)?;
        let (collection_rules, item_rules): (Vec<_>, Vec<_>) =
            rules.iter().partition(|rule| rule.is_collection_rule());

        if !element.is_reference() {
            for rule in &item_rules {
                rule.apply(&mut element);
            }
        }

        let mut schema = match descriptor.collection {
            None => element,
            Some(CollectionKind::Array) => JsonSchema::array(element),
            Some(CollectionKind::Map) => JsonSchema::map(element),
            Some(CollectionKind::Set) => {
                return Err(SchemaError::unsupported(CollectionKind::Set.name(), "?", "?"));
            }
        };

        if !schema.is_reference() {
            for rule in &collection_rules {
                rule.apply(&mut schema);
            }
        }
        Ok(schema)
    }

    /// Named definitions collected so far, in first-encounter order.
    pub fn definitions(&self) -> impl Iterator<Item = (&String, &JsonSchema)> {
        self.registry.iter()
    }

    /// Consume the builder and return the definitions and virtuals.
    pub fn finish(self) -> (IndexMap<String, JsonSchema>, IndexMap<String, VirtualRefSchema>) {
        (self.registry.into_definitions(), self.virtuals)
    }

    // ==========================================================================
    // Internals
    // ==========================================================================

    fn build_object(&mut self, meta: &ClassMetadata) -> SchemaResult<JsonSchema> {
        let mut schema = JsonSchema::object();
        schema.title = meta.title.clone();
        schema.description = meta.description.clone();

        let groups = self.options.groups.clone();
        let mut properties = IndexMap::new();

        for property in meta.schema_properties() {
            if !property.matches_groups(groups.as_deref()) {
                continue;
            }
            let key = property.schema_key(true).to_string();

            if let Some(relation) = &property.virtual_ref {
                if self.root == Some(meta.id) {
                    let record = VirtualRefSchema {
                        reference: self.store.class_name(relation.target)?.to_string(),
                        local_field: relation.local_field.clone(),
                        foreign_field: relation.foreign_field.clone(),
                        just_one: relation.just_one
                            && property.descriptor.collection != Some(CollectionKind::Array),
                        count: relation.count,
                        options: relation.options.clone(),
                    };
                    self.virtuals.insert(key, record);
                }
                continue;
            }

            let mut property_schema = self
                .property_schema(property)
                .map_err(|err| locate(err, &meta.name, &property.key))?;

            if meta.discriminator_key.as_deref() == Some(property.key.as_str()) {
                if let Some(value) = &meta.discriminator_value {
                    property_schema.enum_values = Some(vec![Value::String(value.clone())]);
                }
            }

            if property.required {
                schema.required.push(key.clone());
            }
            properties.insert(key, property_schema);
        }

        if !properties.is_empty() {
            schema.properties = Some(properties);
        }
        if let Some(allowed) = meta.additional_properties {
            schema.additional_properties = Some(AdditionalProperties::Bool(allowed));
        }

        debug!(
            class = %meta.name,
            properties = schema.properties.as_ref().map_or(0, IndexMap::len),
            required = schema.required.len(),
            "Built class schema"
        );
        Ok(schema)
    }

    fn property_schema(&mut self, property: &PropertyMetadata) -> SchemaResult<JsonSchema> {
        let schema = self.descriptor_schema(&property.descriptor, &property.rules)?;

        let annotated = property.default.is_some()
            || property.example.is_some()
            || property.title.is_some()
            || property.description.is_some()
            || property.nullable
            || property.read_only
            || property.write_only;

        let mut schema = if schema.is_reference() && annotated {
            JsonSchema {
                all_of: vec![schema],
                ..JsonSchema::default()
            }
        } else {
            schema
        };

        schema.default = property.default.clone();
        schema.example = property.example.clone();
        schema.title = property.title.clone().or(schema.title);
        schema.description = property.description.clone().or(schema.description);
        schema.nullable = property.nullable;
        schema.read_only = property.read_only;
        schema.write_only = property.write_only;
        Ok(schema)
    }

    fn element_schema(&mut self, ty: &PropertyType) -> SchemaResult<JsonSchema> {
        let schema = match ty {
            PropertyType::String | PropertyType::Symbol => JsonSchema::string(),
            PropertyType::Number => JsonSchema::number(),
            PropertyType::Integer => JsonSchema::integer(),
            PropertyType::Boolean => JsonSchema::boolean(),
            PropertyType::Date => JsonSchema::string().with_format("date-time"),
            PropertyType::Any => JsonSchema::default(),
            PropertyType::Model(class) => self.model_ref(*class)?,
            PropertyType::Composite { mode, members } => {
                let members = members
                    .iter()
                    .map(|member| self.element_schema(member))
                    .collect::<SchemaResult<Vec<_>>>()?;
                let mut schema = JsonSchema::default();
                match mode {
                    Composition::AllOf => schema.all_of = members,
                    Composition::AnyOf => schema.any_of = members,
                    Composition::OneOf => schema.one_of = members,
                }
                schema
            }
            PropertyType::Discriminated(base) => self.discriminated_schema(*base)?,
        };
        Ok(schema)
    }

    fn discriminated_schema(&mut self, base: ClassId) -> SchemaResult<JsonSchema> {
        let meta = self.store.class_metadata(base)?;
        let property_name = meta.discriminator_key.clone().ok_or_else(|| {
            SchemaError::invalid(&meta.name, "*", "polymorphic base has no discriminator key")
        })?;

        let children = self.store.discriminator_children(base);
        if children.is_empty() {
            return Err(SchemaError::invalid(
                &meta.name,
                "*",
                "polymorphic base has no discriminated children",
            ));
        }

        let mut one_of = Vec::with_capacity(children.len());
        let mut mapping = IndexMap::new();
        for (value, child) in children {
            let reference = self.model_ref(child)?;
            if let Some(pointer) = &reference.reference {
                mapping.insert(value, pointer.clone());
            }
            one_of.push(reference);
        }

        Ok(JsonSchema {
            one_of,
            discriminator: Some(DiscriminatorObject {
                property_name,
                mapping,
            }),
            ..JsonSchema::default()
        })
    }
}

/// Fill in the class and property of an error raised below a property.
pub(crate) fn locate(err: SchemaError, class: &str, property: &str) -> SchemaError {
    match err {
        SchemaError::UnsupportedType { container, .. } => {
            SchemaError::unsupported(container, class, property)
        }
        other => other,
    }
}

/// Build the schema of a class with default options.
///
/// # Example
/// ```rust
/// use modelspec::{build_schema, EntityStore, PropertyOptions};
/// use serde_json::json;
///
/// let mut store = EntityStore::new();
/// let person = store
///     .define("Person")
///     .property("name", PropertyOptions::new().string().required())
///     .property("age", PropertyOptions::new().number().minimum(0.0).maximum(150.0))
///     .build()
///     .unwrap();
///
/// let document = build_schema(&store, person).unwrap();
/// assert_eq!(
///     document.to_value(),
///     json!({
///         "type": "object",
///         "properties": {
///             "name": {"type": "string"},
///             "age": {"type": "number", "minimum": 0, "maximum": 150}
///         },
///         "required": ["name"]
///     })
/// );
/// ```
pub fn build_schema(store: &EntityStore, class: ClassId) -> SchemaResult<SchemaDocument> {
    build_schema_with(store, class, &SchemaOptions::default())
}

/// Build the schema of a class.
pub fn build_schema_with(
    store: &EntityStore,
    class: ClassId,
    options: &SchemaOptions,
) -> SchemaResult<SchemaDocument> {
    let mut builder = SchemaBuilder::new(store, options.clone());
    let schema = builder.build_root(class)?;
    let (definitions, virtuals) = builder.finish();
    debug!(
        class = %class,
        definitions = definitions.len(),
        virtuals = virtuals.len(),
        "Schema build complete"
    );
    Ok(SchemaDocument {
        schema,
        definitions,
        virtuals,
        spec_type: options.spec_type,
    })
}
