//! The mapper engine.

use std::sync::Arc;

use modelspec::{ClassId, EntityStore, TypeDescriptor};
use serde_json::Value as JsonValue;
use tracing::trace;

use crate::deserializer::Deserializer;
use crate::error::MapperResult;
use crate::hooks::HookSet;
use crate::options::{DeserializeOptions, SerializeOptions};
use crate::serializer::Serializer;
use crate::types::TypeRegistry;
use crate::validation::PatternCache;
use crate::value::Value;

/// Converts between runtime values and JSON using the metadata of an
/// [`EntityStore`].
///
/// The store is shared read-only, so one mapper may serve many threads.
/// Every call carries its own state; nothing is kept between calls apart
/// from compiled validation patterns.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use modelspec::{EntityStore, PropertyOptions};
/// use modelspec_mapper::{DeserializeOptions, Instance, JsonMapper, Value};
/// use serde_json::json;
///
/// let mut store = EntityStore::new();
/// let person = store
///     .define("Person")
///     .property("name", PropertyOptions::new().string().required())
///     .property("age", PropertyOptions::new().integer())
///     .build()
///     .unwrap();
///
/// let mapper = JsonMapper::new(Arc::new(store));
/// let value = mapper
///     .deserialize(&json!({"name": "Ada", "age": "36"}), person, &DeserializeOptions::new())
///     .unwrap();
/// assert_eq!(
///     value,
///     Value::Object(Instance::new(person).with("name", "Ada").with("age", 36))
/// );
///
/// let json = mapper.serialize(&value, person).unwrap();
/// assert_eq!(json, json!({"name": "Ada", "age": 36}));
/// ```
#[derive(Debug)]
pub struct JsonMapper {
    store: Arc<EntityStore>,
    pub(crate) types: TypeRegistry,
    pub(crate) hooks: HookSet,
    pub(crate) patterns: PatternCache,
}

impl JsonMapper {
    /// Create a mapper with the built-in type strategies and no hooks.
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self {
            store,
            types: TypeRegistry::new(),
            hooks: HookSet::new(),
            patterns: PatternCache::default(),
        }
    }

    /// Replace the type registry.
    #[must_use = "This method returns a new JsonMapper and does not modify self"]
    pub fn with_types(mut self, types: TypeRegistry) -> Self {
        self.types = types;
        self
    }

    /// Replace the hooks.
    #[must_use = "This method returns a new JsonMapper and does not modify self"]
    pub fn with_hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = hooks;
        self
    }

    /// Metadata store this mapper reads.
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Registered type strategies.
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Mutable access for registering custom type strategies.
    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    /// Registered lifecycle hooks.
    pub fn hooks(&self) -> &HookSet {
        &self.hooks
    }

    /// Mutable access for registering lifecycle hooks.
    pub fn hooks_mut(&mut self) -> &mut HookSet {
        &mut self.hooks
    }

    // ==========================================================================
    // Serialize
    // ==========================================================================

    /// Serialize an instance of `class` with default options.
    pub fn serialize(&self, value: &Value, class: ClassId) -> MapperResult<JsonValue> {
        self.serialize_with(value, &TypeDescriptor::model(class), &SerializeOptions::default())
    }

    /// Serialize a value against an explicit descriptor.
    ///
    /// An absent root value serializes to `null`.
    pub fn serialize_with(
        &self,
        value: &Value,
        descriptor: &TypeDescriptor,
        options: &SerializeOptions,
    ) -> MapperResult<JsonValue> {
        trace!(type_key = descriptor.ty.type_key(), kind = value.kind(), "Serializing value");
        let mut serializer = Serializer::new(self, options);
        Ok(serializer.value(value, descriptor)?.unwrap_or(JsonValue::Null))
    }

    // ==========================================================================
    // Deserialize
    // ==========================================================================

    /// Deserialize JSON into an instance of `class`.
    pub fn deserialize(
        &self,
        input: &JsonValue,
        class: ClassId,
        options: &DeserializeOptions,
    ) -> MapperResult<Value> {
        self.deserialize_with(input, &TypeDescriptor::model(class), options)
    }

    /// Deserialize JSON against an explicit descriptor.
    pub fn deserialize_with(
        &self,
        input: &JsonValue,
        descriptor: &TypeDescriptor,
        options: &DeserializeOptions,
    ) -> MapperResult<Value> {
        trace!(
            type_key = descriptor.ty.type_key(),
            strict = options.strict,
            validate = options.validate,
            "Deserializing value"
        );
        let mut deserializer = Deserializer::new(self, options);
        deserializer.value(input, descriptor)
    }
}
