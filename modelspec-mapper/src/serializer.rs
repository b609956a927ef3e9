//! Runtime value to JSON.

use modelspec::{ClassId, CollectionKind, PropertyType, TypeDescriptor};
use serde_json::{Map, Number, Value as JsonValue};
use tracing::trace;

use crate::context::MappingContext;
use crate::error::{MapperError, MapperResult};
use crate::mapper::JsonMapper;
use crate::options::SerializeOptions;
use crate::value::{Instance, Value};

/// State of one serialize call.
pub(crate) struct Serializer<'a> {
    mapper: &'a JsonMapper,
    options: &'a SerializeOptions,
    ctx: MappingContext,
}

impl<'a> Serializer<'a> {
    pub(crate) fn new(mapper: &'a JsonMapper, options: &'a SerializeOptions) -> Self {
        Self {
            mapper,
            options,
            ctx: MappingContext::new(false),
        }
    }

    /// Serialize a value against a descriptor; `None` means absent.
    pub(crate) fn value(
        &mut self,
        value: &Value,
        descriptor: &TypeDescriptor,
    ) -> MapperResult<Option<JsonValue>> {
        match value {
            Value::Undefined => return Ok(None),
            Value::Null => return Ok(Some(JsonValue::Null)),
            _ => {}
        }

        match descriptor.collection {
            Some(CollectionKind::Array | CollectionKind::Set) => match value {
                Value::Array(items) | Value::Set(items) => {
                    let element = descriptor.element();
                    let mut out = Vec::with_capacity(items.len());
                    for (index, item) in items.iter().enumerate() {
                        self.ctx.push_index(index);
                        let result = self.value(item, &element);
                        self.ctx.pop();
                        out.push(result?.unwrap_or(JsonValue::Null));
                    }
                    Ok(Some(JsonValue::Array(out)))
                }
                other => Err(MapperError::shape(self.ctx.path(), "array", other.kind())),
            },
            Some(CollectionKind::Map) => {
                let entries = match value {
                    Value::Map(entries) => entries,
                    Value::Object(instance) => &instance.fields,
                    other => {
                        return Err(MapperError::shape(self.ctx.path(), "map", other.kind()))
                    }
                };
                let element = descriptor.element();
                let mut out = Map::new();
                for (key, item) in entries {
                    self.ctx.push_key(key.as_str());
                    let result = self.value(item, &element);
                    self.ctx.pop();
                    if let Some(json) = result? {
                        out.insert(key.clone(), json);
                    }
                }
                Ok(Some(JsonValue::Object(out)))
            }
            None => self.element(value, &descriptor.ty).map(Some),
        }
    }

    fn element(&mut self, value: &Value, ty: &PropertyType) -> MapperResult<JsonValue> {
        match ty {
            PropertyType::Any => self.untyped(value),
            PropertyType::Composite { .. } => match value {
                Value::Object(instance) => match instance.class {
                    Some(class) => self.instance(instance, class),
                    None => self.untyped(value),
                },
                other => self.untyped(other),
            },
            PropertyType::Model(declared) | PropertyType::Discriminated(declared) => {
                self.model(value, *declared)
            }
            scalar => match self.mapper.types.resolve(scalar.type_key()) {
                Some(strategy) => strategy.serialize(value, &self.ctx),
                None => self.untyped(value),
            },
        }
    }

    fn model(&mut self, value: &Value, declared: ClassId) -> MapperResult<JsonValue> {
        let store = self.mapper.store();
        let class = match value {
            Value::Object(Instance {
                class: Some(actual),
                ..
            }) if store.is_subclass_of(*actual, declared) => *actual,
            _ => declared,
        };

        if let Some(strategy) = self.mapper.types.resolve(store.class_name(class)?) {
            return strategy.serialize(value, &self.ctx);
        }

        match value {
            Value::Object(instance) => self.instance(instance, class),
            other => Err(MapperError::shape(self.ctx.path(), "object", other.kind())),
        }
    }

    /// Serialize an instance as `class`, walking its declared properties.
    fn instance(&mut self, instance: &Instance, class: ClassId) -> MapperResult<JsonValue> {
        let mapper = self.mapper;
        let store = mapper.store();
        let metadata = store.class_metadata(class)?;
        let groups = self.options.groups.as_deref();
        trace!(class = %metadata.name, path = %self.ctx.path(), "Serializing instance");

        let mut out = Map::new();
        for property in metadata.properties.values() {
            if property.ignore || property.write_only || !property.matches_groups(groups) {
                continue;
            }

            let key = property.schema_key(self.options.use_alias);
            let mut value = instance.get(&property.key).cloned().unwrap_or_default();
            if let Some(hook) = mapper.hooks.find_on_serialize(store, class, &property.key) {
                match hook(value) {
                    Some(transformed) => value = transformed,
                    None => continue,
                }
            }

            self.ctx.push_key(key);
            let result = self.value(&value, &property.descriptor);
            self.ctx.pop();
            match result? {
                Some(json) => {
                    out.insert(key.to_string(), json);
                }
                None if self.options.keep_undefined => {
                    out.insert(key.to_string(), JsonValue::Null);
                }
                None => {}
            }
        }

        if metadata.additional_properties == Some(true) {
            for (key, value) in &instance.fields {
                if matches!(value, Value::Undefined)
                    || metadata.property(key).is_some()
                    || out.contains_key(key)
                {
                    continue;
                }
                self.ctx.push_key(key.as_str());
                let result = self.untyped(value);
                self.ctx.pop();
                out.insert(key.clone(), result?);
            }
        }

        if let (Some(key), Some(tag)) = (&metadata.discriminator_key, &metadata.discriminator_value) {
            let key = metadata
                .property(key)
                .map_or(key.as_str(), |p| p.schema_key(self.options.use_alias));
            if out.get(key).map_or(true, JsonValue::is_null) {
                out.insert(key.to_string(), JsonValue::String(tag.clone()));
            }
        }

        if let Some(hook) = mapper.hooks.find_after_serialize(store, class) {
            out = hook(out).map_err(|message| MapperError::hook(self.ctx.path(), message))?;
        }

        Ok(JsonValue::Object(out))
    }

    /// Serialize a value by its runtime shape alone.
    fn untyped(&mut self, value: &Value) -> MapperResult<JsonValue> {
        match value {
            Value::Undefined | Value::Null => Ok(JsonValue::Null),
            Value::Bool(b) => Ok(JsonValue::Bool(*b)),
            Value::Integer(n) => Ok(JsonValue::Number(Number::from(*n))),
            Value::Float(n) => Number::from_f64(*n)
                .map(JsonValue::Number)
                .ok_or_else(|| MapperError::cast(self.ctx.path(), "Number", n.to_string())),
            Value::String(s) => Ok(JsonValue::String(s.clone())),
            Value::Date(_) => self.element(value, &PropertyType::Date),
            Value::Symbol(_) => self.element(value, &PropertyType::Symbol),
            Value::Array(items) | Value::Set(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    self.ctx.push_index(index);
                    let result = self.untyped(item);
                    self.ctx.pop();
                    out.push(result?);
                }
                Ok(JsonValue::Array(out))
            }
            Value::Map(entries) => self.untyped_fields(entries.iter()),
            Value::Object(instance) => match instance.class {
                Some(class) => self.instance(instance, class),
                None => self.untyped_fields(instance.fields.iter()),
            },
        }
    }

    fn untyped_fields<'v>(
        &mut self,
        fields: impl Iterator<Item = (&'v String, &'v Value)>,
    ) -> MapperResult<JsonValue> {
        let mut out = Map::new();
        for (key, value) in fields {
            if matches!(value, Value::Undefined) {
                continue;
            }
            self.ctx.push_key(key.as_str());
            let result = self.untyped(value);
            self.ctx.pop();
            out.insert(key.clone(), result?);
        }
        Ok(JsonValue::Object(out))
    }
}
