//! JSON to runtime value.

use std::borrow::Cow;

use indexmap::IndexMap;
use modelspec::{ClassId, CollectionKind, Composition, PropertyType, TypeDescriptor};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, trace, warn};

use crate::context::MappingContext;
use crate::error::{MapperError, MapperResult};
use crate::mapper::JsonMapper;
use crate::options::{AdditionalPropertiesPolicy, DeserializeOptions};
use crate::validation::{check_required, check_rules};
use crate::value::{json_kind, Instance, Value};

/// State of one deserialize call.
pub(crate) struct Deserializer<'a> {
    mapper: &'a JsonMapper,
    options: &'a DeserializeOptions,
    ctx: MappingContext,
}

impl<'a> Deserializer<'a> {
    pub(crate) fn new(mapper: &'a JsonMapper, options: &'a DeserializeOptions) -> Self {
        Self {
            mapper,
            options,
            ctx: MappingContext::new(options.strict),
        }
    }

    pub(crate) fn value(
        &mut self,
        input: &JsonValue,
        descriptor: &TypeDescriptor,
    ) -> MapperResult<Value> {
        if input.is_null() {
            return Ok(Value::Null);
        }

        match descriptor.collection {
            Some(kind @ (CollectionKind::Array | CollectionKind::Set)) => {
                let items: Vec<&JsonValue> = match input {
                    JsonValue::Array(items) => items.iter().collect(),
                    other if self.ctx.is_strict() => {
                        return Err(MapperError::shape(self.ctx.path(), "array", json_kind(other)));
                    }
                    other => {
                        debug!(path = %self.ctx.path(), "Wrapping single value into a collection");
                        vec![other]
                    }
                };

                let element = descriptor.element();
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    self.ctx.push_index(index);
                    let result = self.value(item, &element);
                    self.ctx.pop();
                    let value = result?;
                    if kind == CollectionKind::Set && out.contains(&value) {
                        continue;
                    }
                    out.push(value);
                }

                Ok(match kind {
                    CollectionKind::Set => Value::Set(out),
                    _ => Value::Array(out),
                })
            }
            Some(CollectionKind::Map) => {
                let JsonValue::Object(entries) = input else {
                    return Err(MapperError::shape(self.ctx.path(), "object", json_kind(input)));
                };

                let element = descriptor.element();
                let mut out = IndexMap::with_capacity(entries.len());
                for (key, item) in entries {
                    self.ctx.push_key(key.as_str());
                    let result = self.value(item, &element);
                    self.ctx.pop();
                    out.insert(key.clone(), result?);
                }
                Ok(Value::Map(out))
            }
            None => self.element(input, &descriptor.ty),
        }
    }

    fn element(&mut self, input: &JsonValue, ty: &PropertyType) -> MapperResult<Value> {
        match ty {
            PropertyType::Any => Ok(Value::from_json(input)),
            PropertyType::Model(class) | PropertyType::Discriminated(class) => {
                self.model(input, *class)
            }
            PropertyType::Composite { mode, members } => self.composite(input, *mode, members),
            scalar => match self.mapper.types.resolve(scalar.type_key()) {
                Some(strategy) => strategy.deserialize(input, &self.ctx),
                None => Ok(Value::from_json(input)),
            },
        }
    }

    fn model(&mut self, input: &JsonValue, declared: ClassId) -> MapperResult<Value> {
        let mapper = self.mapper;
        let store = mapper.store();
        let name = store.class_name(declared)?;

        if let Some(strategy) = mapper.types.resolve(name) {
            return strategy.deserialize(input, &self.ctx);
        }

        let input = match mapper.hooks.find_before_deserialize(store, declared) {
            Some(hook) => Cow::Owned(
                hook(input.clone()).map_err(|message| MapperError::hook(self.ctx.path(), message))?,
            ),
            None => Cow::Borrowed(input),
        };

        let fields = match input.as_ref() {
            JsonValue::Object(fields) => fields,
            other if self.ctx.is_strict() => {
                return Err(MapperError::shape(self.ctx.path(), "object", json_kind(other)));
            }
            other => return Err(MapperError::cast(self.ctx.path(), name, other.to_string())),
        };

        let class = self.dispatch(declared, fields)?;
        self.instance(fields, class).map(Value::Object)
    }

    /// Pick the subclass named by the discriminator value of the input.
    fn dispatch(&self, declared: ClassId, fields: &Map<String, JsonValue>) -> MapperResult<ClassId> {
        let store = self.mapper.store();
        let metadata = store.class_metadata(declared)?;
        let Some(key) = metadata.discriminator_key.as_deref() else {
            return Ok(declared);
        };

        let wire_key = metadata
            .property(key)
            .map_or(key, |p| p.schema_key(self.options.use_alias));
        let Some(tag) = fields.get(wire_key).and_then(JsonValue::as_str) else {
            return Ok(declared);
        };
        if metadata.discriminator_value.as_deref() == Some(tag) {
            return Ok(declared);
        }

        match store
            .discriminator_children(declared)
            .into_iter()
            .find(|(value, _)| value == tag)
        {
            Some((_, child)) => {
                trace!(base = %metadata.name, tag, child = %child, "Resolved discriminator");
                Ok(child)
            }
            None if self.ctx.is_strict() => Err(MapperError::shape(
                self.ctx.child_path(wire_key),
                format!("a discriminator value of {}", metadata.name),
                format!("\"{tag}\""),
            )),
            None => {
                warn!(
                    base = %metadata.name,
                    tag,
                    "Unknown discriminator value, falling back to base class"
                );
                Ok(declared)
            }
        }
    }

    /// Build an instance of `class` from a JSON object.
    fn instance(&mut self, fields: &Map<String, JsonValue>, class: ClassId) -> MapperResult<Instance> {
        let mapper = self.mapper;
        let store = mapper.store();
        let metadata = store.class_metadata(class)?;
        let use_alias = self.options.use_alias;
        let groups = self.options.groups.as_deref();
        let policy = match metadata.additional_properties {
            Some(true) => AdditionalPropertiesPolicy::Accept,
            _ => self.options.additional_properties,
        };
        trace!(class = %metadata.name, path = %self.ctx.path(), "Deserializing instance");

        let mut instance = Instance::new(class);
        for (wire_key, raw) in fields {
            let Some(property) = metadata.property_by_schema_key(wire_key, use_alias) else {
                if metadata.discriminator_key.as_deref() == Some(wire_key.as_str()) {
                    instance.set(wire_key.clone(), Value::from_json(raw));
                    continue;
                }
                match policy {
                    AdditionalPropertiesPolicy::Accept => {
                        instance.set(wire_key.clone(), Value::from_json(raw));
                    }
                    AdditionalPropertiesPolicy::Ignore => {
                        warn!(class = %metadata.name, property = %wire_key, "Dropping unknown property");
                    }
                    AdditionalPropertiesPolicy::Error => {
                        return Err(MapperError::UnknownProperty {
                            path: self.ctx.path(),
                            property: wire_key.clone(),
                        });
                    }
                }
                continue;
            };

            if property.ignore || property.read_only || !property.matches_groups(groups) {
                continue;
            }

            self.ctx.push_key(wire_key.as_str());
            let result = self.value(raw, &property.descriptor);
            self.ctx.pop();
            let mut value = result?;

            if let Some(hook) = mapper.hooks.find_on_deserialize(store, class, &property.key) {
                match hook(value) {
                    Some(transformed) => value = transformed,
                    None => continue,
                }
            }
            instance.set(property.key.clone(), value);
        }

        for property in metadata.properties.values() {
            if property.ignore || property.read_only || !property.matches_groups(groups) {
                continue;
            }
            let wire_key = property.schema_key(use_alias);

            if instance.get(&property.key).is_none() {
                if let Some(default) = &property.default {
                    self.ctx.push_key(wire_key);
                    let result = self.value(default, &property.descriptor);
                    self.ctx.pop();
                    instance.set(property.key.clone(), result?);
                }
            }

            if self.options.validate {
                check_required(property, wire_key, instance.get(&property.key), &self.ctx)?;
                if let Some(value) = instance.get(&property.key) {
                    self.ctx.push_key(wire_key);
                    let result = check_rules(property, value, &mut self.ctx, &mapper.patterns);
                    self.ctx.pop();
                    result?;
                }
            }
        }

        if let Some(hook) = mapper.hooks.find_after_deserialize(store, class) {
            instance = hook(instance).map_err(|message| MapperError::hook(self.ctx.path(), message))?;
        }

        Ok(instance)
    }

    fn composite(
        &mut self,
        input: &JsonValue,
        mode: Composition,
        members: &[PropertyType],
    ) -> MapperResult<Value> {
        match mode {
            Composition::AllOf => {
                let models: Vec<ClassId> = members.iter().filter_map(PropertyType::model).collect();
                if models.is_empty() {
                    return match members.first() {
                        Some(first) => self.element(input, first),
                        None => Ok(Value::from_json(input)),
                    };
                }

                let mut merged = Instance::plain();
                for class in models {
                    if let Value::Object(part) = self.model(input, class)? {
                        merged.class = merged.class.or(part.class);
                        merged.fields.extend(part.fields);
                    }
                }
                Ok(Value::Object(merged))
            }
            Composition::AnyOf | Composition::OneOf => {
                for member in members {
                    match self.element(input, member) {
                        Ok(value) => return Ok(value),
                        Err(err) => {
                            trace!(error = %err, "Composite member rejected input");
                        }
                    }
                }
                Err(MapperError::cast(
                    self.ctx.path(),
                    self.member_names(members),
                    input.to_string(),
                ))
            }
        }
    }

    fn member_names(&self, members: &[PropertyType]) -> String {
        let store = self.mapper.store();
        members
            .iter()
            .map(|member| match member {
                PropertyType::Model(class) | PropertyType::Discriminated(class) => store
                    .class_name(*class)
                    .map_or_else(|_| class.to_string(), str::to_string),
                other => other.type_key().to_string(),
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}
