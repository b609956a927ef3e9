//! Declarative registration API.
//!
//! [`PropertyOptions`] is the annotation shape accepted by
//! [`EntityStore::register_property`]. Every setter records one piece of
//! metadata; fields left unset keep whatever an earlier registration of the
//! same property declared.

use serde_json::Value;
use tracing::trace;

use super::EntityStore;
use crate::error::{SchemaError, SchemaResult};
use crate::ir::validation::upsert_rule;
use crate::ir::{
    ClassId, CollectionKind, PropertyMetadata, PropertyType, TypeDescriptor, ValidationRule,
    VirtualRef,
};

/// Metadata declared for a property by one registration call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyOptions {
    pub(crate) ty: Option<PropertyType>,
    pub(crate) collection: Option<CollectionKind>,
    pub(crate) required: Option<bool>,
    pub(crate) nullable: Option<bool>,
    pub(crate) rules: Vec<ValidationRule>,
    pub(crate) default: Option<Value>,
    pub(crate) example: Option<Value>,
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) ignore: Option<bool>,
    pub(crate) read_only: Option<bool>,
    pub(crate) write_only: Option<bool>,
    pub(crate) alias: Option<String>,
    pub(crate) groups: Option<Vec<String>>,
    pub(crate) virtual_ref: Option<VirtualRef>,
}

impl PropertyOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Types
    // ==========================================================================

    /// Declare the element type.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn of_type(mut self, ty: PropertyType) -> Self {
        self.ty = Some(ty);
        self
    }

    /// Declare a string.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn string(self) -> Self {
        self.of_type(PropertyType::String)
    }

    /// Declare a number.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn number(self) -> Self {
        self.of_type(PropertyType::Number)
    }

    /// Declare an integer.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn integer(self) -> Self {
        self.of_type(PropertyType::Integer)
    }

    /// Declare a boolean.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn boolean(self) -> Self {
        self.of_type(PropertyType::Boolean)
    }

    /// Declare a date.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn date(self) -> Self {
        self.of_type(PropertyType::Date)
    }

    /// Declare a symbol.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn symbol(self) -> Self {
        self.of_type(PropertyType::Symbol)
    }

    /// Declare an unconstrained value.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn any(self) -> Self {
        self.of_type(PropertyType::Any)
    }

    /// Declare a nested model.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn model(self, class: ClassId) -> Self {
        self.of_type(PropertyType::Model(class))
    }

    /// Wrap the element type in a collection.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn collection(mut self, kind: CollectionKind) -> Self {
        self.collection = Some(kind);
        self
    }

    /// Declare an array of the given type.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn array_of(self, ty: PropertyType) -> Self {
        self.of_type(ty).collection(CollectionKind::Array)
    }

    /// Declare a string-keyed map of the given type.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn map_of(self, ty: PropertyType) -> Self {
        self.of_type(ty).collection(CollectionKind::Map)
    }

    /// Declare an `allOf` composition.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn all_of(self, members: impl IntoIterator<Item = PropertyType>) -> Self {
        self.of_type(PropertyType::all_of(members))
    }

    /// Declare an `anyOf` composition.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn any_of(self, members: impl IntoIterator<Item = PropertyType>) -> Self {
        self.of_type(PropertyType::any_of(members))
    }

    /// Declare a `oneOf` composition.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn one_of(self, members: impl IntoIterator<Item = PropertyType>) -> Self {
        self.of_type(PropertyType::one_of(members))
    }

    /// Declare a polymorphic reference resolved through `base`'s discriminator.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn discriminated(self, base: ClassId) -> Self {
        self.of_type(PropertyType::Discriminated(base))
    }

    /// Declare a data-layer relation.
    ///
    /// Unless a type was set explicitly, the property is typed as the
    /// referenced model.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn virtual_ref(mut self, relation: VirtualRef) -> Self {
        self.virtual_ref = Some(relation);
        self
    }

    // ==========================================================================
    // Flags
    // ==========================================================================

    /// Mark the property as required.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn required(mut self) -> Self {
        self.required = Some(true);
        self
    }

    /// Mark the property as optional, overriding an earlier `required()`.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn optional(mut self) -> Self {
        self.required = Some(false);
        self
    }

    /// Accept null.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn nullable(mut self) -> Self {
        self.nullable = Some(true);
        self
    }

    /// Exclude the property from schemas and mapping.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn ignore(mut self) -> Self {
        self.ignore = Some(true);
        self
    }

    /// Only emit the property in outgoing payloads.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn read_only(mut self) -> Self {
        self.read_only = Some(true);
        self
    }

    /// Only accept the property in incoming payloads.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn write_only(mut self) -> Self {
        self.write_only = Some(true);
        self
    }

    /// Use a custom key on the wire.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.alias = Some(name.into());
        self
    }

    /// Restrict the property to the given groups.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    // ==========================================================================
    // Annotations
    // ==========================================================================

    /// Set the default value.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Set an example value.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn example(mut self, value: impl Into<Value>) -> Self {
        self.example = Some(value.into());
        self
    }

    /// Set the title.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    // ==========================================================================
    // Constraints
    // ==========================================================================

    /// Add a validation rule, replacing one of the same kind.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn rule(mut self, rule: ValidationRule) -> Self {
        upsert_rule(&mut self.rules, rule);
        self
    }

    /// Inclusive lower bound.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn minimum(self, value: f64) -> Self {
        self.rule(ValidationRule::Minimum(value))
    }

    /// Inclusive upper bound.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn maximum(self, value: f64) -> Self {
        self.rule(ValidationRule::Maximum(value))
    }

    /// Exclusive lower bound.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn exclusive_minimum(self, value: f64) -> Self {
        self.rule(ValidationRule::ExclusiveMinimum(value))
    }

    /// Exclusive upper bound.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn exclusive_maximum(self, value: f64) -> Self {
        self.rule(ValidationRule::ExclusiveMaximum(value))
    }

    /// Divisor constraint.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn multiple_of(self, value: f64) -> Self {
        self.rule(ValidationRule::MultipleOf(value))
    }

    /// Minimum string length.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn min_length(self, value: usize) -> Self {
        self.rule(ValidationRule::MinLength(value))
    }

    /// Maximum string length.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn max_length(self, value: usize) -> Self {
        self.rule(ValidationRule::MaxLength(value))
    }

    /// Regular expression the string must match.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn pattern(self, pattern: impl Into<String>) -> Self {
        self.rule(ValidationRule::Pattern(pattern.into()))
    }

    /// Format hint.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn format(self, format: impl Into<String>) -> Self {
        self.rule(ValidationRule::Format(format.into()))
    }

    /// Allowed values.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn enum_values<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.rule(ValidationRule::Enum(values.into_iter().map(Into::into).collect()))
    }

    /// Minimum number of items.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn min_items(self, value: usize) -> Self {
        self.rule(ValidationRule::MinItems(value))
    }

    /// Maximum number of items.
    #[must_use = "This method returns a new PropertyOptions and does not modify self"]
    pub fn max_items(self, value: usize) -> Self {
        self.rule(ValidationRule::MaxItems(value))
    }

    // ==========================================================================
    // Merge
    // ==========================================================================

    /// Create fresh metadata for `key` from these options.
    pub(crate) fn into_metadata(self, key: &str) -> PropertyMetadata {
        let mut metadata = PropertyMetadata::new(key, TypeDescriptor::default());
        self.merge_into(&mut metadata);
        metadata
    }

    /// Overlay the fields set here onto existing metadata.
    pub(crate) fn merge_into(self, metadata: &mut PropertyMetadata) {
        match (self.ty, &self.virtual_ref) {
            (Some(ty), _) => metadata.descriptor.ty = ty,
            (None, Some(relation)) if metadata.descriptor.ty == PropertyType::Any => {
                metadata.descriptor.ty = PropertyType::Model(relation.target);
            }
            _ => {}
        }
        if let Some(kind) = self.collection {
            metadata.descriptor.collection = Some(kind);
        }
        if let Some(required) = self.required {
            metadata.required = required;
        }
        if let Some(nullable) = self.nullable {
            metadata.nullable = nullable;
        }
        for rule in self.rules {
            upsert_rule(&mut metadata.rules, rule);
        }
        if self.default.is_some() {
            metadata.default = self.default;
        }
        if self.example.is_some() {
            metadata.example = self.example;
        }
        if self.title.is_some() {
            metadata.title = self.title;
        }
        if self.description.is_some() {
            metadata.description = self.description;
        }
        if let Some(ignore) = self.ignore {
            metadata.ignore = ignore;
        }
        if let Some(read_only) = self.read_only {
            metadata.read_only = read_only;
        }
        if let Some(write_only) = self.write_only {
            metadata.write_only = write_only;
        }
        if self.alias.is_some() {
            metadata.alias = self.alias;
        }
        if let Some(groups) = self.groups {
            metadata.groups = groups;
        }
        if self.virtual_ref.is_some() {
            metadata.virtual_ref = self.virtual_ref;
        }
    }
}

/// Fluent declaration of a model class.
///
/// Registration errors are kept until [`ModelBuilder::build`], which reports
/// the first one.
///
/// # Example
/// ```rust
/// use modelspec::{EntityStore, PropertyOptions};
///
/// let mut store = EntityStore::new();
/// let person = store
///     .define("Person")
///     .property("name", PropertyOptions::new().string().required())
///     .property("age", PropertyOptions::new().number().minimum(0.0).maximum(150.0))
///     .build()
///     .unwrap();
///
/// assert_eq!(store.class_name(person).unwrap(), "Person");
/// ```
pub struct ModelBuilder<'a> {
    store: &'a mut EntityStore,
    id: ClassId,
    error: Option<SchemaError>,
}

impl<'a> ModelBuilder<'a> {
    pub(crate) fn new(store: &'a mut EntityStore, name: &str) -> Self {
        let id = store.register_class(name);
        Self {
            store,
            id,
            error: None,
        }
    }

    fn apply(mut self, step: impl FnOnce(&mut EntityStore, ClassId) -> SchemaResult<()>) -> Self {
        if self.error.is_none() {
            if let Err(err) = step(&mut *self.store, self.id) {
                self.error = Some(err);
            }
        }
        self
    }

    /// Inherit the properties of `parent`.
    #[must_use = "This method returns a new ModelBuilder and does not modify self"]
    pub fn extends(self, parent: ClassId) -> Self {
        self.apply(|store, id| store.extend(id, parent))
    }

    /// Set the class description.
    #[must_use = "This method returns a new ModelBuilder and does not modify self"]
    pub fn description(self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.apply(|store, id| store.set_description(id, description))
    }

    /// Set the class title.
    #[must_use = "This method returns a new ModelBuilder and does not modify self"]
    pub fn title(self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.apply(|store, id| store.set_title(id, title))
    }

    /// Declare the discriminator property of a polymorphic base.
    #[must_use = "This method returns a new ModelBuilder and does not modify self"]
    pub fn discriminator_key(self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.apply(|store, id| store.set_discriminator_key(id, key))
    }

    /// Declare the discriminator value identifying this class.
    #[must_use = "This method returns a new ModelBuilder and does not modify self"]
    pub fn discriminator_value(self, value: impl Into<String>) -> Self {
        let value = value.into();
        self.apply(|store, id| store.set_discriminator_value(id, value))
    }

    /// Open or close the object to unknown keys.
    #[must_use = "This method returns a new ModelBuilder and does not modify self"]
    pub fn additional_properties(self, allowed: bool) -> Self {
        self.apply(|store, id| store.set_additional_properties(id, allowed))
    }

    /// Register a property.
    #[must_use = "This method returns a new ModelBuilder and does not modify self"]
    pub fn property(self, key: impl Into<String>, options: PropertyOptions) -> Self {
        let key = key.into();
        self.apply(|store, id| store.register_property(id, key, options))
    }

    /// Finish the declaration.
    ///
    /// On error the class is removed again, so `lookup` does not see a
    /// half-declared model.
    pub fn build(self) -> SchemaResult<ClassId> {
        match self.error {
            Some(err) => {
                self.store.discard_last(self.id);
                Err(err)
            }
            None => {
                trace!(class = %self.id, "Model declaration complete");
                Ok(self.id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_into_metadata() {
        let metadata = PropertyOptions::new()
            .array_of(PropertyType::String)
            .required()
            .min_items(1)
            .alias("labels")
            .into_metadata("tags");

        assert_eq!(metadata.key, "tags");
        assert_eq!(metadata.descriptor, TypeDescriptor::array(PropertyType::String));
        assert!(metadata.required);
        assert_eq!(metadata.rules, vec![ValidationRule::MinItems(1)]);
        assert_eq!(metadata.alias.as_deref(), Some("labels"));
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut metadata = PropertyOptions::new()
            .number()
            .minimum(0.0)
            .required()
            .into_metadata("age");

        PropertyOptions::new().maximum(150.0).merge_into(&mut metadata);
        PropertyOptions::new().minimum(1.0).merge_into(&mut metadata);

        assert_eq!(metadata.descriptor.ty, PropertyType::Number);
        assert!(metadata.required);
        assert_eq!(
            metadata.rules,
            vec![ValidationRule::Minimum(1.0), ValidationRule::Maximum(150.0)]
        );
    }

    #[test]
    fn test_virtual_ref_types_property_as_model() {
        let target = ClassId::from_raw(4);
        let metadata = PropertyOptions::new()
            .virtual_ref(VirtualRef::new(target, "owner"))
            .into_metadata("pets");
        assert_eq!(metadata.descriptor.ty, PropertyType::Model(target));
        assert!(metadata.is_virtual());
    }

    #[test]
    fn test_enum_values_accept_mixed_literals() {
        let metadata = PropertyOptions::new()
            .string()
            .enum_values(["a", "b"])
            .default_value("a")
            .into_metadata("kind");
        assert_eq!(
            metadata.rules,
            vec![ValidationRule::Enum(vec![json!("a"), json!("b")])]
        );
        assert_eq!(metadata.default, Some(json!("a")));
    }

    #[test]
    fn test_builder_reports_first_error() {
        let mut store = EntityStore::new();
        let result = store
            .define("Broken")
            .property("a", PropertyOptions::new().string().collection(CollectionKind::Set))
            .property("b", PropertyOptions::new().string().pattern("("))
            .build();

        assert!(matches!(result, Err(SchemaError::UnsupportedType { .. })));
    }

    #[test]
    fn test_failed_build_discards_class() {
        let mut store = EntityStore::new();
        let earlier = store
            .define("Draft")
            .property("a", PropertyOptions::new().string())
            .build()
            .unwrap();
        let before = store.len();

        let result = store
            .define("Draft")
            .property("b", PropertyOptions::new().string().pattern("[a-"))
            .build();

        assert!(matches!(result, Err(SchemaError::InvalidMetadata { .. })));
        assert_eq!(store.len(), before);
        assert_eq!(store.lookup("Draft"), Some(earlier));
        assert!(store.class_metadata(earlier).unwrap().property("b").is_none());

        let missing = store
            .define("Orphan")
            .property("c", PropertyOptions::new().string().collection(CollectionKind::Set))
            .build();
        assert!(missing.is_err());
        assert_eq!(store.lookup("Orphan"), None);
    }
}
