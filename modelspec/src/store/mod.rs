//! Entity store: the registry of class and property metadata.
//!
//! The store owns one entry per registered class. Merged views over the
//! inheritance chain are derived lazily and cached until the next
//! registration touches the store.
//!
//! # Example
//! ```rust
//! use modelspec::{EntityStore, PropertyOptions};
//!
//! let mut store = EntityStore::new();
//! let base = store.register_class("Base");
//! store.register_property(base, "id", PropertyOptions::new().string()).unwrap();
//!
//! let child = store.register_class("Child");
//! store.extend(child, base).unwrap();
//! store.register_property(child, "name", PropertyOptions::new().string()).unwrap();
//!
//! let meta = store.class_metadata(child).unwrap();
//! let keys: Vec<_> = meta.properties.keys().cloned().collect();
//! assert_eq!(keys, ["id", "name"]);
//! ```

mod builder;

use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, trace};

use crate::error::{SchemaError, SchemaResult};
use crate::ir::{ClassId, ClassMetadata, CollectionKind, PropertyMetadata, ValidationRule};

pub use builder::{ModelBuilder, PropertyOptions};

/// Metadata declared directly on one class.
#[derive(Debug, Clone, Default)]
struct ClassEntry {
    name: String,
    parent: Option<ClassId>,
    own: IndexMap<String, PropertyMetadata>,
    title: Option<String>,
    description: Option<String>,
    discriminator_key: Option<String>,
    discriminator_value: Option<String>,
    additional_properties: Option<bool>,
}

/// Registry of model metadata.
///
/// Registration needs `&mut self`; reads take `&self` and may run from
/// several threads once the store is shared behind an `Arc`.
#[derive(Debug, Default)]
pub struct EntityStore {
    entries: Vec<ClassEntry>,
    cache: DashMap<ClassId, Arc<ClassMetadata>>,
}

impl EntityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register a class and return its identity.
    ///
    /// Names are not unique: registering the same name twice yields two
    /// distinct classes.
    pub fn register_class(&mut self, name: impl Into<String>) -> ClassId {
        let id = ClassId::from_raw(self.entries.len() as u32);
        let name = name.into();
        trace!(class = %id, name = %name, "Registering class");
        self.entries.push(ClassEntry {
            name,
            ..ClassEntry::default()
        });
        id
    }

    /// Register a class and declare it fluently.
    pub fn define(&mut self, name: impl AsRef<str>) -> ModelBuilder<'_> {
        ModelBuilder::new(self, name.as_ref())
    }

    /// Make `child` inherit the properties of `parent`.
    pub fn extend(&mut self, child: ClassId, parent: ClassId) -> SchemaResult<()> {
        self.entry(parent)?;
        let child_name = self.entry(child)?.name.clone();

        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(SchemaError::InheritanceCycle { class: child_name });
            }
            cursor = self.entry(current)?.parent;
        }

        trace!(class = %child, parent = %parent, "Registering parent class");
        self.entry_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Register or merge the metadata of a property.
    ///
    /// Repeated calls for the same key accumulate: fields set by a later
    /// call override earlier ones and rules of the same kind are replaced.
    pub fn register_property(
        &mut self,
        class: ClassId,
        key: impl Into<String>,
        options: PropertyOptions,
    ) -> SchemaResult<()> {
        let key = key.into();
        let class_name = self.entry(class)?.name.clone();
        Self::check_options(&class_name, &key, &options)?;

        trace!(class = %class_name, property = %key, "Registering property");
        let entry = self.entry_mut(class)?;
        match entry.own.get_mut(&key) {
            Some(existing) => options.merge_into(existing),
            None => {
                let metadata = options.into_metadata(&key);
                entry.own.insert(key, metadata);
            }
        }
        Ok(())
    }

    /// Set the class description.
    pub fn set_description(
        &mut self,
        class: ClassId,
        description: impl Into<String>,
    ) -> SchemaResult<()> {
        self.entry_mut(class)?.description = Some(description.into());
        Ok(())
    }

    /// Set the class title.
    pub fn set_title(&mut self, class: ClassId, title: impl Into<String>) -> SchemaResult<()> {
        self.entry_mut(class)?.title = Some(title.into());
        Ok(())
    }

    /// Declare the discriminator property of a polymorphic base.
    pub fn set_discriminator_key(
        &mut self,
        class: ClassId,
        key: impl Into<String>,
    ) -> SchemaResult<()> {
        self.entry_mut(class)?.discriminator_key = Some(key.into());
        Ok(())
    }

    /// Declare the discriminator value identifying a class.
    pub fn set_discriminator_value(
        &mut self,
        class: ClassId,
        value: impl Into<String>,
    ) -> SchemaResult<()> {
        self.entry_mut(class)?.discriminator_value = Some(value.into());
        Ok(())
    }

    /// Open or close a class to unknown keys.
    pub fn set_additional_properties(&mut self, class: ClassId, allowed: bool) -> SchemaResult<()> {
        self.entry_mut(class)?.additional_properties = Some(allowed);
        Ok(())
    }

    /// Remove `class` if it is the most recent registration.
    pub(crate) fn discard_last(&mut self, class: ClassId) {
        if class.index() + 1 == self.entries.len() {
            trace!(class = %class, "Discarding class declaration");
            self.entries.pop();
            self.cache.clear();
        }
    }

    /// Drop every class and cached view.
    pub fn reset(&mut self) {
        debug!(classes = self.entries.len(), "Resetting entity store");
        self.entries.clear();
        self.cache.clear();
    }

    // ==========================================================================
    // Queries
    // ==========================================================================

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no class is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if the identifier belongs to this store.
    pub fn contains(&self, class: ClassId) -> bool {
        class.index() < self.entries.len()
    }

    /// Name of a class.
    pub fn class_name(&self, class: ClassId) -> SchemaResult<&str> {
        Ok(&self.entry(class)?.name)
    }

    /// Direct parent of a class.
    pub fn parent(&self, class: ClassId) -> SchemaResult<Option<ClassId>> {
        Ok(self.entry(class)?.parent)
    }

    /// Most recently registered class with the given name.
    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        self.entries
            .iter()
            .rposition(|entry| entry.name == name)
            .map(|index| ClassId::from_raw(index as u32))
    }

    /// Iterate over every registered class identity.
    pub fn ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.entries.len()).map(|index| ClassId::from_raw(index as u32))
    }

    /// Check if `class` is `ancestor` or inherits from it.
    pub fn is_subclass_of(&self, class: ClassId, ancestor: ClassId) -> bool {
        let mut cursor = Some(class);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.entries.get(current.index()).and_then(|e| e.parent);
        }
        false
    }

    /// Descendants of `base` that declare a discriminator value, in
    /// registration order.
    pub fn discriminator_children(&self, base: ClassId) -> Vec<(String, ClassId)> {
        self.ids()
            .filter(|&id| id != base && self.is_subclass_of(id, base))
            .filter_map(|id| {
                self.entries[id.index()]
                    .discriminator_value
                    .clone()
                    .map(|value| (value, id))
            })
            .collect()
    }

    /// Merged metadata of a class over its inheritance chain.
    ///
    /// Parent properties come first. A child property with the same key
    /// replaces the parent's in place.
    pub fn class_metadata(&self, class: ClassId) -> SchemaResult<Arc<ClassMetadata>> {
        if let Some(cached) = self.cache.get(&class) {
            return Ok(Arc::clone(cached.value()));
        }

        let metadata = Arc::new(self.synthesize(class)?);
        let stored = self.cache.entry(class).or_insert(metadata);
        Ok(Arc::clone(stored.value()))
    }

    fn synthesize(&self, class: ClassId) -> SchemaResult<ClassMetadata> {
        let entry = self.entry(class)?;

        let mut chain = vec![class];
        let mut cursor = entry.parent;
        while let Some(parent) = cursor {
            chain.push(parent);
            cursor = self.entry(parent)?.parent;
        }

        let mut properties = IndexMap::new();
        let mut discriminator_key = None;
        let mut additional_properties = None;
        for id in chain.iter().rev() {
            let link = self.entry(*id)?;
            for (key, property) in &link.own {
                properties.insert(key.clone(), property.clone());
            }
            discriminator_key = link.discriminator_key.clone().or(discriminator_key);
            additional_properties = link.additional_properties.or(additional_properties);
        }

        if entry.discriminator_value.is_some() && discriminator_key.is_none() {
            return Err(SchemaError::invalid(
                &entry.name,
                "*",
                "discriminator value declared without a discriminator key",
            ));
        }

        debug!(
            class = %entry.name,
            properties = properties.len(),
            depth = chain.len(),
            "Synthesized class metadata"
        );

        Ok(ClassMetadata {
            id: class,
            name: entry.name.clone(),
            parent: entry.parent,
            title: entry.title.clone(),
            description: entry.description.clone(),
            properties,
            discriminator_key,
            discriminator_value: entry.discriminator_value.clone(),
            additional_properties,
        })
    }

    // ==========================================================================
    // Internals
    // ==========================================================================

    fn entry(&self, class: ClassId) -> SchemaResult<&ClassEntry> {
        self.entries
            .get(class.index())
            .ok_or(SchemaError::UnknownClass(class))
    }

    fn entry_mut(&mut self, class: ClassId) -> SchemaResult<&mut ClassEntry> {
        self.cache.clear();
        self.entries
            .get_mut(class.index())
            .ok_or(SchemaError::UnknownClass(class))
    }

    fn check_options(class: &str, key: &str, options: &PropertyOptions) -> SchemaResult<()> {
        if options.collection == Some(CollectionKind::Set) {
            return Err(SchemaError::unsupported(CollectionKind::Set.name(), class, key));
        }
        for rule in &options.rules {
            if let ValidationRule::Pattern(pattern) = rule {
                Regex::new(pattern).map_err(|err| {
                    SchemaError::invalid(class, key, format!("invalid pattern: {err}"))
                })?;
            }
        }
        Ok(())
    }
}
