//! Lifecycle hooks.
//!
//! Hooks are registered per class and apply to subclasses unless a
//! subclass registers its own. Class-level hooks may reject a value by
//! returning `Err(message)`; the engine reports it as
//! [`MapperError::Hook`](crate::MapperError::Hook) at the current path.
//!
//! | Hook | Runs | Receives |
//! |------|------|----------|
//! | `before_deserialize` | before a class is read | raw JSON object |
//! | `after_deserialize` | after a class is read | built instance |
//! | `after_serialize` | after a class is written | JSON object |
//! | `on_serialize` | per property, before writing | runtime value |
//! | `on_deserialize` | per property, after reading | runtime value |

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use modelspec::{ClassId, EntityStore};
use serde_json::{Map, Value as JsonValue};

use crate::value::{Instance, Value};

pub type BeforeDeserializeHook = Arc<dyn Fn(JsonValue) -> Result<JsonValue, String> + Send + Sync>;
pub type AfterDeserializeHook = Arc<dyn Fn(Instance) -> Result<Instance, String> + Send + Sync>;
pub type AfterSerializeHook =
    Arc<dyn Fn(Map<String, JsonValue>) -> Result<Map<String, JsonValue>, String> + Send + Sync>;

/// Per-property transform. Returning `None` drops the value.
pub type PropertyHook = Arc<dyn Fn(Value) -> Option<Value> + Send + Sync>;

/// Registered lifecycle hooks.
#[derive(Clone, Default)]
pub struct HookSet {
    before_deserialize: HashMap<ClassId, BeforeDeserializeHook>,
    after_deserialize: HashMap<ClassId, AfterDeserializeHook>,
    after_serialize: HashMap<ClassId, AfterSerializeHook>,
    on_serialize: HashMap<(ClassId, String), PropertyHook>,
    on_deserialize: HashMap<(ClassId, String), PropertyHook>,
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSet")
            .field("before_deserialize", &self.before_deserialize.len())
            .field("after_deserialize", &self.after_deserialize.len())
            .field("after_serialize", &self.after_serialize.len())
            .field("on_serialize", &self.on_serialize.len())
            .field("on_deserialize", &self.on_deserialize.len())
            .finish()
    }
}

impl HookSet {
    /// Create an empty hook set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite raw JSON before it is deserialized as `class`.
    pub fn before_deserialize<F>(&mut self, class: ClassId, hook: F) -> &mut Self
    where
        F: Fn(JsonValue) -> Result<JsonValue, String> + Send + Sync + 'static,
    {
        self.before_deserialize.insert(class, Arc::new(hook));
        self
    }

    /// Post-process each instance of `class` after deserialization.
    pub fn after_deserialize<F>(&mut self, class: ClassId, hook: F) -> &mut Self
    where
        F: Fn(Instance) -> Result<Instance, String> + Send + Sync + 'static,
    {
        self.after_deserialize.insert(class, Arc::new(hook));
        self
    }

    /// Post-process the JSON object produced for `class`.
    pub fn after_serialize<F>(&mut self, class: ClassId, hook: F) -> &mut Self
    where
        F: Fn(Map<String, JsonValue>) -> Result<Map<String, JsonValue>, String>
            + Send
            + Sync
            + 'static,
    {
        self.after_serialize.insert(class, Arc::new(hook));
        self
    }

    /// Transform one property value before it is written. Returning `None` drops the key.
    pub fn on_serialize<F>(&mut self, class: ClassId, property: impl Into<String>, hook: F) -> &mut Self
    where
        F: Fn(Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.on_serialize.insert((class, property.into()), Arc::new(hook));
        self
    }

    /// Transform one property value after it is read. Returning `None` leaves it unset.
    pub fn on_deserialize<F>(&mut self, class: ClassId, property: impl Into<String>, hook: F) -> &mut Self
    where
        F: Fn(Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.on_deserialize.insert((class, property.into()), Arc::new(hook));
        self
    }

    /// Check if no hook is registered.
    pub fn is_empty(&self) -> bool {
        self.before_deserialize.is_empty()
            && self.after_deserialize.is_empty()
            && self.after_serialize.is_empty()
            && self.on_serialize.is_empty()
            && self.on_deserialize.is_empty()
    }

    /// Remove every registered hook.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    // ==========================================================================
    // Resolution
    // ==========================================================================

    pub(crate) fn find_before_deserialize(
        &self,
        store: &EntityStore,
        class: ClassId,
    ) -> Option<&BeforeDeserializeHook> {
        nearest(store, class, |id| self.before_deserialize.get(&id))
    }

    pub(crate) fn find_after_deserialize(
        &self,
        store: &EntityStore,
        class: ClassId,
    ) -> Option<&AfterDeserializeHook> {
        nearest(store, class, |id| self.after_deserialize.get(&id))
    }

    pub(crate) fn find_after_serialize(
        &self,
        store: &EntityStore,
        class: ClassId,
    ) -> Option<&AfterSerializeHook> {
        nearest(store, class, |id| self.after_serialize.get(&id))
    }

    pub(crate) fn find_on_serialize(
        &self,
        store: &EntityStore,
        class: ClassId,
        property: &str,
    ) -> Option<&PropertyHook> {
        if self.on_serialize.is_empty() {
            return None;
        }
        nearest(store, class, |id| {
            self.on_serialize.get(&(id, property.to_string()))
        })
    }

    pub(crate) fn find_on_deserialize(
        &self,
        store: &EntityStore,
        class: ClassId,
        property: &str,
    ) -> Option<&PropertyHook> {
        if self.on_deserialize.is_empty() {
            return None;
        }
        nearest(store, class, |id| {
            self.on_deserialize.get(&(id, property.to_string()))
        })
    }
}

/// Walk from `class` up its parents and return the first hit.
fn nearest<'a, T>(
    store: &EntityStore,
    class: ClassId,
    get: impl Fn(ClassId) -> Option<&'a T>,
) -> Option<&'a T> {
    let mut cursor = Some(class);
    while let Some(id) = cursor {
        if let Some(found) = get(id) {
            return Some(found);
        }
        cursor = store.parent(id).ok().flatten();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subclass_inherits_hook() {
        let mut store = EntityStore::new();
        let base = store.register_class("Base");
        let child = store.register_class("Child");
        store.extend(child, base).unwrap();

        let mut hooks = HookSet::new();
        hooks.before_deserialize(base, |mut input| {
            input["seen"] = json!(true);
            Ok(input)
        });

        let hook = hooks.find_before_deserialize(&store, child).unwrap();
        assert_eq!(hook(json!({})).unwrap(), json!({"seen": true}));
    }

    #[test]
    fn test_subclass_hook_wins() {
        let mut store = EntityStore::new();
        let base = store.register_class("Base");
        let child = store.register_class("Child");
        store.extend(child, base).unwrap();

        let mut hooks = HookSet::new();
        hooks
            .on_serialize(base, "name", |_| Some(Value::from("base")))
            .on_serialize(child, "name", |_| Some(Value::from("child")));

        let hook = hooks.find_on_serialize(&store, child, "name").unwrap();
        assert_eq!(hook(Value::Null), Some(Value::from("child")));
        let hook = hooks.find_on_serialize(&store, base, "name").unwrap();
        assert_eq!(hook(Value::Null), Some(Value::from("base")));
        assert!(hooks.find_on_serialize(&store, child, "other").is_none());
    }

    #[test]
    fn test_clear() {
        let mut hooks = HookSet::new();
        assert!(hooks.is_empty());
        hooks.after_deserialize(ClassId::from_raw(0), |instance| Ok(instance));
        assert!(!hooks.is_empty());
        hooks.clear();
        assert!(hooks.is_empty());
    }
}
