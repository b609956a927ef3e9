//! Deep merge of JSON documents.
//!
//! Objects merge key by key, arrays merge element by element through a
//! reducer selected by the key holding the array, and scalars from the
//! overlay win. The spec generator uses this to lay a generated document
//! over a user-provided base.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

/// Folds one overlay element into the merged array.
pub type MergeReducer = Arc<dyn Fn(&mut Vec<Value>, Value, &DeepMergeOptions) + Send + Sync>;

/// Options of [`deep_merge`].
#[derive(Clone, Default)]
pub struct DeepMergeOptions {
    /// Array reducers keyed by the object key holding the array; `"default"`
    /// applies to every other key.
    pub reducers: HashMap<String, MergeReducer>,
    /// Drop keys whose merged value is null.
    pub clean_undefined_props: bool,
}

impl fmt::Debug for DeepMergeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.reducers.keys().collect();
        keys.sort();
        f.debug_struct("DeepMergeOptions")
            .field("reducers", &keys)
            .field("clean_undefined_props", &self.clean_undefined_props)
            .finish()
    }
}

impl DeepMergeOptions {
    /// Create options with the identity reducer everywhere.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `reducer` for arrays stored under `key`.
    #[must_use = "This method returns a new DeepMergeOptions and does not modify self"]
    pub fn with_reducer(mut self, key: impl Into<String>, reducer: MergeReducer) -> Self {
        self.reducers.insert(key.into(), reducer);
        self
    }

    /// Drop keys whose merged value is null.
    #[must_use = "This method returns a new DeepMergeOptions and does not modify self"]
    pub fn clean_undefined_props(mut self, enabled: bool) -> Self {
        self.clean_undefined_props = enabled;
        self
    }

    fn reducer(&self, parent_key: Option<&str>) -> Option<&MergeReducer> {
        parent_key
            .and_then(|key| self.reducers.get(key))
            .or_else(|| self.reducers.get("default"))
    }
}

/// Build a reducer that merges an overlay element into the first element
/// `matches` pairs it with, or appends it when none does.
pub fn merge_reducer_by<F>(matches: F) -> MergeReducer
where
    F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
{
    Arc::new(move |collection, value, options| {
        match collection.iter().position(|item| matches(item, &value)) {
            Some(index) => {
                let merged = deep_merge(&collection[index], &value, options);
                collection[index] = merged;
            }
            None => collection.push(value),
        }
    })
}

/// Reducer pairing objects whose `field` values are equal.
pub fn merge_by_field(field: &'static str) -> MergeReducer {
    merge_reducer_by(move |item, value| match (item.get(field), value.get(field)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    })
}

fn default_reduce(collection: &mut Vec<Value>, value: Value, options: &DeepMergeOptions) {
    match collection.iter().position(|item| *item == value) {
        Some(index) => {
            let merged = deep_merge(&collection[index], &value, options);
            collection[index] = merged;
        }
        None => collection.push(value),
    }
}

/// Merge `obj` over `source`.
///
/// Null and empty-string overlays keep the source value. Arrays are folded
/// element by element, objects are merged recursively, and any other
/// overlay value replaces the source.
pub fn deep_merge(source: &Value, obj: &Value, options: &DeepMergeOptions) -> Value {
    merge_at(source, obj, options, None)
}

fn merge_at(
    source: &Value,
    obj: &Value,
    options: &DeepMergeOptions,
    parent_key: Option<&str>,
) -> Value {
    match obj {
        Value::Null => return source.clone(),
        Value::String(s) if s.is_empty() && !source.is_null() => return source.clone(),
        _ => {}
    }

    match (source, obj) {
        (Value::Array(items), _) => {
            let mut out = items.clone();
            let overlay = match obj {
                Value::Array(values) => values.clone(),
                other => vec![other.clone()],
            };
            for value in overlay {
                match options.reducer(parent_key) {
                    Some(reducer) => reducer(&mut out, value, options),
                    None => default_reduce(&mut out, value, options),
                }
            }
            Value::Array(out)
        }
        (Value::Object(left), Value::Object(right)) => {
            let mut out = Map::new();
            let keys = left.keys().chain(right.keys().filter(|k| !left.contains_key(*k)));
            for key in keys {
                let merged = match (left.get(key), right.get(key)) {
                    (Some(a), Some(b)) => merge_at(a, b, options, Some(key)),
                    (Some(a), None) => a.clone(),
                    (None, Some(b)) => b.clone(),
                    (None, None) => continue,
                };
                if options.clean_undefined_props && merged.is_null() {
                    continue;
                }
                out.insert(key.clone(), merged);
            }
            Value::Object(out)
        }
        _ => obj.clone(),
    }
}
