//! Runtime value model.
//!
//! [`Value`] is the typed object graph the mapper produces on deserialize
//! and consumes on serialize. Unlike `serde_json::Value` it distinguishes
//! an absent value from `null`, keeps integers apart from floats, and has
//! native dates, symbols and class instances.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use modelspec::ClassId;
use serde_json::Value as JsonValue;

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);

/// A unique token with an optional description.
///
/// Two symbols are equal only if they are the same symbol; equal
/// descriptions do not make symbols equal.
#[derive(Debug, Clone)]
pub struct Symbol {
    id: u64,
    description: Option<String>,
}

impl Symbol {
    /// Create a fresh symbol.
    pub fn new(description: Option<String>) -> Self {
        Self {
            id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
            description,
        }
    }

    /// Description of the symbol.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description.as_deref().unwrap_or(""))
    }
}

/// An object tagged with the class it was mapped against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instance {
    /// Class of the object; `None` for plain objects
    pub class: Option<ClassId>,
    /// Fields keyed by model key
    pub fields: IndexMap<String, Value>,
}

impl Instance {
    /// Create an empty instance of a class.
    pub fn new(class: ClassId) -> Self {
        Self {
            class: Some(class),
            fields: IndexMap::new(),
        }
    }

    /// Create an empty plain object.
    pub fn plain() -> Self {
        Self::default()
    }

    /// Set a field.
    #[must_use = "This method returns a new Instance and does not modify self"]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Set a field in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Read a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Remove a field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }
}

/// Runtime value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Date(DateTime<Utc>),
    Symbol(Symbol),
    Array(Vec<Value>),
    /// Unordered unique collection, emitted as an array
    Set(Vec<Value>),
    /// String-keyed map
    Map(IndexMap<String, Value>),
    /// Class instance or plain object
    Object(Instance),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Symbol(_) => "symbol",
            Value::Array(_) => "array",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }

    /// Check if the value is absent or null.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Numeric value of integers and floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// String slice of string values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The instance behind an object value.
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// Convert untyped JSON into a runtime value.
    ///
    /// Objects become plain instances; integral numbers stay integers.
    pub fn from_json(input: &JsonValue) -> Value {
        match input {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(items) => Value::Array(items.iter().map(Value::from_json).collect()),
            JsonValue::Object(map) => Value::Object(Instance {
                class: None,
                fields: map
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            }),
        }
    }
}

/// Describe a JSON value's shape for error messages.
pub(crate) fn json_kind(input: &JsonValue) -> &'static str {
    match input {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Date(value)
    }
}

impl From<Symbol> for Value {
    fn from(value: Symbol) -> Self {
        Value::Symbol(value)
    }
}

impl From<Instance> for Value {
    fn from(value: Instance) -> Self {
        Value::Object(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(value: IndexMap<String, Value>) -> Self {
        Value::Map(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_symbols_compare_by_identity() {
        let a = Symbol::new(Some("token".into()));
        let b = Symbol::new(Some("token".into()));
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.to_string(), "Symbol(token)");
    }

    #[test]
    fn test_from_json_keeps_number_kinds() {
        assert_eq!(Value::from_json(&json!(3)), Value::Integer(3));
        assert_eq!(Value::from_json(&json!(3.5)), Value::Float(3.5));
        assert_eq!(
            Value::from_json(&json!({"a": [true, null]})),
            Value::Object(Instance::plain().with(
                "a",
                Value::Array(vec![Value::Bool(true), Value::Null])
            ))
        );
    }

    #[test]
    fn test_instance_fields() {
        let class = ClassId::from_raw(0);
        let mut instance = Instance::new(class).with("name", "Ada").with("age", 36);
        assert_eq!(instance.get("name"), Some(&Value::from("Ada")));
        assert_eq!(instance.remove("age"), Some(Value::Integer(36)));
        instance.set("nick", Option::<String>::None);
        assert_eq!(instance.get("nick"), Some(&Value::Null));
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Value::Undefined.kind(), "undefined");
        assert_eq!(Value::Set(vec![]).kind(), "set");
        assert!(Value::Null.is_nullish());
        assert_eq!(Value::Integer(2).as_f64(), Some(2.0));
    }
}
