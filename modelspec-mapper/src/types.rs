//! Type registry: conversion strategies for primitive and well-known types.
//!
//! Strategies are looked up by type key (`"Date"`, `"String"`, a class
//! name, ...). A missing entry means the engine falls back to its generic
//! object handling.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{Number, Value as JsonValue};
use tracing::{debug, trace};

use crate::context::MappingContext;
use crate::error::{MapperError, MapperResult};
use crate::value::{Symbol, Value};

/// Conversion strategy for one type.
pub trait TypeMapper: Send + Sync {
    /// Convert a runtime value into JSON.
    fn serialize(&self, value: &Value, ctx: &MappingContext) -> MapperResult<JsonValue>;

    /// Convert JSON into a runtime value.
    fn deserialize(&self, input: &JsonValue, ctx: &MappingContext) -> MapperResult<Value>;
}

/// Registry of conversion strategies keyed by type key.
#[derive(Clone)]
pub struct TypeRegistry {
    mappers: HashMap<String, Arc<dyn TypeMapper>>,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.mappers.keys().collect();
        keys.sort();
        f.debug_struct("TypeRegistry").field("types", &keys).finish()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("String", PrimitiveMapper::new(PrimitiveKind::String));
        registry.register("Number", PrimitiveMapper::new(PrimitiveKind::Number));
        registry.register("Integer", PrimitiveMapper::new(PrimitiveKind::Integer));
        registry.register("Boolean", PrimitiveMapper::new(PrimitiveKind::Boolean));
        registry.register("Date", DateMapper);
        registry.register("Symbol", SymbolMapper);
        registry
    }
}

impl TypeRegistry {
    /// Registry with the built-in strategies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry without any strategy.
    pub fn empty() -> Self {
        Self {
            mappers: HashMap::new(),
        }
    }

    /// Register or replace the strategy of a type key.
    pub fn register(&mut self, key: impl Into<String>, mapper: impl TypeMapper + 'static) {
        let key = key.into();
        trace!(type_key = %key, "Registering type mapper");
        self.mappers.insert(key, Arc::new(mapper));
    }

    /// Strategy of a type key.
    pub fn resolve(&self, key: &str) -> Option<Arc<dyn TypeMapper>> {
        self.mappers.get(key).cloned()
    }

    /// Check if a type key has a strategy.
    pub fn contains(&self, key: &str) -> bool {
        self.mappers.contains_key(key)
    }

    /// Remove the strategy of a type key.
    pub fn remove(&mut self, key: &str) -> bool {
        self.mappers.remove(key).is_some()
    }
}

// ============================================================================
// Primitive Mapper
// ============================================================================

/// JSON primitive targeted by a [`PrimitiveMapper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    String,
    Number,
    Integer,
    Boolean,
}

impl PrimitiveKind {
    fn name(self) -> &'static str {
        match self {
            PrimitiveKind::String => "String",
            PrimitiveKind::Number => "Number",
            PrimitiveKind::Integer => "Integer",
            PrimitiveKind::Boolean => "Boolean",
        }
    }
}

/// Strategy for strings, numbers, integers and booleans.
///
/// Outside strict mode, values of another primitive type are coerced when
/// the conversion is lossless (`"12"` to `12`, `1` to `true`, ...).
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveMapper {
    kind: PrimitiveKind,
}

impl PrimitiveMapper {
    /// Create a strategy for `kind`.
    pub fn new(kind: PrimitiveKind) -> Self {
        Self { kind }
    }

    fn exact(&self, input: &JsonValue) -> Option<Value> {
        match (self.kind, input) {
            (PrimitiveKind::String, JsonValue::String(s)) => Some(Value::String(s.clone())),
            (PrimitiveKind::Boolean, JsonValue::Bool(b)) => Some(Value::Bool(*b)),
            (PrimitiveKind::Number, JsonValue::Number(n)) => Some(number_value(n)),
            (PrimitiveKind::Integer, JsonValue::Number(n)) => n.as_i64().map(Value::Integer),
            _ => None,
        }
    }

    fn coerce(&self, input: &JsonValue) -> Option<Value> {
        match (self.kind, input) {
            (PrimitiveKind::String, JsonValue::Number(n)) => Some(Value::String(n.to_string())),
            (PrimitiveKind::String, JsonValue::Bool(b)) => Some(Value::String(b.to_string())),
            (PrimitiveKind::Number, JsonValue::String(s)) => {
                let s = s.trim();
                s.parse::<i64>()
                    .map(Value::Integer)
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(Value::Float))
            }
            (PrimitiveKind::Integer, JsonValue::String(s)) => {
                s.trim().parse::<i64>().ok().map(Value::Integer)
            }
            (PrimitiveKind::Integer, JsonValue::Number(n)) => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| Value::Integer(f as i64)),
            (PrimitiveKind::Boolean, JsonValue::String(s)) => match s.as_str() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            (PrimitiveKind::Boolean, JsonValue::Number(n)) => match n.as_i64() {
                Some(1) => Some(Value::Bool(true)),
                Some(0) => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        }
    }
}

impl TypeMapper for PrimitiveMapper {
    fn serialize(&self, value: &Value, ctx: &MappingContext) -> MapperResult<JsonValue> {
        match value {
            Value::String(s) => Ok(JsonValue::String(s.clone())),
            Value::Bool(b) => Ok(JsonValue::Bool(*b)),
            Value::Integer(n) => Ok(JsonValue::Number(Number::from(*n))),
            Value::Float(n) => Number::from_f64(*n)
                .map(JsonValue::Number)
                .ok_or_else(|| MapperError::cast(ctx.path(), self.kind.name(), n.to_string())),
            Value::Null | Value::Undefined => Ok(JsonValue::Null),
            other => Err(MapperError::cast(ctx.path(), self.kind.name(), other.kind())),
        }
    }

    fn deserialize(&self, input: &JsonValue, ctx: &MappingContext) -> MapperResult<Value> {
        if let Some(value) = self.exact(input) {
            return Ok(value);
        }
        if ctx.is_strict() {
            return Err(MapperError::cast(ctx.path(), self.kind.name(), input.to_string()));
        }
        match self.coerce(input) {
            Some(value) => {
                debug!(path = %ctx.path(), target = self.kind.name(), "Coerced primitive value");
                Ok(value)
            }
            None => Err(MapperError::cast(ctx.path(), self.kind.name(), input.to_string())),
        }
    }
}

fn number_value(n: &Number) -> Value {
    match n.as_i64() {
        Some(i) => Value::Integer(i),
        None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
    }
}

// ============================================================================
// Date Mapper
// ============================================================================

/// ISO-8601 strategy for dates: `2020-01-01T00:00:00.000Z`.
///
/// Whole milliseconds are written with three fraction digits; finer
/// instants keep all nine so that the value reads back unchanged.
/// Outside strict mode, epoch milliseconds are accepted on deserialize.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateMapper;

impl TypeMapper for DateMapper {
    fn serialize(&self, value: &Value, ctx: &MappingContext) -> MapperResult<JsonValue> {
        match value {
            Value::Date(date) => Ok(JsonValue::String(format_date(date))),
            Value::String(s) => Ok(JsonValue::String(s.clone())),
            Value::Null | Value::Undefined => Ok(JsonValue::Null),
            other => Err(MapperError::cast(ctx.path(), "Date", other.kind())),
        }
    }

    fn deserialize(&self, input: &JsonValue, ctx: &MappingContext) -> MapperResult<Value> {
        match input {
            JsonValue::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|date| Value::Date(date.with_timezone(&Utc)))
                .map_err(|_| MapperError::cast(ctx.path(), "Date", input.to_string())),
            JsonValue::Number(n) if !ctx.is_strict() => n
                .as_i64()
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
                .map(Value::Date)
                .ok_or_else(|| MapperError::cast(ctx.path(), "Date", input.to_string())),
            _ => Err(MapperError::cast(ctx.path(), "Date", input.to_string())),
        }
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    let precision = if date.timestamp_subsec_nanos() % 1_000_000 == 0 {
        SecondsFormat::Millis
    } else {
        SecondsFormat::Nanos
    };
    date.to_rfc3339_opts(precision, true)
}

// ============================================================================
// Symbol Mapper
// ============================================================================

/// Symbols serialize to their description.
///
/// Deserializing produces a fresh symbol with the same description; the
/// original identity cannot be recovered.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolMapper;

impl TypeMapper for SymbolMapper {
    fn serialize(&self, value: &Value, ctx: &MappingContext) -> MapperResult<JsonValue> {
        match value {
            Value::Symbol(symbol) => Ok(JsonValue::String(
                symbol.description().unwrap_or_default().to_string(),
            )),
            Value::String(s) => Ok(JsonValue::String(s.clone())),
            Value::Null | Value::Undefined => Ok(JsonValue::Null),
            other => Err(MapperError::cast(ctx.path(), "Symbol", other.kind())),
        }
    }

    fn deserialize(&self, input: &JsonValue, ctx: &MappingContext) -> MapperResult<Value> {
        match input {
            JsonValue::String(s) => Ok(Value::Symbol(Symbol::new(Some(s.clone())))),
            _ => Err(MapperError::cast(ctx.path(), "Symbol", input.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lenient() -> MappingContext {
        MappingContext::new(false)
    }

    fn strict() -> MappingContext {
        MappingContext::new(true)
    }

    #[test]
    fn test_builtins_registered() {
        let registry = TypeRegistry::new();
        for key in ["String", "Number", "Integer", "Boolean", "Date", "Symbol"] {
            assert!(registry.contains(key), "missing {key}");
        }
        assert!(registry.resolve("Object").is_none());
        assert!(TypeRegistry::empty().resolve("Date").is_none());
    }

    #[test]
    fn test_date_round_trip() {
        let mapper = DateMapper;
        let date = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

        let json = mapper.serialize(&Value::Date(date), &lenient()).unwrap();
        assert_eq!(json, json!("2020-01-01T00:00:00.000Z"));
        assert_eq!(mapper.deserialize(&json, &lenient()).unwrap(), Value::Date(date));
    }

    #[test]
    fn test_date_keeps_sub_millisecond_precision() {
        let mapper = DateMapper;
        let date = Utc.timestamp_opt(1_577_836_800, 123_456_789).unwrap();

        let json = mapper.serialize(&Value::Date(date), &lenient()).unwrap();
        assert_eq!(json, json!("2020-01-01T00:00:00.123456789Z"));
        assert_eq!(mapper.deserialize(&json, &lenient()).unwrap(), Value::Date(date));

        let millis = Utc.timestamp_opt(1_577_836_800, 123_000_000).unwrap();
        let json = mapper.serialize(&Value::Date(millis), &lenient()).unwrap();
        assert_eq!(json, json!("2020-01-01T00:00:00.123Z"));
    }

    #[test]
    fn test_date_from_millis() {
        let mapper = DateMapper;
        let expected = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            mapper.deserialize(&json!(1577836800000i64), &lenient()).unwrap(),
            Value::Date(expected)
        );
        assert!(mapper.deserialize(&json!(1577836800000i64), &strict()).is_err());
        assert!(mapper.deserialize(&json!("yesterday"), &lenient()).is_err());
    }

    #[test]
    fn test_number_coercion() {
        let mapper = PrimitiveMapper::new(PrimitiveKind::Number);
        assert_eq!(mapper.deserialize(&json!(12), &lenient()).unwrap(), Value::Integer(12));
        assert_eq!(mapper.deserialize(&json!(1.5), &lenient()).unwrap(), Value::Float(1.5));
        assert_eq!(mapper.deserialize(&json!("12"), &lenient()).unwrap(), Value::Integer(12));
        assert_eq!(mapper.deserialize(&json!("1.25"), &lenient()).unwrap(), Value::Float(1.25));

        let err = mapper.deserialize(&json!("abc"), &lenient()).unwrap_err();
        assert_eq!(err, MapperError::cast("$", "Number", "\"abc\""));
        assert!(mapper.deserialize(&json!("12"), &strict()).is_err());
    }

    #[test]
    fn test_integer_coercion() {
        let mapper = PrimitiveMapper::new(PrimitiveKind::Integer);
        assert_eq!(mapper.deserialize(&json!(4.0), &lenient()).unwrap(), Value::Integer(4));
        assert!(mapper.deserialize(&json!(4.5), &lenient()).is_err());
    }

    #[test]
    fn test_boolean_and_string_coercion() {
        let boolean = PrimitiveMapper::new(PrimitiveKind::Boolean);
        assert_eq!(boolean.deserialize(&json!("true"), &lenient()).unwrap(), Value::Bool(true));
        assert_eq!(boolean.deserialize(&json!(0), &lenient()).unwrap(), Value::Bool(false));
        assert!(boolean.deserialize(&json!("yes"), &lenient()).is_err());

        let string = PrimitiveMapper::new(PrimitiveKind::String);
        assert_eq!(string.deserialize(&json!(7), &lenient()).unwrap(), Value::from("7"));
        assert!(string.deserialize(&json!({}), &lenient()).is_err());
    }

    #[test]
    fn test_symbol_is_one_way() {
        let mapper = SymbolMapper;
        let symbol = Symbol::new(Some("token".into()));
        let json = mapper.serialize(&Value::Symbol(symbol.clone()), &lenient()).unwrap();
        assert_eq!(json, json!("token"));

        match mapper.deserialize(&json, &lenient()).unwrap() {
            Value::Symbol(restored) => {
                assert_eq!(restored.description(), Some("token"));
                assert_ne!(restored, symbol);
            }
            other => panic!("expected symbol, got {other:?}"),
        }
    }

    #[test]
    fn test_override_strategy() {
        struct EpochMillis;
        impl TypeMapper for EpochMillis {
            fn serialize(&self, value: &Value, ctx: &MappingContext) -> MapperResult<JsonValue> {
                match value {
                    Value::Date(date) => Ok(json!(date.timestamp_millis())),
                    other => Err(MapperError::cast(ctx.path(), "Date", other.kind())),
                }
            }
            fn deserialize(&self, input: &JsonValue, ctx: &MappingContext) -> MapperResult<Value> {
                DateMapper.deserialize(input, ctx)
            }
        }

        let mut registry = TypeRegistry::new();
        registry.register("Date", EpochMillis);
        let mapper = registry.resolve("Date").unwrap();
        let date = Utc.timestamp_millis_opt(1000).unwrap();
        assert_eq!(mapper.serialize(&Value::Date(date), &lenient()).unwrap(), json!(1000));
    }
}
