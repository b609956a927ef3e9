//! Constraint checks run on deserialized values.
//!
//! Checks read the same [`ValidationRule`] list the schema builder emits as
//! keywords, so the document and the runtime agree on what is valid.
//! `format` is an annotation only and is not checked here.

use std::collections::HashMap;
use std::sync::Mutex;

use modelspec::{PropertyMetadata, ValidationRule};
use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::trace;

use crate::context::MappingContext;
use crate::error::{MapperError, MapperResult};
use crate::value::Value;

/// Compiled `pattern` rules, shared across calls.
#[derive(Debug, Default)]
pub(crate) struct PatternCache {
    compiled: Mutex<HashMap<String, Regex>>,
}

impl PatternCache {
    fn is_match(&self, pattern: &str, text: &str) -> Result<bool, regex::Error> {
        let mut compiled = self
            .compiled
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(regex) = compiled.get(pattern) {
            return Ok(regex.is_match(text));
        }
        let regex = Regex::new(pattern)?;
        let matched = regex.is_match(text);
        trace!(pattern, "Compiled validation pattern");
        compiled.insert(pattern.to_string(), regex);
        Ok(matched)
    }
}

/// Fail if a required property is absent, or null without being nullable.
///
/// `key` is the property name as it appears in the input.
pub(crate) fn check_required(
    property: &PropertyMetadata,
    key: &str,
    value: Option<&Value>,
    ctx: &MappingContext,
) -> MapperResult<()> {
    if !property.required {
        return Ok(());
    }
    match value {
        None | Some(Value::Undefined) => Err(MapperError::validation(
            ctx.child_path(key),
            "required property is missing",
        )),
        Some(Value::Null) if !property.nullable => Err(MapperError::validation(
            ctx.child_path(key),
            "required property must not be null",
        )),
        _ => Ok(()),
    }
}

/// Check the constraint rules of a property against its value.
///
/// `ctx` points at the value itself. Item-count rules apply to the
/// collection; every other rule applies to each element.
pub(crate) fn check_rules(
    property: &PropertyMetadata,
    value: &Value,
    ctx: &mut MappingContext,
    patterns: &PatternCache,
) -> MapperResult<()> {
    if property.rules.is_empty() || value.is_nullish() {
        return Ok(());
    }

    let (collection_rules, element_rules): (Vec<_>, Vec<_>) = property
        .rules
        .iter()
        .partition(|rule| rule.is_collection_rule());

    match value {
        Value::Array(items) | Value::Set(items) if property.descriptor.is_collection() => {
            check_count(&collection_rules, items.len(), ctx)?;
            for (index, item) in items.iter().enumerate() {
                ctx.push_index(index);
                let result = check_scalar(&element_rules, item, ctx, patterns);
                ctx.pop();
                result?;
            }
            Ok(())
        }
        Value::Map(entries) if property.descriptor.is_collection() => {
            check_count(&collection_rules, entries.len(), ctx)?;
            for (key, item) in entries {
                ctx.push_key(key.as_str());
                let result = check_scalar(&element_rules, item, ctx, patterns);
                ctx.pop();
                result?;
            }
            Ok(())
        }
        _ => check_scalar(&element_rules, value, ctx, patterns),
    }
}

fn check_count(rules: &[&ValidationRule], len: usize, ctx: &MappingContext) -> MapperResult<()> {
    for rule in rules {
        match rule {
            ValidationRule::MinItems(min) if len < *min => {
                return Err(MapperError::validation(
                    ctx.path(),
                    format!("must contain at least {min} items"),
                ));
            }
            ValidationRule::MaxItems(max) if len > *max => {
                return Err(MapperError::validation(
                    ctx.path(),
                    format!("must contain at most {max} items"),
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

fn check_scalar(
    rules: &[&ValidationRule],
    value: &Value,
    ctx: &MappingContext,
    patterns: &PatternCache,
) -> MapperResult<()> {
    if value.is_nullish() {
        return Ok(());
    }
    for rule in rules {
        if let Some(message) = violation(rule, value, patterns) {
            return Err(MapperError::validation(ctx.path(), message));
        }
    }
    Ok(())
}

fn violation(rule: &ValidationRule, value: &Value, patterns: &PatternCache) -> Option<String> {
    if let Some(n) = value.as_f64() {
        match rule {
            ValidationRule::Minimum(min) if n < *min => {
                return Some(format!("must be greater than or equal to {min}"))
            }
            ValidationRule::Maximum(max) if n > *max => {
                return Some(format!("must be less than or equal to {max}"))
            }
            ValidationRule::ExclusiveMinimum(min) if n <= *min => {
                return Some(format!("must be greater than {min}"))
            }
            ValidationRule::ExclusiveMaximum(max) if n >= *max => {
                return Some(format!("must be less than {max}"))
            }
            ValidationRule::MultipleOf(step) if *step != 0.0 => {
                let ratio = n / step;
                if (ratio - ratio.round()).abs() > 1e-9 {
                    return Some(format!("must be a multiple of {step}"));
                }
            }
            _ => {}
        }
    }

    if let Some(text) = value.as_str() {
        let len = text.chars().count();
        match rule {
            ValidationRule::MinLength(min) if len < *min => {
                return Some(format!("must be at least {min} characters long"))
            }
            ValidationRule::MaxLength(max) if len > *max => {
                return Some(format!("must be at most {max} characters long"))
            }
            ValidationRule::Pattern(pattern) => match patterns.is_match(pattern, text) {
                Ok(true) => {}
                Ok(false) => return Some(format!("must match pattern {pattern}")),
                Err(err) => return Some(format!("invalid pattern {pattern}: {err}")),
            },
            _ => {}
        }
    }

    if let ValidationRule::Enum(allowed) = rule {
        if !allowed.iter().any(|candidate| same_literal(value, candidate)) {
            let listed: Vec<String> = allowed.iter().map(JsonValue::to_string).collect();
            return Some(format!("must be one of [{}]", listed.join(", ")));
        }
    }

    None
}

/// Compare a runtime scalar with a JSON literal; `1` equals `1.0`.
fn same_literal(value: &Value, literal: &JsonValue) -> bool {
    match (value, literal) {
        (Value::String(s), JsonValue::String(l)) => s == l,
        (Value::Bool(b), JsonValue::Bool(l)) => b == l,
        (Value::Integer(_) | Value::Float(_), JsonValue::Number(l)) => value.as_f64() == l.as_f64(),
        (Value::Null, JsonValue::Null) => true,
        _ => false,
    }
}
