//! Validation rule IR definitions.
//!
//! Each rule maps to exactly one JSON Schema keyword. Rules are kept as a
//! list on the property so that several independent annotation calls can
//! each contribute one constraint.

use std::mem;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::{json_number, JsonSchema};

/// Validation rule for properties and parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "value")]
pub enum ValidationRule {
    // ==========================================================================
    // Number Validations
    // ==========================================================================
    /// Inclusive lower bound: `minimum`
    Minimum(f64),

    /// Inclusive upper bound: `maximum`
    Maximum(f64),

    /// Exclusive lower bound: `exclusiveMinimum`
    ExclusiveMinimum(f64),

    /// Exclusive upper bound: `exclusiveMaximum`
    ExclusiveMaximum(f64),

    /// Value must be a multiple of: `multipleOf`
    MultipleOf(f64),

    // ==========================================================================
    // String Validations
    // ==========================================================================
    /// Minimum string length: `minLength`
    MinLength(usize),

    /// Maximum string length: `maxLength`
    MaxLength(usize),

    /// Regular expression: `pattern`
    Pattern(String),

    /// Format hint: `format`
    Format(String),

    // ==========================================================================
    // Generic Validations
    // ==========================================================================
    /// Allowed values: `enum`
    Enum(Vec<Value>),

    // ==========================================================================
    // Collection Validations
    // ==========================================================================
    /// Minimum number of items: `minItems`
    MinItems(usize),

    /// Maximum number of items: `maxItems`
    MaxItems(usize),
}

impl ValidationRule {
    /// JSON Schema keyword emitted for this rule.
    pub fn keyword(&self) -> &'static str {
        match self {
            ValidationRule::Minimum(_) => "minimum",
            ValidationRule::Maximum(_) => "maximum",
            ValidationRule::ExclusiveMinimum(_) => "exclusiveMinimum",
            ValidationRule::ExclusiveMaximum(_) => "exclusiveMaximum",
            ValidationRule::MultipleOf(_) => "multipleOf",
            ValidationRule::MinLength(_) => "minLength",
            ValidationRule::MaxLength(_) => "maxLength",
            ValidationRule::Pattern(_) => "pattern",
            ValidationRule::Format(_) => "format",
            ValidationRule::Enum(_) => "enum",
            ValidationRule::MinItems(_) => "minItems",
            ValidationRule::MaxItems(_) => "maxItems",
        }
    }

    /// Check if two rules constrain the same keyword.
    pub fn same_kind(&self, other: &ValidationRule) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }

    /// Check if the rule applies to the collection itself rather than its items.
    pub fn is_collection_rule(&self) -> bool {
        matches!(self, ValidationRule::MinItems(_) | ValidationRule::MaxItems(_))
    }

    /// Write the keyword into a schema node.
    pub fn apply(&self, schema: &mut JsonSchema) {
        match self {
            ValidationRule::Minimum(n) => schema.minimum = json_number(*n),
            ValidationRule::Maximum(n) => schema.maximum = json_number(*n),
            ValidationRule::ExclusiveMinimum(n) => schema.exclusive_minimum = json_number(*n),
            ValidationRule::ExclusiveMaximum(n) => schema.exclusive_maximum = json_number(*n),
            ValidationRule::MultipleOf(n) => schema.multiple_of = json_number(*n),
            ValidationRule::MinLength(n) => schema.min_length = Some(*n),
            ValidationRule::MaxLength(n) => schema.max_length = Some(*n),
            ValidationRule::Pattern(p) => schema.pattern = Some(p.clone()),
            ValidationRule::Format(f) => schema.format = Some(f.clone()),
            ValidationRule::Enum(values) => schema.enum_values = Some(values.clone()),
            ValidationRule::MinItems(n) => schema.min_items = Some(*n),
            ValidationRule::MaxItems(n) => schema.max_items = Some(*n),
        }
    }
}

/// Insert a rule, replacing any earlier rule of the same kind in place.
pub fn upsert_rule(rules: &mut Vec<ValidationRule>, rule: ValidationRule) {
    match rules.iter_mut().find(|r| r.same_kind(&rule)) {
        Some(existing) => *existing = rule,
        None => rules.push(rule),
    }
}
