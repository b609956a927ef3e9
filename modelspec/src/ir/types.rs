//! Type IR definitions.
//!
//! Rust has no runtime reflection over user classes, so every property is
//! declared with an explicit [`TypeDescriptor`]: an element type plus an
//! optional collection wrapper.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a registered class.
///
/// Two classes may share a name; they never share a `ClassId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassId(u32);

impl ClassId {
    /// Build an identifier from its raw index.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw index inside the owning store.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element type of a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum PropertyType {
    // ==========================================================================
    // Primitives
    // ==========================================================================
    /// String
    String,

    /// Floating point number
    Number,

    /// Integer number
    Integer,

    /// Boolean
    Boolean,

    // ==========================================================================
    // Well-known types
    // ==========================================================================
    /// Instant in time, ISO-8601 on the wire
    Date,

    /// Symbol, serialized as its description
    Symbol,

    /// Anything; no schema constraint and no conversion
    Any,

    // ==========================================================================
    // References
    // ==========================================================================
    /// Nested model
    Model(ClassId),

    /// Composition of several member types under `allOf`/`anyOf`/`oneOf`
    Composite {
        /// Composition keyword
        mode: Composition,
        /// Member types
        members: Vec<PropertyType>,
    },

    /// Polymorphic reference resolved through the base class discriminator
    Discriminated(ClassId),
}

impl PropertyType {
    /// Key used to look up a strategy in the type registry.
    pub fn type_key(&self) -> &'static str {
        match self {
            PropertyType::String => "String",
            PropertyType::Number => "Number",
            PropertyType::Integer => "Integer",
            PropertyType::Boolean => "Boolean",
            PropertyType::Date => "Date",
            PropertyType::Symbol => "Symbol",
            PropertyType::Any => "Any",
            PropertyType::Model(_)
            | PropertyType::Composite { .. }
            | PropertyType::Discriminated(_) => "Object",
        }
    }

    /// Check if this is a primitive JSON type.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            PropertyType::String
                | PropertyType::Number
                | PropertyType::Integer
                | PropertyType::Boolean
        )
    }

    /// The referenced model, if this is a plain model reference.
    pub fn model(&self) -> Option<ClassId> {
        match self {
            PropertyType::Model(id) => Some(*id),
            _ => None,
        }
    }

    /// Create an `allOf` composition.
    pub fn all_of(members: impl IntoIterator<Item = PropertyType>) -> Self {
        PropertyType::Composite {
            mode: Composition::AllOf,
            members: members.into_iter().collect(),
        }
    }

    /// Create an `anyOf` composition.
    pub fn any_of(members: impl IntoIterator<Item = PropertyType>) -> Self {
        PropertyType::Composite {
            mode: Composition::AnyOf,
            members: members.into_iter().collect(),
        }
    }

    /// Create a `oneOf` composition.
    pub fn one_of(members: impl IntoIterator<Item = PropertyType>) -> Self {
        PropertyType::Composite {
            mode: Composition::OneOf,
            members: members.into_iter().collect(),
        }
    }
}

/// Composition keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Composition {
    /// Value matches every member
    AllOf,
    /// Value matches at least one member
    AnyOf,
    /// Value matches exactly one member
    OneOf,
}

/// Collection wrapper around an element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Ordered list, `type: array`
    Array,
    /// String-keyed map, `type: object` with `additionalProperties`
    Map,
    /// Unordered unique collection; rejected at registration
    Set,
}

impl CollectionKind {
    /// Human-readable name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            CollectionKind::Array => "Array",
            CollectionKind::Map => "Map",
            CollectionKind::Set => "Set",
        }
    }
}

/// Statically declared type of a property, parameter or mapping target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Element type
    pub ty: PropertyType,

    /// Optional collection wrapper
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<CollectionKind>,
}

impl TypeDescriptor {
    /// Descriptor for a single value of the given type.
    pub fn new(ty: PropertyType) -> Self {
        Self {
            ty,
            collection: None,
        }
    }

    /// Descriptor for a single model instance.
    pub fn model(id: ClassId) -> Self {
        Self::new(PropertyType::Model(id))
    }

    /// Descriptor for an array of the given type.
    pub fn array(ty: PropertyType) -> Self {
        Self {
            ty,
            collection: Some(CollectionKind::Array),
        }
    }

    /// Descriptor for a string-keyed map of the given type.
    pub fn map(ty: PropertyType) -> Self {
        Self {
            ty,
            collection: Some(CollectionKind::Map),
        }
    }

    /// Check if the descriptor wraps its element type in a collection.
    pub fn is_collection(&self) -> bool {
        self.collection.is_some()
    }

    /// Descriptor of a single element, dropping the collection wrapper.
    pub fn element(&self) -> TypeDescriptor {
        TypeDescriptor::new(self.ty.clone())
    }
}

impl Default for TypeDescriptor {
    fn default() -> Self {
        Self::new(PropertyType::Any)
    }
}

impl From<PropertyType> for TypeDescriptor {
    fn from(ty: PropertyType) -> Self {
        Self::new(ty)
    }
}
