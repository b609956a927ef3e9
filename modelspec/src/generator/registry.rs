//! Named definition registry shared by every model of a build.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::config::CollisionPolicy;
use crate::error::{SchemaError, SchemaResult};
use crate::ir::{ClassId, JsonSchema};

/// Definitions map keyed by class name, with collision detection.
///
/// Each name is owned by exactly one class. Claiming a name owned by a
/// different class either fails or transfers ownership, depending on the
/// [`CollisionPolicy`].
#[derive(Debug, Clone, Default)]
pub struct DefinitionRegistry {
    policy: CollisionPolicy,
    owners: HashMap<String, ClassId>,
    schemas: IndexMap<String, JsonSchema>,
}

impl DefinitionRegistry {
    /// Create an empty registry.
    pub fn new(policy: CollisionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Claim `name` for `class`.
    ///
    /// Returns `true` when the name was free or already owned by `class`.
    /// Returns `false` when ownership was taken over from another class.
    pub fn claim(&mut self, name: &str, class: ClassId) -> SchemaResult<bool> {
        match self.owners.get(name) {
            None => {
                trace!(name = %name, class = %class, "Claiming definition name");
                self.owners.insert(name.to_string(), class);
                Ok(true)
            }
            Some(owner) if *owner == class => Ok(true),
            Some(owner) => match self.policy {
                CollisionPolicy::Error => Err(SchemaError::SchemaCollision {
                    name: name.to_string(),
                }),
                CollisionPolicy::LastWins => {
                    warn!(
                        name = %name,
                        previous = %owner,
                        class = %class,
                        "Definition name collision, keeping the last class"
                    );
                    self.owners.insert(name.to_string(), class);
                    Ok(false)
                }
            },
        }
    }

    /// Owner of a name.
    pub fn owner(&self, name: &str) -> Option<ClassId> {
        self.owners.get(name).copied()
    }

    /// Store the body of a definition.
    ///
    /// Replacing an existing body keeps its position in the map.
    pub fn define(&mut self, name: &str, schema: JsonSchema) {
        self.schemas.insert(name.to_string(), schema);
    }

    /// Check if a body was stored under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Body stored under `name`.
    pub fn get(&self, name: &str) -> Option<&JsonSchema> {
        self.schemas.get(name)
    }

    /// Remove a body, keeping the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<JsonSchema> {
        self.schemas.shift_remove(name)
    }

    /// Iterate over the stored bodies in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, JsonSchema> {
        self.schemas.iter()
    }

    /// Number of stored bodies.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Check if no body is stored.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Consume the registry and return the definitions in insertion order.
    pub fn into_definitions(self) -> IndexMap<String, JsonSchema> {
        self.schemas
    }
}
