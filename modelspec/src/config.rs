//! Configuration for schema builds and document generation.
//!
//! # Example
//! ```rust
//! use modelspec::{CollisionPolicy, SchemaOptions, SpecOptions, SpecType};
//!
//! let schema_options = SchemaOptions::new()
//!     .with_spec_type(SpecType::OpenApi3)
//!     .with_groups(["details"]);
//!
//! let spec_options = SpecOptions::new("Pets", "1.0.0")
//!     .with_spec_type(SpecType::Swagger2)
//!     .with_collision(CollisionPolicy::LastWins);
//! assert!(spec_options.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Target document flavor.
///
/// The flavor decides where named definitions live and how `$ref`
/// pointers are spelled.
///
/// * `Json` - Plain JSON Schema, definitions under `#/definitions/`.
/// * `Swagger2` - Swagger 2.0 document, definitions under `#/definitions/`.
/// * `OpenApi3` - OpenAPI 3 document, definitions under `#/components/schemas/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpecType {
    /// Plain JSON Schema
    #[default]
    Json,
    /// Swagger 2.0
    Swagger2,
    /// OpenAPI 3.0
    OpenApi3,
}

impl SpecType {
    /// Prefix of `$ref` pointers into the definitions map.
    pub fn ref_prefix(self) -> &'static str {
        match self {
            SpecType::Json | SpecType::Swagger2 => "#/definitions/",
            SpecType::OpenApi3 => "#/components/schemas/",
        }
    }

    /// Build a `$ref` pointer to a named definition.
    pub fn ref_pointer(self, name: &str) -> String {
        format!("{}{}", self.ref_prefix(), name)
    }
}

/// What to do when two distinct classes share a definition name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Fail the build with `SchemaError::SchemaCollision`
    #[default]
    Error,
    /// Keep the last class seen and log a warning
    LastWins,
}

/// Options of a single schema build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaOptions {
    /// Target flavor (default: Json)
    pub spec_type: SpecType,
    /// Collision handling (default: Error)
    pub collision: CollisionPolicy,
    /// Requested property groups; `None` keeps only untagged properties
    pub groups: Option<Vec<String>>,
}

impl SchemaOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target flavor.
    #[must_use = "This method returns a new SchemaOptions and does not modify self"]
    pub fn with_spec_type(mut self, spec_type: SpecType) -> Self {
        self.spec_type = spec_type;
        self
    }

    /// Set the collision policy.
    #[must_use = "This method returns a new SchemaOptions and does not modify self"]
    pub fn with_collision(mut self, collision: CollisionPolicy) -> Self {
        self.collision = collision;
        self
    }

    /// Request property groups.
    #[must_use = "This method returns a new SchemaOptions and does not modify self"]
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    /// Requested groups as a slice.
    pub fn groups(&self) -> Option<&[String]> {
        self.groups.as_deref()
    }
}

/// Options of a full API document build.
///
/// # Fields
///
/// * `title` / `version` / `description` - Written to the `info` object.
/// * `spec_type` - `Swagger2` or `OpenApi3`. `Json` is rejected by [`SpecOptions::validate`].
/// * `collision` - Collision handling for the shared definitions map.
/// * `base` - Document the generated one is deep-merged over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecOptions {
    /// API title
    pub title: String,
    /// API version
    pub version: String,
    /// API description
    pub description: Option<String>,
    /// Target flavor (default: OpenApi3)
    pub spec_type: SpecType,
    /// Collision handling (default: Error)
    pub collision: CollisionPolicy,
    /// Base document to merge into
    pub base: Option<Value>,
}

impl Default for SpecOptions {
    fn default() -> Self {
        Self {
            title: "API".to_string(),
            version: "1.0.0".to_string(),
            description: None,
            spec_type: SpecType::OpenApi3,
            collision: CollisionPolicy::default(),
            base: None,
        }
    }
}

impl SpecOptions {
    /// Create options with a title and a version.
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Set the description.
    #[must_use = "This method returns a new SpecOptions and does not modify self"]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the target flavor.
    #[must_use = "This method returns a new SpecOptions and does not modify self"]
    pub fn with_spec_type(mut self, spec_type: SpecType) -> Self {
        self.spec_type = spec_type;
        self
    }

    /// Set the collision policy.
    #[must_use = "This method returns a new SpecOptions and does not modify self"]
    pub fn with_collision(mut self, collision: CollisionPolicy) -> Self {
        self.collision = collision;
        self
    }

    /// Set the base document.
    #[must_use = "This method returns a new SpecOptions and does not modify self"]
    pub fn with_base(mut self, base: Value) -> Self {
        self.base = Some(base);
        self
    }

    /// Schema options used for every model of the document.
    pub fn schema_options(&self) -> SchemaOptions {
        SchemaOptions::new()
            .with_spec_type(self.spec_type)
            .with_collision(self.collision)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.spec_type == SpecType::Json {
            return Err("spec_type must be Swagger2 or OpenApi3".to_string());
        }
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.version.trim().is_empty() {
            return Err("version must not be empty".to_string());
        }
        if let Some(base) = &self.base {
            if !base.is_object() {
                return Err("base must be a JSON object".to_string());
            }
        }
        Ok(())
    }
}
