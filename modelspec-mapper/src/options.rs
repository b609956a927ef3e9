//! Options of serialize and deserialize calls.
//!
//! # Example
//! ```rust
//! use modelspec_mapper::{AdditionalPropertiesPolicy, DeserializeOptions, SerializeOptions};
//!
//! let read = DeserializeOptions::new()
//!     .with_validate(true)
//!     .with_additional_properties(AdditionalPropertiesPolicy::Error);
//! assert!(read.validate);
//!
//! let write = SerializeOptions::new().with_groups(["details"]);
//! assert!(write.use_alias);
//! ```

use serde::{Deserialize, Serialize};

/// What to do with input keys the class does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdditionalPropertiesPolicy {
    /// Keep them as untyped fields
    Accept,
    /// Drop them
    #[default]
    Ignore,
    /// Fail with `MapperError::UnknownProperty`
    Error,
}

/// Options of a serialize call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializeOptions {
    /// Write aliased keys (default: true)
    pub use_alias: bool,
    /// Emit absent declared properties as null (default: false)
    pub keep_undefined: bool,
    /// Requested property groups
    pub groups: Option<Vec<String>>,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            use_alias: true,
            keep_undefined: false,
            groups: None,
        }
    }
}

impl SerializeOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "This method returns a new SerializeOptions and does not modify self"]
    pub fn with_use_alias(mut self, enabled: bool) -> Self {
        self.use_alias = enabled;
        self
    }

    #[must_use = "This method returns a new SerializeOptions and does not modify self"]
    pub fn with_keep_undefined(mut self, enabled: bool) -> Self {
        self.keep_undefined = enabled;
        self
    }

    #[must_use = "This method returns a new SerializeOptions and does not modify self"]
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }
}

/// Options of a deserialize call.
///
/// # Fields
///
/// * `validate` - Enforce `required` and constraint keywords. Default: false.
/// * `strict` - Surface shape mismatches and refuse coercions. Default: false.
/// * `use_alias` - Read aliased keys. Default: true.
/// * `additional_properties` - Policy for undeclared keys. Default: `Ignore`.
/// * `groups` - Requested property groups. Default: none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeserializeOptions {
    pub validate: bool,
    pub strict: bool,
    pub use_alias: bool,
    pub additional_properties: AdditionalPropertiesPolicy,
    pub groups: Option<Vec<String>>,
}

impl Default for DeserializeOptions {
    fn default() -> Self {
        Self {
            validate: false,
            strict: false,
            use_alias: true,
            additional_properties: AdditionalPropertiesPolicy::default(),
            groups: None,
        }
    }
}

impl DeserializeOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "This method returns a new DeserializeOptions and does not modify self"]
    pub fn with_validate(mut self, enabled: bool) -> Self {
        self.validate = enabled;
        self
    }

    #[must_use = "This method returns a new DeserializeOptions and does not modify self"]
    pub fn with_strict(mut self, enabled: bool) -> Self {
        self.strict = enabled;
        self
    }

    #[must_use = "This method returns a new DeserializeOptions and does not modify self"]
    pub fn with_use_alias(mut self, enabled: bool) -> Self {
        self.use_alias = enabled;
        self
    }

    #[must_use = "This method returns a new DeserializeOptions and does not modify self"]
    pub fn with_additional_properties(mut self, policy: AdditionalPropertiesPolicy) -> Self {
        self.additional_properties = policy;
        self
    }

    #[must_use = "This method returns a new DeserializeOptions and does not modify self"]
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }
}
