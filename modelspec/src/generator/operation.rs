//! Operation metadata consumed by the spec generator.
//!
//! Routing itself lives outside this crate; these types only describe the
//! surface of each endpoint: method, path, parameters and responses.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ir::{TypeDescriptor, ValidationRule};

/// HTTP method of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    /// Lowercase name used as key under a path item.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
    Body,
}

impl ParamLocation {
    /// Value of the `in` field.
    pub fn as_str(self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
            ParamLocation::Cookie => "cookie",
            ParamLocation::Body => "body",
        }
    }
}

/// A declared operation parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMetadata {
    /// Parameter name; ignored for bodies
    pub name: String,
    /// Location
    pub location: ParamLocation,
    /// Declared type
    pub descriptor: TypeDescriptor,
    /// Whether the parameter is mandatory
    pub required: bool,
    /// Description
    pub description: Option<String>,
    /// Constraints
    pub rules: Vec<ValidationRule>,
}

impl ParameterMetadata {
    /// Create a parameter.
    pub fn new(name: impl Into<String>, location: ParamLocation, descriptor: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            location,
            descriptor,
            required: location == ParamLocation::Path,
            description: None,
            rules: Vec::new(),
        }
    }

    /// Path parameter; always required.
    pub fn path(name: impl Into<String>, descriptor: impl Into<TypeDescriptor>) -> Self {
        Self::new(name, ParamLocation::Path, descriptor.into())
    }

    /// Query parameter.
    pub fn query(name: impl Into<String>, descriptor: impl Into<TypeDescriptor>) -> Self {
        Self::new(name, ParamLocation::Query, descriptor.into())
    }

    /// Header parameter.
    pub fn header(name: impl Into<String>, descriptor: impl Into<TypeDescriptor>) -> Self {
        Self::new(name, ParamLocation::Header, descriptor.into())
    }

    /// Request body.
    pub fn body(descriptor: impl Into<TypeDescriptor>) -> Self {
        Self::new("body", ParamLocation::Body, descriptor.into())
    }

    /// Mark the parameter as required.
    #[must_use = "This method returns a new ParameterMetadata and does not modify self"]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the description.
    #[must_use = "This method returns a new ParameterMetadata and does not modify self"]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a constraint.
    #[must_use = "This method returns a new ParameterMetadata and does not modify self"]
    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        crate::ir::validation::upsert_rule(&mut self.rules, rule);
        self
    }
}

/// A declared response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMetadata {
    /// Description, required by both document flavors
    pub description: String,
    /// Payload type, if the response has a body
    pub descriptor: Option<TypeDescriptor>,
}

impl ResponseMetadata {
    /// Response without a body.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            descriptor: None,
        }
    }

    /// Response with a JSON body.
    pub fn with_body(description: impl Into<String>, descriptor: impl Into<TypeDescriptor>) -> Self {
        Self {
            description: description.into(),
            descriptor: Some(descriptor.into()),
        }
    }
}

/// A declared operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationMetadata {
    pub method: HttpMethod,
    /// Path relative to the controller, express-style (`/:id`)
    pub path: String,
    /// Handler name, used to derive the operation id
    pub handler: String,
    /// Explicit operation id
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    /// Tags; defaults to the controller name
    pub tags: Vec<String>,
    pub deprecated: bool,
    pub parameters: Vec<ParameterMetadata>,
    /// Responses keyed by status code
    pub responses: IndexMap<u16, ResponseMetadata>,
}

impl OperationMetadata {
    /// Create an operation.
    pub fn new(method: HttpMethod, path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            handler: handler.into(),
            operation_id: None,
            summary: None,
            description: None,
            tags: Vec::new(),
            deprecated: false,
            parameters: Vec::new(),
            responses: IndexMap::new(),
        }
    }

    #[must_use = "This method returns a new OperationMetadata and does not modify self"]
    pub fn with_operation_id(mut self, id: impl Into<String>) -> Self {
        self.operation_id = Some(id.into());
        self
    }

    #[must_use = "This method returns a new OperationMetadata and does not modify self"]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    #[must_use = "This method returns a new OperationMetadata and does not modify self"]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use = "This method returns a new OperationMetadata and does not modify self"]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use = "This method returns a new OperationMetadata and does not modify self"]
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    #[must_use = "This method returns a new OperationMetadata and does not modify self"]
    pub fn with_parameter(mut self, parameter: ParameterMetadata) -> Self {
        self.parameters.push(parameter);
        self
    }

    #[must_use = "This method returns a new OperationMetadata and does not modify self"]
    pub fn with_response(mut self, status: u16, response: ResponseMetadata) -> Self {
        self.responses.insert(status, response);
        self
    }

    /// Body parameter, if declared.
    pub fn body(&self) -> Option<&ParameterMetadata> {
        self.parameters
            .iter()
            .find(|p| p.location == ParamLocation::Body)
    }
}

/// A controller: a named group of operations under a base path.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerMetadata {
    pub name: String,
    /// Base path prepended to every operation
    pub path: String,
    pub description: Option<String>,
    pub operations: Vec<OperationMetadata>,
}

impl ControllerMetadata {
    /// Create a controller.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            description: None,
            operations: Vec::new(),
        }
    }

    #[must_use = "This method returns a new ControllerMetadata and does not modify self"]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use = "This method returns a new ControllerMetadata and does not modify self"]
    pub fn with_operation(mut self, operation: OperationMetadata) -> Self {
        self.operations.push(operation);
        self
    }
}
