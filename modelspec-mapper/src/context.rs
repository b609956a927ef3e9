//! Per-call mapping state.

use std::fmt::Write;

/// One step of a JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Transient state of one serialize or deserialize call.
///
/// Tracks the path of the value being mapped, used to locate errors.
#[derive(Debug, Clone, Default)]
pub struct MappingContext {
    segments: Vec<PathSegment>,
    strict: bool,
}

impl MappingContext {
    /// Create a context at the root.
    pub fn new(strict: bool) -> Self {
        Self {
            segments: Vec::new(),
            strict,
        }
    }

    /// Whether shape mismatches are surfaced instead of coerced.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Descend into an object key.
    pub fn push_key(&mut self, key: impl Into<String>) {
        self.segments.push(PathSegment::Key(key.into()));
    }

    /// Descend into an array index.
    pub fn push_index(&mut self, index: usize) {
        self.segments.push(PathSegment::Index(index));
    }

    /// Step back out.
    pub fn pop(&mut self) {
        self.segments.pop();
    }

    /// Current depth.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Dotted path of the current value; `$` at the root.
    pub fn path(&self) -> String {
        if self.segments.is_empty() {
            return "$".to_string();
        }
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(key);
                }
                PathSegment::Index(index) => {
                    let _ = write!(out, "[{index}]");
                }
            }
        }
        out
    }

    /// Dotted path of a child key without descending.
    pub fn child_path(&self, key: &str) -> String {
        let mut ctx = self.clone();
        ctx.push_key(key);
        ctx.path()
    }
}
