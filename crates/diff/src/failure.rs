//! Mismatch verdicts with positional context.

use std::error::Error;
use std::fmt;

/// One step of the path from the compared root down to a mismatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A named instance property.
    Property(String),
    /// A positional item: collection entry, feed entity, multi-value item,
    /// batch part or changeset operation.
    Index(usize),
    /// One step down an inner-error chain.
    InnerError,
}

/// A localized mismatch. Renders as `path: message`; the path is built
/// outward as the failure unwinds, so the innermost difference comes with
/// the full route to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareFailure {
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl CompareFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            message: message.into(),
        }
    }

    /// Prepends a segment. Callers wrap failures on the way out of each
    /// recursion step.
    pub(crate) fn at(mut self, segment: PathSegment) -> Self {
        self.path.insert(0, segment);
        self
    }
}

impl fmt::Display for CompareFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            return f.write_str(&self.message);
        }
        let mut rendered = String::new();
        for segment in &self.path {
            match segment {
                PathSegment::Property(name) => {
                    if !rendered.is_empty() {
                        rendered.push('.');
                    }
                    rendered.push_str(name);
                }
                PathSegment::Index(index) => {
                    rendered.push_str(&format!("[{index}]"));
                }
                PathSegment::InnerError => {
                    if !rendered.is_empty() {
                        rendered.push('.');
                    }
                    rendered.push_str("innererror");
                }
            }
        }
        write!(f, "{rendered}: {}", self.message)
    }
}

impl Error for CompareFailure {}
