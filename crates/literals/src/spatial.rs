//! Seam for the external spatial value formatter.
//!
//! The core never interprets geography/geometry payloads; it detects them,
//! hands them to whatever [`SpatialHandler`] the host wired in, and carries
//! the result as an opaque [`SpatialValue`].

use std::fmt;

use crate::error::LiteralError;
use crate::kind::EdmPrimitiveKind;

/// Which spatial family a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpatialFamily {
    Geography,
    Geometry,
}

impl SpatialFamily {
    pub fn uri_marker(&self) -> &'static str {
        match self {
            SpatialFamily::Geography => "geography",
            SpatialFamily::Geometry => "geometry",
        }
    }
}

impl From<SpatialFamily> for EdmPrimitiveKind {
    fn from(f: SpatialFamily) -> Self {
        match f {
            SpatialFamily::Geography => EdmPrimitiveKind::Geography,
            SpatialFamily::Geometry => EdmPrimitiveKind::Geometry,
        }
    }
}

/// Opaque spatial payload produced by the external converter. `text` is the
/// converter's canonical form and is compared verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialValue {
    pub kind: SpatialFamily,
    pub text: String,
}

/// Interface to the out-of-scope spatial formatter.
pub trait SpatialHandler: fmt::Debug + Send + Sync {
    /// Parses the body of a `geography'…'` / `geometry'…'` URI literal.
    fn parse_uri_literal(&self, family: SpatialFamily, body: &str)
        -> Result<SpatialValue, LiteralError>;

    /// Formats the body that goes between the quotes of a URI literal.
    fn format_uri_literal(&self, value: &SpatialValue) -> Result<String, LiteralError>;

    /// Attempts to recognize a JSON object as a spatial value. `None` means
    /// "not spatial", letting shape classification continue.
    fn parse_json_object(&self, json: &serde_json::Value) -> Option<SpatialValue>;

    /// Renders a spatial value back into its JSON object form.
    fn format_json_object(&self, value: &SpatialValue) -> Option<serde_json::Value>;
}

/// Default handler for hosts without spatial support: URI literals fail
/// loudly, JSON objects are never classified as spatial.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSpatialHandler;

impl SpatialHandler for NullSpatialHandler {
    fn parse_uri_literal(
        &self,
        family: SpatialFamily,
        body: &str,
    ) -> Result<SpatialValue, LiteralError> {
        Err(LiteralError::SpatialUnsupported(format!(
            "{}'{}'",
            family.uri_marker(),
            body
        )))
    }

    fn format_uri_literal(&self, value: &SpatialValue) -> Result<String, LiteralError> {
        Err(LiteralError::SpatialUnsupported(value.text.clone()))
    }

    fn parse_json_object(&self, _json: &serde_json::Value) -> Option<SpatialValue> {
        None
    }

    fn format_json_object(&self, _value: &SpatialValue) -> Option<serde_json::Value> {
        None
    }
}
