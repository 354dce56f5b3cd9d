//! Primitive EDM values and the literal dialects that carry them.
//!
//! A [`ScalarValue`] is the parsed form of one EDM primitive. The three
//! [`LiteralCodec`] implementations render it for the verbose JSON payload
//! dialect ([`JsonLiteralCodec`]), for XML element text ([`XmlLiteralCodec`])
//! and for URL key/query literals ([`UriLiteralCodec`]). Each dialect has its
//! own spelling rules for the same value, so the codecs share the parsed
//! representation but nothing about the text.

mod duration;
mod error;
mod kind;
mod spatial;
mod value;

pub mod json;
pub mod uri;
pub mod xml;

pub use duration::{format_duration, parse_duration};
pub use error::LiteralError;
pub use json::{JsonDateFormat, JsonLiteralCodec, JsonLiteralOptions};
pub use kind::EdmPrimitiveKind;
pub use spatial::{NullSpatialHandler, SpatialFamily, SpatialHandler, SpatialValue};
pub use uri::{UriLiteralCodec, UriLiteralOptions};
pub use value::{decimal_eq, ScalarValue};
pub use xml::XmlLiteralCodec;

/// Common surface of the three literal dialects.
///
/// `deserialize` takes the declared EDM type when the payload carries one;
/// without it each dialect falls back to its own shape heuristics. `is_null`
/// asks whether the literal text itself spells null, which only the JSON and
/// URL dialects can do (XML marks null structurally, outside the text).
pub trait LiteralCodec {
    fn serialize(&self, value: &ScalarValue) -> Result<String, LiteralError>;

    fn deserialize(
        &self,
        text: &str,
        expected: Option<EdmPrimitiveKind>,
    ) -> Result<ScalarValue, LiteralError>;

    fn is_null(&self, text: &str, expected: Option<EdmPrimitiveKind>) -> bool;
}
