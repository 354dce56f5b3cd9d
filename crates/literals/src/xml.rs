//! Primitive literal codec for the XML/Atom wire dialect.
//!
//! XML literals are element text: bare numerics (non-finite floats as the
//! unquoted `INF`/`-INF`/`NaN` tokens), base64 binary, calendar ISO dates.
//! Nullness is not a literal concern here. The wire carries it as the
//! structural `m:null` attribute, so `is_null` is always false.

use base64::prelude::{Engine as _, BASE64_STANDARD};

use crate::duration::{format_duration, parse_duration};
use crate::error::LiteralError;
use crate::json::{parse_date_text, parse_float, parse_int};
use crate::kind::EdmPrimitiveKind;
use crate::value::ScalarValue;
use crate::LiteralCodec;

#[derive(Debug, Clone, Copy, Default)]
pub struct XmlLiteralCodec;

impl XmlLiteralCodec {
    pub fn new() -> Self {
        Self
    }
}

impl LiteralCodec for XmlLiteralCodec {
    fn serialize(&self, value: &ScalarValue) -> Result<String, LiteralError> {
        let text = match value {
            ScalarValue::Null => String::new(),
            ScalarValue::Boolean(b) => b.to_string(),
            ScalarValue::Byte(n) => n.to_string(),
            ScalarValue::SByte(n) => n.to_string(),
            ScalarValue::Int16(n) => n.to_string(),
            ScalarValue::Int32(n) => n.to_string(),
            ScalarValue::Int64(n) => n.to_string(),
            ScalarValue::Single(f) => float_text(f64::from(*f)),
            ScalarValue::Double(f) => float_text(*f),
            ScalarValue::Decimal(text) => text.clone(),
            ScalarValue::String(s) => s.clone(),
            ScalarValue::Binary(bytes) => BASE64_STANDARD.encode(bytes),
            ScalarValue::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            ScalarValue::DateTimeOffset(dto) => {
                dto.format("%Y-%m-%dT%H:%M:%S%.f%:z").to_string()
            }
            ScalarValue::Time(d) => format_duration(d),
            ScalarValue::Guid(g) => g.clone(),
            ScalarValue::Spatial(_) => return Err(LiteralError::Unserializable("spatial value")),
        };
        Ok(text)
    }

    fn deserialize(
        &self,
        text: &str,
        expected: Option<EdmPrimitiveKind>,
    ) -> Result<ScalarValue, LiteralError> {
        let kind = match expected {
            // Untyped element text carries string semantics.
            None => return Ok(ScalarValue::String(text.to_string())),
            Some(kind) => kind,
        };
        let malformed = || LiteralError::malformed(kind.as_str(), text);
        match kind {
            EdmPrimitiveKind::Boolean => match text {
                "true" | "1" => Ok(ScalarValue::Boolean(true)),
                "false" | "0" => Ok(ScalarValue::Boolean(false)),
                _ => Err(malformed()),
            },
            EdmPrimitiveKind::Byte => parse_int(text, kind).map(ScalarValue::Byte),
            EdmPrimitiveKind::SByte => parse_int(text, kind).map(ScalarValue::SByte),
            EdmPrimitiveKind::Int16 => parse_int(text, kind).map(ScalarValue::Int16),
            EdmPrimitiveKind::Int32 => parse_int(text, kind).map(ScalarValue::Int32),
            EdmPrimitiveKind::Int64 => parse_int(text, kind).map(ScalarValue::Int64),
            EdmPrimitiveKind::Single => {
                parse_float(text, kind).map(|f| ScalarValue::Single(f as f32))
            }
            EdmPrimitiveKind::Double => parse_float(text, kind).map(ScalarValue::Double),
            EdmPrimitiveKind::Decimal => {
                if crate::value::is_decimal_text(text) {
                    Ok(ScalarValue::Decimal(text.to_string()))
                } else {
                    Err(malformed())
                }
            }
            EdmPrimitiveKind::String => Ok(ScalarValue::String(text.to_string())),
            EdmPrimitiveKind::Binary => BASE64_STANDARD
                .decode(text)
                .map(ScalarValue::Binary)
                .map_err(|_| malformed()),
            EdmPrimitiveKind::DateTime | EdmPrimitiveKind::DateTimeOffset => parse_date_text(text),
            EdmPrimitiveKind::Time => parse_duration(text).map(ScalarValue::Time),
            EdmPrimitiveKind::Guid => Ok(ScalarValue::Guid(text.to_string())),
            EdmPrimitiveKind::Geography | EdmPrimitiveKind::Geometry => {
                Err(LiteralError::SpatialUnsupported(text.to_string()))
            }
        }
    }

    fn is_null(&self, _text: &str, _expected: Option<EdmPrimitiveKind>) -> bool {
        false
    }
}

fn float_text(f: f64) -> String {
    if f.is_nan() {
        "NaN".into()
    } else if f == f64::INFINITY {
        "INF".into()
    } else if f == f64::NEG_INFINITY {
        "-INF".into()
    } else {
        f.to_string()
    }
}
