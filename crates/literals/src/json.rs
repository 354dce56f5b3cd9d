//! Primitive literal codec for the JSON wire dialect.
//!
//! Values that JSON numbers cannot round-trip (`Int64`, `Decimal`, the
//! non-finite floats) travel as strings. Dates travel either as the legacy
//! `/Date(ms)/` ticks form or as calendar ISO text, selected by
//! [`JsonDateFormat`]; decoding recognizes both and fails loudly on
//! anything else.

use base64::prelude::{Engine as _, BASE64_STANDARD};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::duration::{format_duration, parse_duration};
use crate::error::LiteralError;
use crate::kind::EdmPrimitiveKind;
use crate::value::ScalarValue;
use crate::LiteralCodec;

/// `/Date(628318530718)/`, optionally with a `±hhmm` minutes offset.
static TICKS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/Date\((-?\d+)([+-]\d{1,4})?\)/$").expect("ticks regex"));

/// `2012-04-23T18:25:43[.fff]`, no zone designator.
static ISO_LOCAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?$").expect("iso regex"));

/// ISO text with a `Z` or `±hh:mm` zone designator.
static ISO_OFFSET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})$")
        .expect("iso offset regex")
});

static GUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("guid regex")
});

/// Which sub-format dates are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonDateFormat {
    /// Legacy `/Date(ms[±offset])/` ticks marker.
    #[default]
    Ticks,
    /// Calendar ISO 8601 text.
    Iso,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLiteralOptions {
    pub date_format: JsonDateFormat,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLiteralCodec {
    pub options: JsonLiteralOptions,
}

impl JsonLiteralCodec {
    pub fn new(options: JsonLiteralOptions) -> Self {
        Self { options }
    }

    /// Renders a scalar as its JSON value form.
    pub fn to_value(&self, value: &ScalarValue) -> Result<Value, LiteralError> {
        let v = match value {
            ScalarValue::Null => Value::Null,
            ScalarValue::Boolean(b) => Value::Bool(*b),
            ScalarValue::Byte(n) => Value::from(*n),
            ScalarValue::SByte(n) => Value::from(*n),
            ScalarValue::Int16(n) => Value::from(*n),
            ScalarValue::Int32(n) => Value::from(*n),
            ScalarValue::Int64(n) => Value::String(n.to_string()),
            ScalarValue::Single(f) => float_value(f64::from(*f))?,
            ScalarValue::Double(f) => float_value(*f)?,
            ScalarValue::Decimal(text) => Value::String(text.clone()),
            ScalarValue::String(s) => Value::String(s.clone()),
            ScalarValue::Binary(bytes) => Value::String(BASE64_STANDARD.encode(bytes)),
            ScalarValue::DateTime(dt) => Value::String(match self.options.date_format {
                JsonDateFormat::Ticks => format!("/Date({})/", dt.and_utc().timestamp_millis()),
                JsonDateFormat::Iso => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            }),
            ScalarValue::DateTimeOffset(dto) => Value::String(match self.options.date_format {
                JsonDateFormat::Ticks => format_ticks_with_offset(dto),
                JsonDateFormat::Iso => dto.format("%Y-%m-%dT%H:%M:%S%.f%:z").to_string(),
            }),
            ScalarValue::Time(d) => Value::String(format_duration(d)),
            ScalarValue::Guid(g) => Value::String(g.clone()),
            ScalarValue::Spatial(s) => {
                // Spatial values are objects, not literals; the structural
                // codec routes them through the spatial handler first.
                return Err(LiteralError::SpatialUnsupported(s.text.clone()));
            }
        };
        Ok(v)
    }

    /// Interprets a JSON value as a scalar. Without an expected type the
    /// shape of the JSON decides; the ticks date marker is the only string
    /// form unambiguous enough to re-type on its own.
    pub fn from_value(
        &self,
        value: &Value,
        expected: Option<EdmPrimitiveKind>,
    ) -> Result<ScalarValue, LiteralError> {
        if value.is_null() {
            return Ok(ScalarValue::Null);
        }
        match expected {
            None => self.from_untyped(value),
            Some(kind) => self.from_typed(value, kind),
        }
    }

    fn from_untyped(&self, value: &Value) -> Result<ScalarValue, LiteralError> {
        match value {
            Value::Bool(b) => Ok(ScalarValue::Boolean(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if let Ok(small) = i32::try_from(i) {
                        Ok(ScalarValue::Int32(small))
                    } else {
                        Ok(ScalarValue::Int64(i))
                    }
                } else if let Some(f) = n.as_f64() {
                    Ok(ScalarValue::Double(f))
                } else {
                    Ok(ScalarValue::Decimal(n.to_string()))
                }
            }
            Value::String(s) => {
                if let Some(caps) = TICKS_RE.captures(s) {
                    parse_ticks(&caps, s)
                } else {
                    Ok(ScalarValue::String(s.clone()))
                }
            }
            other => Err(LiteralError::malformed("json primitive", other.to_string())),
        }
    }

    fn from_typed(&self, value: &Value, kind: EdmPrimitiveKind) -> Result<ScalarValue, LiteralError> {
        let text_of = |v: &Value| -> Option<String> {
            match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        };
        let malformed = || LiteralError::malformed(kind.as_str(), value.to_string());

        match kind {
            EdmPrimitiveKind::Boolean => match value {
                Value::Bool(b) => Ok(ScalarValue::Boolean(*b)),
                Value::String(s) if s == "true" => Ok(ScalarValue::Boolean(true)),
                Value::String(s) if s == "false" => Ok(ScalarValue::Boolean(false)),
                _ => Err(malformed()),
            },
            EdmPrimitiveKind::Byte => parse_int(&text_of(value).ok_or_else(malformed)?, kind)
                .map(ScalarValue::Byte),
            EdmPrimitiveKind::SByte => parse_int(&text_of(value).ok_or_else(malformed)?, kind)
                .map(ScalarValue::SByte),
            EdmPrimitiveKind::Int16 => parse_int(&text_of(value).ok_or_else(malformed)?, kind)
                .map(ScalarValue::Int16),
            EdmPrimitiveKind::Int32 => parse_int(&text_of(value).ok_or_else(malformed)?, kind)
                .map(ScalarValue::Int32),
            EdmPrimitiveKind::Int64 => parse_int(&text_of(value).ok_or_else(malformed)?, kind)
                .map(ScalarValue::Int64),
            EdmPrimitiveKind::Single => {
                parse_float(&text_of(value).ok_or_else(malformed)?, kind).map(|f| {
                    ScalarValue::Single(f as f32)
                })
            }
            EdmPrimitiveKind::Double => {
                parse_float(&text_of(value).ok_or_else(malformed)?, kind).map(ScalarValue::Double)
            }
            EdmPrimitiveKind::Decimal => {
                let text = text_of(value).ok_or_else(malformed)?;
                if crate::value::is_decimal_text(&text) {
                    Ok(ScalarValue::Decimal(text))
                } else {
                    Err(malformed())
                }
            }
            EdmPrimitiveKind::String => match value {
                Value::String(s) => Ok(ScalarValue::String(s.clone())),
                _ => Err(malformed()),
            },
            EdmPrimitiveKind::Binary => {
                let text = value.as_str().ok_or_else(malformed)?;
                BASE64_STANDARD
                    .decode(text)
                    .map(ScalarValue::Binary)
                    .map_err(|_| malformed())
            }
            EdmPrimitiveKind::DateTime | EdmPrimitiveKind::DateTimeOffset => {
                let text = value.as_str().ok_or_else(malformed)?;
                parse_date_text(text)
            }
            EdmPrimitiveKind::Time => {
                let text = value.as_str().ok_or_else(malformed)?;
                parse_duration(text).map(ScalarValue::Time)
            }
            EdmPrimitiveKind::Guid => {
                let text = value.as_str().ok_or_else(malformed)?;
                if GUID_RE.is_match(text) {
                    Ok(ScalarValue::Guid(text.to_string()))
                } else {
                    Err(malformed())
                }
            }
            EdmPrimitiveKind::Geography | EdmPrimitiveKind::Geometry => Err(
                LiteralError::SpatialUnsupported(value.to_string()),
            ),
        }
    }
}

impl LiteralCodec for JsonLiteralCodec {
    fn serialize(&self, value: &ScalarValue) -> Result<String, LiteralError> {
        let v = self.to_value(value)?;
        Ok(v.to_string())
    }

    fn deserialize(
        &self,
        text: &str,
        expected: Option<EdmPrimitiveKind>,
    ) -> Result<ScalarValue, LiteralError> {
        let value: Value = serde_json::from_str(text)?;
        self.from_value(&value, expected)
    }

    fn is_null(&self, text: &str, _expected: Option<EdmPrimitiveKind>) -> bool {
        text.trim() == "null"
    }
}

// ── Shared text parsing ───────────────────────────────────────────────────

fn float_value(f: f64) -> Result<Value, LiteralError> {
    if f.is_nan() {
        Ok(Value::String("NaN".into()))
    } else if f == f64::INFINITY {
        Ok(Value::String("INF".into()))
    } else if f == f64::NEG_INFINITY {
        Ok(Value::String("-INF".into()))
    } else {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| LiteralError::malformed("float", f.to_string()))
    }
}

pub(crate) fn parse_float(text: &str, kind: EdmPrimitiveKind) -> Result<f64, LiteralError> {
    match text {
        "NaN" => Ok(f64::NAN),
        "INF" => Ok(f64::INFINITY),
        "-INF" => Ok(f64::NEG_INFINITY),
        _ => text
            .parse::<f64>()
            .map_err(|_| LiteralError::malformed(kind.as_str(), text)),
    }
}

pub(crate) trait ParsedInt: Sized {
    fn from_text(text: &str) -> Option<Self>;
}

macro_rules! impl_parsed_int {
    ($($ty:ty),*) => {$(
        impl ParsedInt for $ty {
            fn from_text(text: &str) -> Option<Self> {
                text.parse::<$ty>().ok()
            }
        }
    )*};
}
impl_parsed_int!(u8, i8, i16, i32, i64);

pub(crate) fn parse_int<T: ParsedInt>(
    text: &str,
    kind: EdmPrimitiveKind,
) -> Result<T, LiteralError> {
    T::from_text(text).ok_or_else(|| LiteralError::out_of_range(kind.as_str(), text))
}

/// Decides between the ticks and ISO date sub-formats; anything else is a
/// hard [`LiteralError::UnrecognizedDateFormat`].
pub(crate) fn parse_date_text(text: &str) -> Result<ScalarValue, LiteralError> {
    if let Some(caps) = TICKS_RE.captures(text) {
        return parse_ticks(&caps, text);
    }
    if ISO_LOCAL_RE.is_match(text) {
        let dt = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|_| LiteralError::UnrecognizedDateFormat(text.to_string()))?;
        return Ok(ScalarValue::DateTime(dt));
    }
    if ISO_OFFSET_RE.is_match(text) {
        let dto = DateTime::parse_from_rfc3339(text)
            .map_err(|_| LiteralError::UnrecognizedDateFormat(text.to_string()))?;
        return Ok(ScalarValue::DateTimeOffset(dto));
    }
    Err(LiteralError::UnrecognizedDateFormat(text.to_string()))
}

fn parse_ticks(caps: &regex::Captures<'_>, text: &str) -> Result<ScalarValue, LiteralError> {
    let unrecognized = || LiteralError::UnrecognizedDateFormat(text.to_string());
    let ms: i64 = caps[1].parse().map_err(|_| unrecognized())?;
    let utc = DateTime::from_timestamp_millis(ms).ok_or_else(unrecognized)?;
    match caps.get(2) {
        None => Ok(ScalarValue::DateTime(utc.naive_utc())),
        Some(offset) => {
            let minutes: i32 = offset.as_str().parse().map_err(|_| unrecognized())?;
            let zone = FixedOffset::east_opt(minutes * 60).ok_or_else(unrecognized)?;
            Ok(ScalarValue::DateTimeOffset(utc.with_timezone(&zone)))
        }
    }
}

fn format_ticks_with_offset(dto: &DateTime<FixedOffset>) -> String {
    let ms = dto.timestamp_millis();
    let minutes = dto.offset().local_minus_utc() / 60;
    let sign = if minutes < 0 { '-' } else { '+' };
    format!("/Date({ms}{sign}{:04})/", minutes.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn codec() -> JsonLiteralCodec {
        JsonLiteralCodec::default()
    }

    #[test]
    fn int64_and_decimal_travel_as_strings() {
        let c = codec();
        assert_eq!(
            c.to_value(&ScalarValue::Int64(i64::MAX)).unwrap(),
            Value::String(i64::MAX.to_string())
        );
        assert_eq!(
            c.to_value(&ScalarValue::Decimal("79228162514264337593543950335".into()))
                .unwrap(),
            Value::String("79228162514264337593543950335".into())
        );
    }

    #[test]
    fn non_finite_floats_are_quoted() {
        let c = codec();
        assert_eq!(
            c.to_value(&ScalarValue::Double(f64::NAN)).unwrap(),
            Value::String("NaN".into())
        );
        assert_eq!(
            c.to_value(&ScalarValue::Double(f64::NEG_INFINITY)).unwrap(),
            Value::String("-INF".into())
        );
    }

    #[test]
    fn ticks_date_round_trip() {
        let c = codec();
        let original = ScalarValue::DateTime(
            chrono::Utc
                .timestamp_millis_opt(628318530718)
                .unwrap()
                .naive_utc(),
        );
        let wire = c.to_value(&original).unwrap();
        assert_eq!(wire, Value::String("/Date(628318530718)/".into()));
        let back = c.from_value(&wire, Some(EdmPrimitiveKind::DateTime)).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn ticks_offset_round_trip() {
        let c = codec();
        let zone = FixedOffset::east_opt(330 * 60).unwrap();
        let original = ScalarValue::DateTimeOffset(
            zone.timestamp_millis_opt(158025600000).unwrap(),
        );
        let wire = c.to_value(&original).unwrap();
        assert_eq!(wire, Value::String("/Date(158025600000+0330)/".into()));
        let back = c
            .from_value(&wire, Some(EdmPrimitiveKind::DateTimeOffset))
            .unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn unmatched_date_text_fails_loudly() {
        let c = codec();
        let err = c
            .from_value(
                &Value::String("May 29, 2012".into()),
                Some(EdmPrimitiveKind::DateTime),
            )
            .unwrap_err();
        assert!(matches!(err, LiteralError::UnrecognizedDateFormat(_)));
    }

    #[test]
    fn untyped_numbers_scale_by_width() {
        let c = codec();
        assert_eq!(
            c.from_value(&serde_json::json!(7), None).unwrap(),
            ScalarValue::Int32(7)
        );
        assert_eq!(
            c.from_value(&serde_json::json!(5_000_000_000i64), None).unwrap(),
            ScalarValue::Int64(5_000_000_000)
        );
        assert_eq!(
            c.from_value(&serde_json::json!(1.5), None).unwrap(),
            ScalarValue::Double(1.5)
        );
    }

    #[test]
    fn untyped_ticks_string_becomes_a_date() {
        let c = codec();
        let got = c
            .from_value(&Value::String("/Date(0)/".into()), None)
            .unwrap();
        assert!(matches!(got, ScalarValue::DateTime(_)));
    }

    #[test]
    fn binary_round_trip_including_empty() {
        let c = codec();
        for bytes in [vec![], vec![0xde, 0xad, 0xbe, 0xef]] {
            let wire = c.to_value(&ScalarValue::Binary(bytes.clone())).unwrap();
            let back = c.from_value(&wire, Some(EdmPrimitiveKind::Binary)).unwrap();
            assert_eq!(back, ScalarValue::Binary(bytes));
        }
    }

    #[test]
    fn is_null_only_on_null_text() {
        let c = codec();
        assert!(c.is_null("null", None));
        assert!(c.is_null(" null ", None));
        assert!(!c.is_null("\"null\"", None));
    }
}
