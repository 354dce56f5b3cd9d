//! Primitive literal codec for the untyped URL literal dialect.
//!
//! Numeric width travels as a trailing suffix (`L`, `M`, `D`, `F`; the
//! capitalization is an option), binary as a hex literal wrapped in a
//! `binary'…'` / `X'…'` marker, temporal and guid values in their own
//! quoted markers. The `geography'…'` / `geometry'…'` prefix test routes a
//! literal to the spatial handler before any numeric or date parsing, so a
//! malformed plain literal always propagates instead of being mistaken for
//! spatial input.

use std::sync::Arc;

use crate::duration::{format_duration, parse_duration};
use crate::error::LiteralError;
use crate::json::{parse_date_text, parse_float, parse_int};
use crate::kind::EdmPrimitiveKind;
use crate::spatial::{NullSpatialHandler, SpatialFamily, SpatialHandler};
use crate::value::ScalarValue;
use crate::LiteralCodec;

#[derive(Debug, Clone, Copy, Default)]
pub struct UriLiteralOptions {
    /// Emit `2.5d` instead of `2.5D`, and likewise for the other suffixes.
    pub lowercase_suffixes: bool,
}

#[derive(Debug, Clone)]
pub struct UriLiteralCodec {
    pub options: UriLiteralOptions,
    spatial: Arc<dyn SpatialHandler>,
}

impl Default for UriLiteralCodec {
    fn default() -> Self {
        Self::new(UriLiteralOptions::default())
    }
}

impl UriLiteralCodec {
    pub fn new(options: UriLiteralOptions) -> Self {
        Self {
            options,
            spatial: Arc::new(NullSpatialHandler),
        }
    }

    pub fn with_spatial_handler(mut self, handler: Arc<dyn SpatialHandler>) -> Self {
        self.spatial = handler;
        self
    }

    fn suffix(&self, upper: char) -> char {
        if self.options.lowercase_suffixes {
            upper.to_ascii_lowercase()
        } else {
            upper
        }
    }
}

impl LiteralCodec for UriLiteralCodec {
    fn serialize(&self, value: &ScalarValue) -> Result<String, LiteralError> {
        let text = match value {
            ScalarValue::Null => "null".to_string(),
            ScalarValue::Boolean(b) => b.to_string(),
            ScalarValue::Byte(n) => n.to_string(),
            ScalarValue::SByte(n) => n.to_string(),
            ScalarValue::Int16(n) => n.to_string(),
            ScalarValue::Int32(n) => n.to_string(),
            ScalarValue::Int64(n) => format!("{n}{}", self.suffix('L')),
            ScalarValue::Single(f) => {
                format!("{}{}", float_token(f64::from(*f)), self.suffix('F'))
            }
            ScalarValue::Double(f) => format!("{}{}", float_token(*f), self.suffix('D')),
            ScalarValue::Decimal(text) => format!("{text}{}", self.suffix('M')),
            ScalarValue::String(s) => format!("'{}'", s.replace('\'', "''")),
            ScalarValue::Binary(bytes) => format!("binary'{}'", hex_encode(bytes)),
            ScalarValue::DateTime(dt) => {
                format!("datetime'{}'", dt.format("%Y-%m-%dT%H:%M:%S%.f"))
            }
            ScalarValue::DateTimeOffset(dto) => {
                format!("datetimeoffset'{}'", dto.format("%Y-%m-%dT%H:%M:%S%.f%:z"))
            }
            ScalarValue::Time(d) => format!("time'{}'", format_duration(d)),
            ScalarValue::Guid(g) => format!("guid'{g}'"),
            ScalarValue::Spatial(s) => {
                let body = self.spatial.format_uri_literal(s)?;
                format!("{}'{}'", s.kind.uri_marker(), body)
            }
        };
        Ok(text)
    }

    fn deserialize(
        &self,
        text: &str,
        expected: Option<EdmPrimitiveKind>,
    ) -> Result<ScalarValue, LiteralError> {
        if text == "null" {
            return Ok(ScalarValue::Null);
        }
        // Spatial first: a geography/geometry marker must never fall through
        // to the numeric or date paths.
        if let Some(body) = quoted_body(text, "geography") {
            return Ok(ScalarValue::Spatial(
                self.spatial.parse_uri_literal(SpatialFamily::Geography, body)?,
            ));
        }
        if let Some(body) = quoted_body(text, "geometry") {
            return Ok(ScalarValue::Spatial(
                self.spatial.parse_uri_literal(SpatialFamily::Geometry, body)?,
            ));
        }
        match expected {
            Some(kind) => self.deserialize_typed(text, kind),
            None => self.deserialize_untyped(text),
        }
    }

    fn is_null(&self, text: &str, _expected: Option<EdmPrimitiveKind>) -> bool {
        text.trim() == "null"
    }
}

impl UriLiteralCodec {
    fn deserialize_typed(
        &self,
        text: &str,
        kind: EdmPrimitiveKind,
    ) -> Result<ScalarValue, LiteralError> {
        let malformed = || LiteralError::malformed(kind.as_str(), text);
        match kind {
            EdmPrimitiveKind::Boolean => match text {
                "true" => Ok(ScalarValue::Boolean(true)),
                "false" => Ok(ScalarValue::Boolean(false)),
                _ => Err(malformed()),
            },
            EdmPrimitiveKind::Byte => parse_int(text, kind).map(ScalarValue::Byte),
            EdmPrimitiveKind::SByte => parse_int(text, kind).map(ScalarValue::SByte),
            EdmPrimitiveKind::Int16 => parse_int(text, kind).map(ScalarValue::Int16),
            EdmPrimitiveKind::Int32 => parse_int(text, kind).map(ScalarValue::Int32),
            EdmPrimitiveKind::Int64 => {
                parse_int(strip_suffix(text, 'L'), kind).map(ScalarValue::Int64)
            }
            EdmPrimitiveKind::Single => {
                parse_float(strip_suffix(text, 'F'), kind).map(|f| ScalarValue::Single(f as f32))
            }
            EdmPrimitiveKind::Double => {
                parse_float(strip_suffix(text, 'D'), kind).map(ScalarValue::Double)
            }
            EdmPrimitiveKind::Decimal => {
                let bare = strip_suffix(text, 'M');
                if crate::value::is_decimal_text(bare) {
                    Ok(ScalarValue::Decimal(bare.to_string()))
                } else {
                    Err(malformed())
                }
            }
            EdmPrimitiveKind::String => unquote_string(text).ok_or_else(malformed),
            EdmPrimitiveKind::Binary => {
                let body = quoted_body(text, "binary")
                    .or_else(|| quoted_body(text, "X"))
                    .ok_or_else(malformed)?;
                hex_decode(body).map(ScalarValue::Binary).ok_or_else(malformed)
            }
            EdmPrimitiveKind::DateTime => {
                let body = quoted_body(text, "datetime").ok_or_else(malformed)?;
                parse_date_text(body)
            }
            EdmPrimitiveKind::DateTimeOffset => {
                let body = quoted_body(text, "datetimeoffset").ok_or_else(malformed)?;
                parse_date_text(body)
            }
            EdmPrimitiveKind::Time => {
                let body = quoted_body(text, "time").ok_or_else(malformed)?;
                parse_duration(body).map(ScalarValue::Time)
            }
            EdmPrimitiveKind::Guid => {
                let body = quoted_body(text, "guid").ok_or_else(malformed)?;
                Ok(ScalarValue::Guid(body.to_string()))
            }
            // Handled by the prefix test in `deserialize`.
            EdmPrimitiveKind::Geography | EdmPrimitiveKind::Geometry => Err(malformed()),
        }
    }

    fn deserialize_untyped(&self, text: &str) -> Result<ScalarValue, LiteralError> {
        if let Some(s) = unquote_string(text) {
            return Ok(s);
        }
        for (marker, kind) in [
            ("binary", EdmPrimitiveKind::Binary),
            ("X", EdmPrimitiveKind::Binary),
            ("datetimeoffset", EdmPrimitiveKind::DateTimeOffset),
            ("datetime", EdmPrimitiveKind::DateTime),
            ("guid", EdmPrimitiveKind::Guid),
            ("time", EdmPrimitiveKind::Time),
        ] {
            if quoted_body(text, marker).is_some() {
                return self.deserialize_typed(text, kind);
            }
        }
        match text {
            "true" => return Ok(ScalarValue::Boolean(true)),
            "false" => return Ok(ScalarValue::Boolean(false)),
            // Checked ahead of the suffix probes so the F in INF is not
            // mistaken for a Single suffix.
            "INF" | "-INF" | "NaN" => {
                return self.deserialize_typed(text, EdmPrimitiveKind::Double)
            }
            _ => {}
        }
        if let Some(bare) = trailing_suffix(text, 'L') {
            return self.deserialize_typed(bare, EdmPrimitiveKind::Int64);
        }
        if let Some(bare) = trailing_suffix(text, 'M') {
            return self.deserialize_typed(bare, EdmPrimitiveKind::Decimal);
        }
        if let Some(bare) = trailing_suffix(text, 'F') {
            return self.deserialize_typed(bare, EdmPrimitiveKind::Single);
        }
        if let Some(bare) = trailing_suffix(text, 'D') {
            return self.deserialize_typed(bare, EdmPrimitiveKind::Double);
        }
        if let Ok(i) = text.parse::<i64>() {
            return Ok(match i32::try_from(i) {
                Ok(small) => ScalarValue::Int32(small),
                Err(_) => ScalarValue::Int64(i),
            });
        }
        if text.parse::<f64>().is_ok() {
            return self.deserialize_typed(text, EdmPrimitiveKind::Double);
        }
        Err(LiteralError::malformed("uri", text))
    }
}

// ── Literal text helpers ──────────────────────────────────────────────────

fn float_token(f: f64) -> String {
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

/// `marker'body'` → `body`. The marker match is case-insensitive.
fn quoted_body<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    if text.len() < marker.len() + 2 {
        return None;
    }
    let (head, rest) = text.split_at(marker.len());
    if !head.eq_ignore_ascii_case(marker) {
        return None;
    }
    rest.strip_prefix('\'')?.strip_suffix('\'')
}

fn unquote_string(text: &str) -> Option<ScalarValue> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(ScalarValue::String(inner.replace("''", "'")))
}

fn strip_suffix(text: &str, upper: char) -> &str {
    trailing_suffix(text, upper).unwrap_or(text)
}

fn trailing_suffix(text: &str, upper: char) -> Option<&str> {
    let last = text.chars().last()?;
    if last.eq_ignore_ascii_case(&upper) && text.len() > 1 {
        Some(&text[..text.len() - 1])
    } else {
        None
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02X}"));
    }
    out
}

fn hex_decode(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    let mut out = Vec::with_capacity(text.len() / 2);
    let bytes = text.as_bytes();
    for pair in bytes.chunks(2) {
        let hi = (pair[0] as char).to_digit(16)?;
        let lo = (pair[1] as char).to_digit(16)?;
        out.push(((hi << 4) | lo) as u8);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> UriLiteralCodec {
        UriLiteralCodec::default()
    }

    #[test]
    fn suffix_capitalization_is_configurable() {
        let upper = codec();
        let lower = UriLiteralCodec::new(UriLiteralOptions {
            lowercase_suffixes: true,
        });
        assert_eq!(upper.serialize(&ScalarValue::Int64(5)).unwrap(), "5L");
        assert_eq!(lower.serialize(&ScalarValue::Int64(5)).unwrap(), "5l");
        assert_eq!(
            upper.serialize(&ScalarValue::Decimal("2.5".into())).unwrap(),
            "2.5M"
        );
        assert_eq!(
            lower.serialize(&ScalarValue::Decimal("2.5".into())).unwrap(),
            "2.5m"
        );
    }

    #[test]
    fn suffixed_literals_parse_either_case() {
        let c = codec();
        assert_eq!(c.deserialize("5l", None).unwrap(), ScalarValue::Int64(5));
        assert_eq!(c.deserialize("5L", None).unwrap(), ScalarValue::Int64(5));
        assert_eq!(
            c.deserialize("2.5d", None).unwrap(),
            ScalarValue::Double(2.5)
        );
    }

    #[test]
    fn binary_accepts_both_markers() {
        let c = codec();
        let expected = ScalarValue::Binary(vec![0x4a, 0xf0]);
        assert_eq!(c.deserialize("binary'4AF0'", None).unwrap(), expected);
        assert_eq!(c.deserialize("X'4af0'", None).unwrap(), expected);
        assert_eq!(c.serialize(&expected).unwrap(), "binary'4AF0'");
    }

    #[test]
    fn quoted_strings_escape_quotes() {
        let c = codec();
        let v = ScalarValue::String("it's".into());
        let text = c.serialize(&v).unwrap();
        assert_eq!(text, "'it''s'");
        assert_eq!(c.deserialize(&text, None).unwrap(), v);
    }

    #[test]
    fn spatial_prefix_is_tried_before_numeric_paths() {
        let c = codec();
        let err = c.deserialize("geography'POINT(1 2)'", None).unwrap_err();
        assert!(matches!(err, LiteralError::SpatialUnsupported(_)));
        // A malformed non-spatial literal propagates as malformed instead.
        let err = c.deserialize("gibberish", None).unwrap_err();
        assert!(matches!(err, LiteralError::Malformed { .. }));
    }

    #[test]
    fn round_trip_markers() {
        let c = codec();
        for text in [
            "datetime'2012-05-29T09:13:28'",
            "guid'38cf68c2-4010-4ccc-8922-868217f03ddc'",
            "time'PT2H'",
        ] {
            let value = c.deserialize(text, None).unwrap();
            assert_eq!(c.serialize(&value).unwrap(), text);
        }
    }

    #[test]
    fn untyped_integers_widen_only_when_needed() {
        let c = codec();
        assert_eq!(c.deserialize("7", None).unwrap(), ScalarValue::Int32(7));
        assert_eq!(
            c.deserialize("5000000000", None).unwrap(),
            ScalarValue::Int64(5_000_000_000)
        );
    }
}
