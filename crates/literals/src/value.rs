//! The scalar value model shared by all three wire dialects.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime};

use crate::kind::EdmPrimitiveKind;
use crate::spatial::SpatialValue;

/// A primitive wire value, independent of how any dialect spells it.
///
/// `Decimal` keeps the exact literal text so that high-precision values
/// survive a round trip through formats whose native numbers cannot carry
/// them; equality is numeric, not textual (see [`decimal_eq`]).
#[derive(Debug, Clone, Default)]
pub enum ScalarValue {
    #[default]
    Null,
    Boolean(bool),
    Byte(u8),
    SByte(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Single(f32),
    Double(f64),
    Decimal(String),
    String(String),
    Binary(Vec<u8>),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Time(Duration),
    Guid(String),
    Spatial(SpatialValue),
}

impl ScalarValue {
    /// The Edm kind this value naturally carries, if any. `Null` has none.
    pub fn kind(&self) -> Option<EdmPrimitiveKind> {
        match self {
            ScalarValue::Null => None,
            ScalarValue::Boolean(_) => Some(EdmPrimitiveKind::Boolean),
            ScalarValue::Byte(_) => Some(EdmPrimitiveKind::Byte),
            ScalarValue::SByte(_) => Some(EdmPrimitiveKind::SByte),
            ScalarValue::Int16(_) => Some(EdmPrimitiveKind::Int16),
            ScalarValue::Int32(_) => Some(EdmPrimitiveKind::Int32),
            ScalarValue::Int64(_) => Some(EdmPrimitiveKind::Int64),
            ScalarValue::Single(_) => Some(EdmPrimitiveKind::Single),
            ScalarValue::Double(_) => Some(EdmPrimitiveKind::Double),
            ScalarValue::Decimal(_) => Some(EdmPrimitiveKind::Decimal),
            ScalarValue::String(_) => Some(EdmPrimitiveKind::String),
            ScalarValue::Binary(_) => Some(EdmPrimitiveKind::Binary),
            ScalarValue::DateTime(_) => Some(EdmPrimitiveKind::DateTime),
            ScalarValue::DateTimeOffset(_) => Some(EdmPrimitiveKind::DateTimeOffset),
            ScalarValue::Time(_) => Some(EdmPrimitiveKind::Time),
            ScalarValue::Guid(_) => Some(EdmPrimitiveKind::Guid),
            ScalarValue::Spatial(s) => Some(s.kind.into()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        use ScalarValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Byte(a), Byte(b)) => a == b,
            (SByte(a), SByte(b)) => a == b,
            (Int16(a), Int16(b)) => a == b,
            (Int32(a), Int32(b)) => a == b,
            (Int64(a), Int64(b)) => a == b,
            // NaN must compare equal to itself so that round-trip checks on
            // non-finite values hold.
            (Single(a), Single(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Double(a), Double(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Decimal(a), Decimal(b)) => decimal_eq(a, b),
            (String(a), String(b)) => a == b,
            (Binary(a), Binary(b)) => a == b,
            (DateTime(a), DateTime(b)) => a == b,
            (DateTimeOffset(a), DateTimeOffset(b)) => a == b,
            (Time(a), Time(b)) => a == b,
            (Guid(a), Guid(b)) => a.eq_ignore_ascii_case(b),
            (Spatial(a), Spatial(b)) => a == b,
            _ => false,
        }
    }
}

/// Numeric equality over decimal literal text: `1.50` equals `1.5`,
/// `+2` equals `2`, `0` equals `-0`.
pub fn decimal_eq(a: &str, b: &str) -> bool {
    match (normalize_decimal(a), normalize_decimal(b)) {
        (Some(x), Some(y)) => x == y,
        // Unparsable text falls back to textual comparison.
        _ => a == b,
    }
}

/// True when the text is a plain signed decimal (digits with one optional
/// point), the only shape `Edm.Decimal` literals may take.
pub(crate) fn is_decimal_text(text: &str) -> bool {
    normalize_decimal(text).is_some()
}

/// Canonical form: (negative, integer digits, fraction digits) with leading
/// and trailing zeros stripped. `None` when the text is not a plain decimal.
fn normalize_decimal(text: &str) -> Option<(bool, String, String)> {
    let mut s = text.trim();
    let mut negative = false;
    if let Some(rest) = s.strip_prefix('-') {
        negative = true;
        s = rest;
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    }
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let int_trimmed = int_part.trim_start_matches('0').to_string();
    let frac_trimmed = frac_part.trim_end_matches('0').to_string();
    if int_trimmed.is_empty() && frac_trimmed.is_empty() {
        // All zeros: sign is irrelevant.
        return Some((false, String::new(), String::new()));
    }
    Some((negative, int_trimmed, frac_trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_equals_nan() {
        assert_eq!(
            ScalarValue::Double(f64::NAN),
            ScalarValue::Double(f64::NAN)
        );
        assert_ne!(ScalarValue::Double(f64::NAN), ScalarValue::Double(1.0));
    }

    #[test]
    fn decimal_equality_is_numeric() {
        assert_eq!(
            ScalarValue::Decimal("1.50".into()),
            ScalarValue::Decimal("1.5".into())
        );
        assert_eq!(
            ScalarValue::Decimal("-0".into()),
            ScalarValue::Decimal("0.00".into())
        );
        assert_ne!(
            ScalarValue::Decimal("1.5".into()),
            ScalarValue::Decimal("1.55".into())
        );
    }

    #[test]
    fn guid_equality_ignores_case() {
        assert_eq!(
            ScalarValue::Guid("38CF68C2-4010-4CCC-8922-868217F03DDC".into()),
            ScalarValue::Guid("38cf68c2-4010-4ccc-8922-868217f03ddc".into())
        );
    }

    #[test]
    fn cross_kind_never_equal() {
        assert_ne!(ScalarValue::Int32(1), ScalarValue::Int64(1));
        assert_ne!(ScalarValue::Null, ScalarValue::String(String::new()));
    }
}
