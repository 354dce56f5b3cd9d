//! ISO 8601 duration text for `Edm.Time` values.

use chrono::Duration;

use crate::error::LiteralError;

/// Formats a duration as `PT<h>H<m>M<s[.fff]>S`, the day-time subset the
/// protocol uses. Zero renders as `PT0S`.
pub fn format_duration(d: &Duration) -> String {
    let negative = *d < Duration::zero();
    let total_ms = d.num_milliseconds().unsigned_abs();
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str("PT");
    if hours > 0 {
        out.push_str(&format!("{hours}H"));
    }
    if mins > 0 {
        out.push_str(&format!("{mins}M"));
    }
    if secs > 0 || ms > 0 || (hours == 0 && mins == 0) {
        if ms > 0 {
            let frac = format!("{ms:03}");
            out.push_str(&format!("{secs}.{}S", frac.trim_end_matches('0')));
        } else {
            out.push_str(&format!("{secs}S"));
        }
    }
    out
}

/// Parses the `[-]P[nD]T[nH][nM][n[.fff]S]` day-time duration form.
pub fn parse_duration(text: &str) -> Result<Duration, LiteralError> {
    let malformed = || LiteralError::malformed("duration", text);

    let mut s = text.trim();
    let mut negative = false;
    if let Some(rest) = s.strip_prefix('-') {
        negative = true;
        s = rest;
    }
    s = s.strip_prefix('P').ok_or_else(malformed)?;

    let (day_part, time_part) = match s.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (s, None),
    };

    let mut total_ms: i64 = 0;
    if !day_part.is_empty() {
        let days = day_part.strip_suffix('D').ok_or_else(malformed)?;
        let days: i64 = days.parse().map_err(|_| malformed())?;
        total_ms += days * 86_400_000;
    }

    if let Some(mut t) = time_part {
        if t.is_empty() {
            return Err(malformed());
        }
        for (marker, ms_per_unit) in [('H', 3_600_000i64), ('M', 60_000), ('S', 1_000)] {
            if let Some(idx) = t.find(marker) {
                let (num, rest) = t.split_at(idx);
                t = &rest[1..];
                if marker == 'S' {
                    let secs: f64 = num.parse().map_err(|_| malformed())?;
                    total_ms += (secs * 1000.0).round() as i64;
                } else {
                    let units: i64 = num.parse().map_err(|_| malformed())?;
                    total_ms += units * ms_per_unit;
                }
            }
        }
        if !t.is_empty() {
            return Err(malformed());
        }
    }

    if negative {
        total_ms = -total_ms;
    }
    Ok(Duration::milliseconds(total_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_common_values() {
        for text in ["PT0S", "PT12H", "PT12H34M", "PT1M5S", "PT0.5S", "-PT2H"] {
            let d = parse_duration(text).unwrap();
            assert_eq!(format_duration(&d), text, "for {text}");
        }
    }

    #[test]
    fn day_component_folds_into_hours() {
        let d = parse_duration("P1DT2H").unwrap();
        assert_eq!(format_duration(&d), "PT26H");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_duration("12:30").is_err());
        assert!(parse_duration("PTxS").is_err());
        assert!(parse_duration("P").is_ok()); // zero-length duration
    }
}
