//! Byte-level boundary scanning: the split/join pair every batch build
//! routine sits on.
//!
//! The wire shape is `--B\r\n part (\r\n--B\r\n part)* --B--`, terminal
//! marker written with no leading newline, one optional trailing CRLF after
//! it. Any marker out of place is a hard failure; the single exception is a
//! body containing no marker at all, which is a terminal singleton part and
//! comes back unsplit.

use crate::error::BatchError;

/// One raw MIME part: its header block in wire order and its body bytes,
/// both verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimePart {
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl MimePart {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Splits a multipart body into its parts.
///
/// Empty gaps between markers yield no part, so an empty changeset body
/// (`--B\r\n--B--`) splits into zero parts.
pub fn split_parts(bytes: &[u8], boundary: &str) -> Result<Vec<MimePart>, BatchError> {
    let marker = format!("--{boundary}");
    if find(bytes, marker.as_bytes()).is_none() {
        // Terminal singleton: the whole body is one part.
        return Ok(vec![parse_part(bytes)?]);
    }

    let first = format!("--{boundary}\r\n");
    if !bytes.starts_with(first.as_bytes()) {
        return Err(BatchError::MissingFirstBoundary(boundary.to_string()));
    }
    let terminal = format!("--{boundary}--");
    let trimmed = bytes.strip_suffix(b"\r\n").unwrap_or(bytes);
    if !trimmed.ends_with(terminal.as_bytes()) || trimmed.len() < first.len() + terminal.len() {
        return Err(BatchError::MissingTerminalBoundary(boundary.to_string()));
    }

    let content = &trimmed[first.len()..trimmed.len() - terminal.len()];
    let separator = format!("\r\n--{boundary}\r\n");
    let mut parts = Vec::new();
    for gap in split_on(content, separator.as_bytes()) {
        if gap.is_empty() {
            continue;
        }
        parts.push(parse_part(gap)?);
    }
    Ok(parts)
}

/// Exact inverse of [`split_parts`]: first marker, newline-prefixed inner
/// markers, terminal marker with no leading newline.
pub fn join_parts(parts: &[MimePart], boundary: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
        }
        write_part(&mut out, part);
    }
    out.extend_from_slice(format!("--{boundary}--").as_bytes());
    out
}

fn write_part(out: &mut Vec<u8>, part: &MimePart) {
    for (name, value) in &part.headers {
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(&part.body);
}

fn parse_part(bytes: &[u8]) -> Result<MimePart, BatchError> {
    let (headers, body) = parse_header_block(bytes)?;
    Ok(MimePart {
        headers,
        body: body.to_vec(),
    })
}

/// Parses `Name: Value` lines up to the first blank line; the rest of the
/// bytes are returned untouched.
pub fn parse_header_block(bytes: &[u8]) -> Result<(Vec<(String, String)>, &[u8]), BatchError> {
    if let Some(body) = bytes.strip_prefix(b"\r\n") {
        return Ok((Vec::new(), body));
    }
    let sep = find(bytes, b"\r\n\r\n")
        .ok_or_else(|| BatchError::MalformedPart("no blank line after headers".to_string()))?;
    let header_bytes = &bytes[..sep];
    let body = &bytes[sep + 4..];
    let text = std::str::from_utf8(header_bytes)
        .map_err(|_| BatchError::MalformedPart("header block is not valid utf-8".to_string()))?;
    let mut headers = Vec::new();
    for line in text.split("\r\n") {
        let (name, rest) = line
            .split_once(':')
            .ok_or_else(|| BatchError::MalformedPart(format!("header line `{line}` has no colon")))?;
        let value = rest.strip_prefix(' ').unwrap_or(rest);
        headers.push((name.to_string(), value.to_string()));
    }
    Ok((headers, body))
}

/// First `Content-Type` value in a header list, case-insensitive on the name.
pub fn content_type(headers: &[(String, String)]) -> Option<&str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("Content-Type"))
        .map(|(_, v)| v.as_str())
}

/// Whether a content type names a nested multipart body.
pub fn is_multipart(content_type: &str) -> bool {
    let media = content_type.split(';').next().unwrap_or("").trim();
    media.eq_ignore_ascii_case("multipart/mixed")
}

/// Extracts the `boundary=` parameter from a content type.
pub fn boundary_param(content_type: &str) -> Option<String> {
    for param in content_type.split(';').skip(1) {
        if let Some((key, value)) = param.split_once('=') {
            if key.trim().eq_ignore_ascii_case("boundary") {
                return Some(value.trim().trim_matches('"').to_string());
            }
        }
    }
    None
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn split_on<'a>(bytes: &'a [u8], separator: &[u8]) -> Vec<&'a [u8]> {
    let mut segments = Vec::new();
    let mut rest = bytes;
    while let Some(at) = find(rest, separator) {
        segments.push(&rest[..at]);
        rest = &rest[at + separator.len()..];
    }
    segments.push(rest);
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(headers: &[(&str, &str)], body: &[u8]) -> MimePart {
        MimePart {
            headers: headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            body: body.to_vec(),
        }
    }

    #[test]
    fn split_join_inverse_over_varying_parts() {
        let cases = vec![
            vec![],
            vec![part(&[("Content-Type", "application/http")], b"GET a HTTP/1.1\r\n\r\n")],
            vec![
                part(&[("Content-Type", "application/http")], b"one"),
                part(&[], b"two"),
                part(&[("A", "1"), ("B", "2")], b""),
            ],
        ];
        for parts in cases {
            let joined = join_parts(&parts, "batch_1");
            let back = split_parts(&joined, "batch_1").unwrap();
            assert_eq!(back, parts);
        }
    }

    #[test]
    fn empty_changeset_body_yields_zero_parts() {
        let body = b"--cs_1\r\n--cs_1--";
        assert!(split_parts(body, "cs_1").unwrap().is_empty());
    }

    #[test]
    fn body_without_any_marker_is_a_terminal_singleton() {
        let body = b"Content-Type: application/http\r\n\r\nGET Products HTTP/1.1\r\n\r\n";
        let parts = split_parts(body, "batch_1").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].header("content-type"), Some("application/http"));
    }

    #[test]
    fn misplaced_first_marker_is_malformed() {
        let body = b"junk--b\r\nX: 1\r\n\r\nhi\r\n--b--";
        assert!(matches!(
            split_parts(body, "b"),
            Err(BatchError::MissingFirstBoundary(_))
        ));
    }

    #[test]
    fn missing_terminal_marker_is_malformed() {
        let body = b"--b\r\nX: 1\r\n\r\nhi";
        assert!(matches!(
            split_parts(body, "b"),
            Err(BatchError::MissingTerminalBoundary(_))
        ));
    }

    #[test]
    fn terminal_marker_tolerates_one_trailing_crlf() {
        let body = b"--b\r\nX: 1\r\n\r\nhi\r\n--b--\r\n";
        let parts = split_parts(body, "b").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].body, b"hi");
    }

    #[test]
    fn header_values_keep_only_one_leading_space_stripped() {
        let (headers, body) = parse_header_block(b"X:  padded\r\n\r\nrest").unwrap();
        assert_eq!(headers, vec![("X".to_string(), " padded".to_string())]);
        assert_eq!(body, b"rest");
    }

    #[test]
    fn boundary_parameter_parsing() {
        assert_eq!(
            boundary_param("multipart/mixed; boundary=changeset_9"),
            Some("changeset_9".to_string())
        );
        assert_eq!(
            boundary_param("multipart/mixed; charset=utf-8; boundary=\"quoted\""),
            Some("quoted".to_string())
        );
        assert_eq!(boundary_param("application/json"), None);
        assert!(is_multipart("Multipart/Mixed; boundary=b"));
        assert!(!is_multipart("application/http"));
    }
}
