//! Single-operation parts: the `application/http` payload inside a batch
//! part. A request part opens with a request line (`GET Customers(1) HTTP/1.1`),
//! a response part with a status line (`HTTP/1.1 200 OK`); either is followed
//! by the operation headers, a blank line, and the operation body.

use odata_payload::{
    Annotation, AnnotationBag, HttpRequestOperation, HttpResponseOperation, HttpVerb,
    PayloadElement,
};

use crate::error::BatchError;
use crate::scan::MimePart;
use crate::PartBodyCodec;

/// Part headers written for every serialized operation part.
pub(crate) fn operation_part_headers() -> Vec<(String, String)> {
    vec![
        ("Content-Type".to_string(), "application/http".to_string()),
        ("Content-Transfer-Encoding".to_string(), "binary".to_string()),
    ]
}

/// Part headers written for a serialized changeset part.
pub(crate) fn changeset_part_headers(boundary: &str) -> Vec<(String, String)> {
    vec![(
        "Content-Type".to_string(),
        format!("multipart/mixed; boundary={boundary}"),
    )]
}

pub(crate) fn parse_request_operation(
    body: &[u8],
    codec: &dyn PartBodyCodec,
) -> Result<HttpRequestOperation, BatchError> {
    let (line, rest) = split_start_line(body)?;
    let mut tokens = line.splitn(3, ' ');
    let verb = tokens
        .next()
        .and_then(HttpVerb::parse)
        .ok_or_else(|| BatchError::MalformedRequestLine(line.to_string()))?;
    let uri = tokens
        .next()
        .ok_or_else(|| BatchError::MalformedRequestLine(line.to_string()))?;
    let version = tokens
        .next()
        .filter(|v| v.starts_with("HTTP/"))
        .ok_or_else(|| BatchError::MalformedRequestLine(line.to_string()))?;

    let (headers, payload) = crate::scan::parse_header_block(rest)?;
    let body = decode_operation_body(&headers, payload, codec)?;
    let mut op = HttpRequestOperation::new(verb, uri, body);
    op.http_version = version.to_string();
    op.headers = headers;
    Ok(op)
}

pub(crate) fn parse_response_operation(
    body: &[u8],
    codec: &dyn PartBodyCodec,
) -> Result<HttpResponseOperation, BatchError> {
    let (line, rest) = split_start_line(body)?;
    let mut tokens = line.splitn(3, ' ');
    let version = tokens
        .next()
        .filter(|v| v.starts_with("HTTP/"))
        .ok_or_else(|| BatchError::MalformedStatusLine(line.to_string()))?;
    let status_code = tokens
        .next()
        .and_then(|c| c.parse::<u16>().ok())
        .ok_or_else(|| BatchError::MalformedStatusLine(line.to_string()))?;
    // The reason phrase is optional; `HTTP/1.1 204` is a complete status line.
    let reason = tokens.next().unwrap_or("");

    let (headers, payload) = crate::scan::parse_header_block(rest)?;
    let body = decode_operation_body(&headers, payload, codec)?;
    let mut op = HttpResponseOperation::new(status_code, reason, body);
    op.http_version = version.to_string();
    op.headers = headers;
    Ok(op)
}

pub(crate) fn serialize_request_operation(
    op: &HttpRequestOperation,
    codec: &dyn PartBodyCodec,
) -> Result<MimePart, BatchError> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!("{} {} {}\r\n", op.verb.as_str(), op.uri, op.http_version).as_bytes(),
    );
    write_operation_tail(&mut body, &op.headers, &op.body, codec)?;
    Ok(MimePart { headers: operation_part_headers(), body })
}

pub(crate) fn serialize_response_operation(
    op: &HttpResponseOperation,
    codec: &dyn PartBodyCodec,
) -> Result<MimePart, BatchError> {
    let mut body = Vec::new();
    let line = if op.reason_phrase.is_empty() {
        format!("{} {}\r\n", op.http_version, op.status_code)
    } else {
        format!("{} {} {}\r\n", op.http_version, op.status_code, op.reason_phrase)
    };
    body.extend_from_slice(line.as_bytes());
    write_operation_tail(&mut body, &op.headers, &op.body, codec)?;
    Ok(MimePart { headers: operation_part_headers(), body })
}

fn write_operation_tail(
    out: &mut Vec<u8>,
    headers: &[(String, String)],
    body: &PayloadElement,
    codec: &dyn PartBodyCodec,
) -> Result<(), BatchError> {
    for (name, value) in headers {
        out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
    }
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(&encode_operation_body(headers, body, codec)?);
    Ok(())
}

/// Splits the request or status line off the front of an operation body.
fn split_start_line(body: &[u8]) -> Result<(&str, &[u8]), BatchError> {
    let end = body
        .windows(2)
        .position(|w| w == b"\r\n")
        .ok_or_else(|| BatchError::MalformedPart("operation has no start line".to_string()))?;
    let line = std::str::from_utf8(&body[..end])
        .map_err(|_| BatchError::MalformedPart("operation start line is not utf-8".to_string()))?;
    Ok((line, &body[end + 2..]))
}

fn decode_operation_body(
    headers: &[(String, String)],
    payload: &[u8],
    codec: &dyn PartBodyCodec,
) -> Result<PayloadElement, BatchError> {
    match crate::scan::content_type(headers) {
        Some(content_type) => codec
            .decode_part_body(content_type, payload)
            .map_err(BatchError::Body),
        // No content type means the body stays opaque. The raw text rides along
        // so serialization can reproduce it.
        None => Ok(PayloadElement::empty_primitive()
            .with_annotation(Annotation::RawText(String::from_utf8_lossy(payload).into_owned()))),
    }
}

fn encode_operation_body(
    headers: &[(String, String)],
    body: &PayloadElement,
    codec: &dyn PartBodyCodec,
) -> Result<Vec<u8>, BatchError> {
    if let Some(text) = body.annotations().raw_text() {
        return Ok(text.as_bytes().to_vec());
    }
    match crate::scan::content_type(headers) {
        Some(content_type) => codec
            .encode_part_body(content_type, body)
            .map_err(BatchError::Body),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::EchoCodec;
    use odata_payload::ScalarValue;

    #[test]
    fn request_line_round_trip() {
        let bytes = b"POST Customers HTTP/1.1\r\nContent-Type: text/plain\r\n\r\nhello";
        let op = parse_request_operation(bytes, &EchoCodec).unwrap();
        assert_eq!(op.verb, HttpVerb::Post);
        assert_eq!(op.uri, "Customers");
        match &*op.body {
            PayloadElement::PrimitiveValue(p) => {
                assert_eq!(p.value, ScalarValue::String("hello".to_string()));
            }
            other => panic!("unexpected body {other:?}"),
        }

        let part = serialize_request_operation(&op, &EchoCodec).unwrap();
        assert_eq!(part.body, bytes);
        assert_eq!(part.headers, operation_part_headers());
    }

    #[test]
    fn status_line_without_reason_phrase() {
        let bytes = b"HTTP/1.1 204\r\n\r\n";
        let op = parse_response_operation(bytes, &EchoCodec).unwrap();
        assert_eq!(op.status_code, 204);
        assert_eq!(op.reason_phrase, "");

        let part = serialize_response_operation(&op, &EchoCodec).unwrap();
        assert_eq!(part.body, bytes);
    }

    #[test]
    fn lowercase_verb_is_rejected() {
        let bytes = b"get Customers HTTP/1.1\r\n\r\n";
        let err = parse_request_operation(bytes, &EchoCodec).unwrap_err();
        assert!(matches!(err, BatchError::MalformedRequestLine(_)));
    }

    #[test]
    fn missing_content_type_keeps_raw_text() {
        let bytes = b"HTTP/1.1 200 OK\r\n\r\n<opaque>";
        let op = parse_response_operation(bytes, &EchoCodec).unwrap();
        assert_eq!(op.body.annotations().raw_text(), Some("<opaque>"));

        // Raw text wins over structural encoding on the way back out.
        let part = serialize_response_operation(&op, &EchoCodec).unwrap();
        assert_eq!(part.body, bytes);
    }
}
