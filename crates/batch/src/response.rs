//! Batch response building and serialization.
//!
//! A response body carries no information about which request each part
//! answers, so building one requires the originating request tree. Pairing
//! is positional: a FIFO queue over the request parts hands out the next
//! unconsumed part as each response part is scanned, and a nested queue does
//! the same for the operations inside a changeset. Any part left over on
//! either side is a hard failure.

use std::collections::VecDeque;

use odata_payload::{
    BatchRequestChangeset, BatchRequestPart, BatchRequestPayload, BatchResponseChangeset,
    BatchResponsePart, BatchResponsePayload,
};
use tracing::debug;

use crate::error::BatchError;
use crate::operation::{
    changeset_part_headers, parse_response_operation, serialize_response_operation,
};
use crate::scan::{self, MimePart};
use crate::PartBodyCodec;

/// Parses a batch response body, pairing each part against `request`.
pub fn build_response(
    bytes: &[u8],
    boundary: &str,
    request: &BatchRequestPayload,
    codec: &dyn PartBodyCodec,
) -> Result<BatchResponsePayload, BatchError> {
    debug!(boundary, len = bytes.len(), "building batch response");
    let mut pending: VecDeque<&BatchRequestPart> = request.parts.iter().collect();
    let mut parts = Vec::new();
    for part in scan::split_parts(bytes, boundary)? {
        let origin = pending.pop_front().ok_or_else(|| {
            BatchError::Pairing("more response parts than request parts".to_string())
        })?;
        parts.push(build_response_part(&part, origin, codec)?);
    }
    if !pending.is_empty() {
        return Err(BatchError::Pairing(format!(
            "{} request part(s) received no response",
            pending.len()
        )));
    }
    Ok(BatchResponsePayload {
        boundary: boundary.to_string(),
        parts,
        annotations: Vec::new(),
    })
}

fn build_response_part(
    part: &MimePart,
    origin: &BatchRequestPart,
    codec: &dyn PartBodyCodec,
) -> Result<BatchResponsePart, BatchError> {
    match part.header("Content-Type").filter(|ct| scan::is_multipart(ct)) {
        Some(content_type) => {
            let inner = scan::boundary_param(content_type)
                .ok_or(BatchError::MissingChangesetBoundary)?;
            match origin {
                BatchRequestPart::Changeset(changeset) => {
                    Ok(BatchResponsePart::Changeset(build_response_changeset(
                        &part.body, &inner, changeset, codec,
                    )?))
                }
                BatchRequestPart::Operation(_) => Err(BatchError::Pairing(
                    "changeset response arrived where the request queued a single operation"
                        .to_string(),
                )),
            }
        }
        None => match origin {
            BatchRequestPart::Operation(_) => Ok(BatchResponsePart::Operation(
                parse_response_operation(&part.body, codec)?,
            )),
            BatchRequestPart::Changeset(_) => Err(BatchError::Pairing(
                "operation response arrived where the request queued a changeset".to_string(),
            )),
        },
    }
}

fn build_response_changeset(
    body: &[u8],
    boundary: &str,
    request: &BatchRequestChangeset,
    codec: &dyn PartBodyCodec,
) -> Result<BatchResponseChangeset, BatchError> {
    let mut pending = request.operations.len();
    let mut operations = Vec::new();
    for part in scan::split_parts(body, boundary)? {
        if part.header("Content-Type").map_or(false, scan::is_multipart) {
            return Err(BatchError::NestedChangeset);
        }
        if pending == 0 {
            return Err(BatchError::Pairing(
                "changeset response has more operations than the request".to_string(),
            ));
        }
        pending -= 1;
        operations.push(parse_response_operation(&part.body, codec)?);
    }
    if pending != 0 {
        return Err(BatchError::Pairing(format!(
            "{pending} changeset operation(s) received no response"
        )));
    }
    Ok(BatchResponseChangeset {
        boundary: boundary.to_string(),
        operations,
        annotations: Vec::new(),
    })
}

/// Writes a batch response back to wire bytes.
pub fn serialize_response(
    payload: &BatchResponsePayload,
    codec: &dyn PartBodyCodec,
) -> Result<Vec<u8>, BatchError> {
    debug!(
        boundary = payload.boundary.as_str(),
        parts = payload.parts.len(),
        "serializing batch response"
    );
    let mut parts = Vec::new();
    for part in &payload.parts {
        parts.push(match part {
            BatchResponsePart::Operation(op) => serialize_response_operation(op, codec)?,
            BatchResponsePart::Changeset(changeset) => {
                serialize_response_changeset(changeset, codec)?
            }
        });
    }
    Ok(scan::join_parts(&parts, &payload.boundary))
}

fn serialize_response_changeset(
    changeset: &BatchResponseChangeset,
    codec: &dyn PartBodyCodec,
) -> Result<MimePart, BatchError> {
    let mut inner = Vec::new();
    for op in &changeset.operations {
        inner.push(serialize_response_operation(op, codec)?);
    }
    Ok(MimePart {
        headers: changeset_part_headers(&changeset.boundary),
        body: scan::join_parts(&inner, &changeset.boundary),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::EchoCodec;
    use odata_payload::{HttpRequestOperation, HttpVerb, PayloadElement};

    fn request_with(parts: Vec<BatchRequestPart>) -> BatchRequestPayload {
        BatchRequestPayload {
            boundary: "batch_req".to_string(),
            parts,
            annotations: Vec::new(),
        }
    }

    fn op_part() -> BatchRequestPart {
        BatchRequestPart::Operation(HttpRequestOperation::new(
            HttpVerb::Get,
            "Customers",
            PayloadElement::empty_primitive(),
        ))
    }

    fn changeset_part(count: usize) -> BatchRequestPart {
        BatchRequestPart::Changeset(BatchRequestChangeset {
            boundary: "cs_req".to_string(),
            operations: (0..count)
                .map(|i| {
                    HttpRequestOperation::new(
                        HttpVerb::Post,
                        format!("Customers_{i}"),
                        PayloadElement::empty_primitive(),
                    )
                })
                .collect(),
            annotations: Vec::new(),
        })
    }

    #[test]
    fn pairs_operations_and_changesets_in_order() {
        let body = "--r\r\n\
                    Content-Type: application/http\r\n\
                    \r\n\
                    HTTP/1.1 200 OK\r\n\
                    \r\n\r\n\
                    --r\r\n\
                    Content-Type: multipart/mixed; boundary=csr\r\n\
                    \r\n\
                    --csr\r\n\
                    Content-Type: application/http\r\n\
                    \r\n\
                    HTTP/1.1 201 Created\r\n\
                    \r\n\r\n\
                    --csr\r\n\
                    Content-Type: application/http\r\n\
                    \r\n\
                    HTTP/1.1 204 No Content\r\n\
                    \r\n\r\n\
                    --csr--\r\n\
                    --r--";
        let request = request_with(vec![op_part(), changeset_part(2)]);
        let response = build_response(body.as_bytes(), "r", &request, &EchoCodec).unwrap();

        assert_eq!(response.parts.len(), 2);
        match &response.parts[0] {
            BatchResponsePart::Operation(op) => assert_eq!(op.status_code, 200),
            other => panic!("unexpected part {other:?}"),
        }
        match &response.parts[1] {
            BatchResponsePart::Changeset(changeset) => {
                assert_eq!(changeset.boundary, "csr");
                assert_eq!(changeset.operations[0].status_code, 201);
                assert_eq!(changeset.operations[1].status_code, 204);
            }
            other => panic!("unexpected part {other:?}"),
        }
    }

    #[test]
    fn extra_response_part_is_a_pairing_failure() {
        let body = "--r\r\n\
                    Content-Type: application/http\r\n\
                    \r\n\
                    HTTP/1.1 200 OK\r\n\
                    \r\n\r\n\
                    --r\r\n\
                    Content-Type: application/http\r\n\
                    \r\n\
                    HTTP/1.1 200 OK\r\n\
                    \r\n\r\n\
                    --r--";
        let request = request_with(vec![op_part()]);
        let err = build_response(body.as_bytes(), "r", &request, &EchoCodec).unwrap_err();
        assert!(matches!(err, BatchError::Pairing(_)));
    }

    #[test]
    fn unanswered_request_part_is_a_pairing_failure() {
        let body = "--r\r\n\
                    Content-Type: application/http\r\n\
                    \r\n\
                    HTTP/1.1 200 OK\r\n\
                    \r\n\r\n\
                    --r--";
        let request = request_with(vec![op_part(), op_part()]);
        let err = build_response(body.as_bytes(), "r", &request, &EchoCodec).unwrap_err();
        match err {
            BatchError::Pairing(message) => {
                assert!(message.contains("received no response"), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn changeset_response_against_queued_operation_fails() {
        let body = "--r\r\n\
                    Content-Type: multipart/mixed; boundary=csr\r\n\
                    \r\n\
                    --csr\r\n--csr--\r\n\
                    --r--";
        let request = request_with(vec![op_part()]);
        let err = build_response(body.as_bytes(), "r", &request, &EchoCodec).unwrap_err();
        assert!(matches!(err, BatchError::Pairing(_)));
    }

    #[test]
    fn response_serialization_round_trips() {
        let request = request_with(vec![changeset_part(1), op_part()]);
        let response = BatchResponsePayload {
            boundary: "resp".to_string(),
            parts: vec![
                BatchResponsePart::Changeset(BatchResponseChangeset {
                    boundary: "csresp".to_string(),
                    operations: vec![odata_payload::HttpResponseOperation::new(
                        201,
                        "Created",
                        PayloadElement::empty_primitive(),
                    )],
                    annotations: Vec::new(),
                }),
                BatchResponsePart::Operation(odata_payload::HttpResponseOperation::new(
                    200,
                    "OK",
                    PayloadElement::empty_primitive(),
                )),
            ],
            annotations: Vec::new(),
        };
        let bytes = serialize_response(&response, &EchoCodec).unwrap();
        let back = build_response(&bytes, "resp", &request, &EchoCodec).unwrap();
        assert_eq!(serialize_response(&back, &EchoCodec).unwrap(), bytes);
    }
}
