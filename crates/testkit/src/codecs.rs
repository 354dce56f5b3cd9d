//! Content-type driven codec registry.
//!
//! One value owning a configured JSON codec and a configured Atom codec,
//! picking between them (or the batch envelope, with itself as the part
//! body codec) by media type. Unknown content types are not an error on
//! decode: the bytes ride along as a raw-text annotated primitive, the
//! same fallback the batch layer uses for parts with no content type.

use thiserror::Error;
use tracing::debug;

use odata_batch::{
    boundary_param, build_request, build_response, is_multipart, serialize_request,
    serialize_response, BatchError, BodyCodecError, PartBodyCodec,
};
use odata_codec_atom::{AtomCodecError, AtomCodecOptions, AtomPayloadCodec};
use odata_codec_json::{JsonCodecError, JsonCodecOptions, JsonPayloadCodec};
use odata_payload::{Annotation, AnnotationBag, BatchRequestPayload, ElementKind, PayloadElement};

/// Anything a registry-level call can fail with, one variant per layer.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("json codec: {0}")]
    Json(#[from] JsonCodecError),
    #[error("atom codec: {0}")]
    Atom(#[from] AtomCodecError),
    #[error("batch envelope: {0}")]
    Batch(#[from] BatchError),
    #[error("multipart content type carries no boundary parameter")]
    MissingBoundary,
    #[error("no multipart form for {0}")]
    NotMultipart(ElementKind),
    #[error("no codec for content type `{0}`")]
    UnknownContentType(String),
}

#[derive(Debug, Clone, Default)]
pub struct PayloadCodecs {
    pub json: JsonPayloadCodec,
    pub atom: AtomPayloadCodec,
}

impl PayloadCodecs {
    pub fn new(json: JsonCodecOptions, atom: AtomCodecOptions) -> Self {
        Self {
            json: JsonPayloadCodec::new(json),
            atom: AtomPayloadCodec::new(atom),
        }
    }

    /// Decodes by content type. A `multipart/mixed` body is read as a batch
    /// request; for responses use [`PayloadCodecs::decode_response`], which
    /// needs the originating request for pairing.
    pub fn decode(&self, content_type: &str, bytes: &[u8]) -> Result<PayloadElement, CodecError> {
        debug!(content_type, len = bytes.len(), "decoding by content type");
        match media_type(content_type).as_str() {
            "application/json" => Ok(self.json.decode(bytes)?),
            "application/atom+xml" | "application/xml" | "text/xml" => {
                Ok(self.atom.decode(bytes)?)
            }
            "multipart/mixed" => {
                let boundary =
                    boundary_param(content_type).ok_or(CodecError::MissingBoundary)?;
                Ok(PayloadElement::BatchRequestPayload(build_request(
                    bytes, &boundary, self,
                )?))
            }
            _ => Ok(PayloadElement::empty_primitive().with_annotation(Annotation::RawText(
                String::from_utf8_lossy(bytes).into_owned(),
            ))),
        }
    }

    pub fn decode_response(
        &self,
        content_type: &str,
        bytes: &[u8],
        request: &BatchRequestPayload,
    ) -> Result<PayloadElement, CodecError> {
        if is_multipart(content_type) {
            let boundary = boundary_param(content_type).ok_or(CodecError::MissingBoundary)?;
            return Ok(PayloadElement::BatchResponsePayload(build_response(
                bytes, &boundary, request, self,
            )?));
        }
        self.decode(content_type, bytes)
    }

    pub fn encode(
        &self,
        content_type: &str,
        element: &PayloadElement,
    ) -> Result<Vec<u8>, CodecError> {
        debug!(content_type, kind = %element.kind(), "encoding by content type");
        match media_type(content_type).as_str() {
            "application/json" => Ok(self.json.encode(element)?),
            "application/atom+xml" | "application/xml" | "text/xml" => {
                Ok(self.atom.encode(element)?)
            }
            "multipart/mixed" => match element {
                PayloadElement::BatchRequestPayload(batch) => {
                    Ok(serialize_request(batch, self)?)
                }
                PayloadElement::BatchResponsePayload(batch) => {
                    Ok(serialize_response(batch, self)?)
                }
                other => Err(CodecError::NotMultipart(other.kind())),
            },
            _ => match element.annotations().raw_text() {
                Some(text) => Ok(text.as_bytes().to_vec()),
                None => Err(CodecError::UnknownContentType(content_type.to_string())),
            },
        }
    }
}

impl PartBodyCodec for PayloadCodecs {
    fn decode_part_body(
        &self,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<PayloadElement, BodyCodecError> {
        Ok(self.decode(content_type, bytes)?)
    }

    fn encode_part_body(
        &self,
        content_type: &str,
        element: &PayloadElement,
    ) -> Result<Vec<u8>, BodyCodecError> {
        Ok(self.encode(content_type, element)?)
    }
}

fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use odata_payload::{DeferredLink, ScalarValue};

    fn registry() -> PayloadCodecs {
        PayloadCodecs::default()
    }

    #[test]
    fn json_media_type_reaches_the_json_codec() {
        let element = registry()
            .decode(
                "application/json;odata=verbose",
                br#"{"uri":"Products(1)"}"#,
            )
            .unwrap();
        assert_eq!(
            element,
            PayloadElement::DeferredLink(DeferredLink::new("Products(1)"))
        );
    }

    #[test]
    fn xml_media_types_reach_the_atom_codec() {
        let body =
            br#"<uri xmlns="http://schemas.microsoft.com/ado/2007/08/dataservices">Products(2)</uri>"#;
        for content_type in ["application/atom+xml;type=entry", "application/xml", "text/xml"] {
            let element = registry().decode(content_type, body).unwrap();
            assert_eq!(
                element,
                PayloadElement::DeferredLink(DeferredLink::new("Products(2)")),
                "content type {content_type}"
            );
        }
    }

    #[test]
    fn unknown_content_type_round_trips_as_raw_text() {
        let registry = registry();
        let element = registry
            .decode("application/octet-stream", b"opaque body")
            .unwrap();
        assert_eq!(element.annotations().raw_text(), Some("opaque body"));
        assert!(matches!(
            element,
            PayloadElement::PrimitiveValue(ref v) if v.value == ScalarValue::Null
        ));
        let bytes = registry
            .encode("application/octet-stream", &element)
            .unwrap();
        assert_eq!(bytes, b"opaque body");
    }

    #[test]
    fn unknown_content_type_without_raw_text_cannot_encode() {
        let err = registry()
            .encode("application/octet-stream", &PayloadElement::empty_primitive())
            .unwrap_err();
        assert!(matches!(err, CodecError::UnknownContentType(_)));
    }

    #[test]
    fn multipart_without_boundary_is_rejected() {
        let err = registry()
            .decode("multipart/mixed", b"--x\r\n")
            .unwrap_err();
        assert!(matches!(err, CodecError::MissingBoundary));
    }

    #[test]
    fn only_batch_trees_have_a_multipart_form() {
        let err = registry()
            .encode(
                "multipart/mixed;boundary=b",
                &PayloadElement::empty_primitive(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::NotMultipart(ElementKind::PrimitiveValue)
        ));
    }
}
