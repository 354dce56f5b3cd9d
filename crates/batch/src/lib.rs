//! MIME multipart batch envelope codec.
//!
//! A batch body is `--boundary\r\n part (\r\n--boundary\r\n part)* --boundary--`
//! where each part is either one HTTP operation (`application/http`) or one
//! changeset (`multipart/mixed` with its own boundary, split exactly one
//! level deeper). This crate owns the envelope only; the structural payload
//! inside each operation is delegated through [`PartBodyCodec`], so the
//! envelope layer never depends on a concrete
//! JSON or XML codec.
//!
//! | Layer | Entry points |
//! |-------|--------------|
//! | Byte scanning | [`split_parts`], [`join_parts`] |
//! | Request trees | [`build_request`], [`serialize_request`] |
//! | Response trees | [`build_response`], [`serialize_response`] |

mod error;
mod operation;
mod request;
mod response;
mod scan;

pub use error::BatchError;
pub use request::{build_request, serialize_request};
pub use response::{build_response, serialize_response};
pub use scan::{boundary_param, content_type, is_multipart, join_parts, split_parts, MimePart};

use odata_payload::PayloadElement;

/// Error type a part body codec reports through.
pub type BodyCodecError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Structural codec for the bodies inside operation parts, selected by the
/// operation's `Content-Type` header.
pub trait PartBodyCodec {
    fn decode_part_body(
        &self,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<PayloadElement, BodyCodecError>;

    fn encode_part_body(
        &self,
        content_type: &str,
        element: &PayloadElement,
    ) -> Result<Vec<u8>, BodyCodecError>;
}
