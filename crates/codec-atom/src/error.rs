//! Atom codec error type.

use odata_payload::ElementKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtomCodecError {
    #[error("payload is not well-formed xml: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed xml attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),
    #[error("xml write error: {0}")]
    Write(#[from] std::io::Error),
    #[error(transparent)]
    Literal(#[from] odata_literals::LiteralError),
    #[error("malformed payload shape: {0}")]
    Malformed(String),
    #[error("payload nesting exceeds {0} levels")]
    DepthExceeded(usize),
    #[error("no atom form for {0}")]
    Unencodable(ElementKind),
}
