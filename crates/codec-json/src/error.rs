use odata_literals::LiteralError;
use odata_payload::ElementKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonCodecError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("literal: {0}")]
    Literal(#[from] LiteralError),

    #[error("malformed payload shape: {0}")]
    Malformed(String),

    #[error("payload nesting exceeds {0} levels")]
    DepthExceeded(usize),

    #[error("no JSON form for {0}")]
    Unencodable(ElementKind),
}
