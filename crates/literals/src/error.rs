//! Literal codec error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LiteralError {
    #[error("malformed {kind} literal: `{text}`")]
    Malformed { kind: &'static str, text: String },
    #[error("value out of range for {kind}: `{text}`")]
    OutOfRange { kind: &'static str, text: String },
    #[error("date literal matches neither the ticks form nor the ISO form: `{0}`")]
    UnrecognizedDateFormat(String),
    #[error("unknown edm primitive type: `{0}`")]
    UnknownEdmType(String),
    #[error("spatial support is not configured; cannot handle: `{0}`")]
    SpatialUnsupported(String),
    #[error("cannot serialize {0} in this wire dialect")]
    Unserializable(&'static str),
    #[error("json literal parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LiteralError {
    pub(crate) fn malformed(kind: &'static str, text: impl Into<String>) -> Self {
        LiteralError::Malformed {
            kind,
            text: text.into(),
        }
    }

    pub(crate) fn out_of_range(kind: &'static str, text: impl Into<String>) -> Self {
        LiteralError::OutOfRange {
            kind,
            text: text.into(),
        }
    }
}
