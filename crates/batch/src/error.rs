//! Batch codec error type.

use thiserror::Error;

use crate::BodyCodecError;

/// Every variant except `Pairing` means malformed wire input; `Pairing`
/// means the response body and the originating request disagree about the
/// batch structure. Both are hard failures with no recovery path.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("batch body does not start with `--{0}`")]
    MissingFirstBoundary(String),
    #[error("batch body does not end with `--{0}--`")]
    MissingTerminalBoundary(String),
    #[error("malformed batch part: {0}")]
    MalformedPart(String),
    #[error("malformed request line: `{0}`")]
    MalformedRequestLine(String),
    #[error("malformed status line: `{0}`")]
    MalformedStatusLine(String),
    #[error("changeset part declares multipart content but no boundary parameter")]
    MissingChangesetBoundary,
    #[error("changesets cannot nest: found a multipart part inside a changeset")]
    NestedChangeset,
    #[error("response/request pairing broke: {0}")]
    Pairing(String),
    #[error("part body codec failed: {0}")]
    Body(BodyCodecError),
}
