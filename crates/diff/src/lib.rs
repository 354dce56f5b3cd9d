//! Structural differ over payload element trees.
//!
//! [`PayloadComparer::compare`] walks an expected and an observed tree in
//! lockstep and reports the first mismatch as a [`CompareFailure`] whose
//! path localizes it without re-running anything. Two modes adjust what
//! counts as a match:
//!
//! | option | effect |
//! |---|---|
//! | `ignore_order` | observed instance properties are realigned to the expected order by name before comparing |
//! | `expect_metadata_computed_by_convention` | identity links the server computes (ids, edit links, association links, stream links) only need to be non-null when the expected side left them null |
//!
//! Comparison is exact everywhere else, with two documented exceptions: an
//! expected `ComplexInstance` accepts an observed `EntityInstance` (the two
//! are indistinguishable without metadata), and either encoding of absence
//! (a typed null value or a `NullPropertyInstance`) accepts the other.

mod compare;
mod failure;

pub use failure::{CompareFailure, PathSegment};

/// Comparison modes. Both default to off, which means strict positional,
/// exact-match comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompareOptions {
    /// Match instance properties by name instead of position. Unmatched
    /// observed properties are appended after the matched ones; duplicate
    /// names are unsupported and not detected. Collections, feeds, batch
    /// parts and multi-value items always compare positionally.
    pub ignore_order: bool,
    /// Accept any non-null value for identity metadata the expected tree
    /// left unspecified, reflecting values a server derives from its naming
    /// convention.
    pub expect_metadata_computed_by_convention: bool,
}

/// The comparator. Stateless across calls; concurrent `compare` calls on
/// different trees need no synchronization.
#[derive(Debug, Clone, Default)]
pub struct PayloadComparer {
    pub options: CompareOptions,
}

impl PayloadComparer {
    pub fn new(options: CompareOptions) -> Self {
        Self { options }
    }
}
