//! Harness-side glue over the payload codecs.
//!
//! Three pieces that conformance suites need around the codecs themselves:
//! a registry that picks a codec by content type (and feeds the batch
//! envelope its part bodies), a process-wide transform scope stack with
//! guard-based discipline, and a seedable generator producing payload
//! trees for round-trip and comparison matrices.
//!
//! | Concern | Entry point |
//! |---------|-------------|
//! | Content-type dispatch | [`PayloadCodecs`] |
//! | Scoped transform selection | [`push_scope`] |
//! | Random payload trees | [`PayloadGenerator`] |

mod codecs;
mod generate;
mod scope;

pub use codecs::{CodecError, PayloadCodecs};
pub use generate::PayloadGenerator;
pub use scope::{active_scopes, current_scope, push_scope, scope_depth, ScopeGuard};
