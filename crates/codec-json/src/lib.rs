//! Verbose JSON payload codec.
//!
//! The wire dialect tags nothing: an object is a deferred link, an entity,
//! a collection wrapper or a complex value depending purely on which
//! reserved property names (`__metadata`, `__deferred`, `results`, …) it
//! carries. Decoding is therefore shape classification in a fixed priority
//! order, and encoding mirrors the same rules in reverse.
//!
//! | Direction | Entry point |
//! |-----------|-------------|
//! | bytes to tree | [`JsonPayloadCodec::decode`] |
//! | tree to bytes | [`JsonPayloadCodec::encode`] |

use std::sync::Arc;

use odata_literals::{
    JsonDateFormat, JsonLiteralCodec, JsonLiteralOptions, NullSpatialHandler, SpatialHandler,
};

mod decode;
mod encode;
mod error;
mod names;

pub use error::JsonCodecError;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodecOptions {
    pub date_format: JsonDateFormat,
    /// Wrap the encoded payload in the legacy `{"d": …}` response envelope.
    /// Decoding strips the envelope whether or not this is set.
    pub wrap_in_d: bool,
}

#[derive(Debug, Clone)]
pub struct JsonPayloadCodec {
    pub options: JsonCodecOptions,
    literals: JsonLiteralCodec,
    spatial: Arc<dyn SpatialHandler>,
}

impl Default for JsonPayloadCodec {
    fn default() -> Self {
        Self::new(JsonCodecOptions::default())
    }
}

impl JsonPayloadCodec {
    pub fn new(options: JsonCodecOptions) -> Self {
        Self::with_spatial_handler(options, Arc::new(NullSpatialHandler))
    }

    pub fn with_spatial_handler(
        options: JsonCodecOptions,
        spatial: Arc<dyn SpatialHandler>,
    ) -> Self {
        Self {
            options,
            literals: JsonLiteralCodec::new(JsonLiteralOptions {
                date_format: options.date_format,
            }),
            spatial,
        }
    }

    pub(crate) fn literals(&self) -> &JsonLiteralCodec {
        &self.literals
    }

    pub(crate) fn spatial(&self) -> &dyn SpatialHandler {
        self.spatial.as_ref()
    }
}
