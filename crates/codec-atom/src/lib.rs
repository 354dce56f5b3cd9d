//! Atom/XML payload codec.
//!
//! The wire dialect spreads one logical payload across Atom machinery:
//! entities are `entry` elements whose identity, links, streams and type
//! live in `atom:link`/`category` children while structural properties sit
//! under `content`/`m:properties`. Decoding dispatches on the root element's
//! name and namespace; encoding writes the mirror shape in a fixed child
//! order. Non-standard subtrees captured during decode are carried as
//! verbatim annotations and written back byte-for-byte.
//!
//! | Direction | Entry point |
//! |-----------|-------------|
//! | bytes to tree | [`AtomPayloadCodec::decode`] |
//! | tree to bytes | [`AtomPayloadCodec::encode`] |

use odata_literals::XmlLiteralCodec;

mod decode;
mod encode;
mod error;
mod names;
mod xml;

pub use error::AtomCodecError;

#[derive(Debug, Clone, Copy)]
pub struct AtomCodecOptions {
    /// Emit the `<?xml version="1.0" encoding="utf-8"?>` declaration ahead
    /// of the root element. Decoding accepts input with or without one.
    pub write_declaration: bool,
}

impl Default for AtomCodecOptions {
    fn default() -> Self {
        Self {
            write_declaration: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AtomPayloadCodec {
    pub options: AtomCodecOptions,
    literals: XmlLiteralCodec,
}

impl AtomPayloadCodec {
    pub fn new(options: AtomCodecOptions) -> Self {
        Self {
            options,
            literals: XmlLiteralCodec::new(),
        }
    }

    pub(crate) fn literals(&self) -> &XmlLiteralCodec {
        &self.literals
    }
}
