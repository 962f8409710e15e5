//! PackStream, the binary value format carried by Bolt.
//!
//! Values are marker-prefixed: `null`, booleans, integers (smallest
//! encoding wins), 64-bit floats, byte arrays, UTF-8 strings, lists,
//! string-keyed maps and tagged structures. Graph entities (nodes,
//! relationships, paths) are structures with well-known signatures.

pub mod decoder;
pub mod encoder;
pub mod marker;
pub mod structures;
pub mod value;

pub use decoder::{decode, decode_prefix, Decoder};
pub use encoder::{encode, Encoder};
pub use structures::{GraphStruct, Node, Path, Relationship, UnboundRelationship};
pub use value::{Structure, Value};

use thiserror::Error;

/// PackStream codec failures.
#[derive(Debug, Clone, Error)]
pub enum PackStreamError {
    /// Input ended inside a value.
    #[error("unexpected end of PackStream data")]
    UnexpectedEof,

    /// Marker byte outside the PackStream vocabulary.
    #[error("unknown PackStream marker 0x{0:02X}")]
    UnknownMarker(u8),

    /// String payload was not valid UTF-8.
    #[error("invalid UTF-8 in string: {0}")]
    InvalidUtf8(String),

    /// Map key decoded to something other than a string.
    #[error("map key must be a string, got {0}")]
    NonStringMapKey(&'static str),

    /// Structure signature outside the known graph vocabulary.
    #[error("unknown structure signature 0x{0:02X}")]
    UnknownStructSignature(u8),

    /// Value exceeds the 32-bit size prefix.
    #[error("{0} too large to encode: {1} entries")]
    ValueTooLarge(&'static str, usize),

    /// Structure shape does not match its signature.
    #[error("invalid structure: {0}")]
    InvalidStructure(String),
}
