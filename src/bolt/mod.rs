//! Bolt wire layer.
//!
//! Everything below the connection lifecycle: the PackStream value
//! codec, chunked message framing, version negotiation and the
//! per-version message vocabulary.
//!
//! Most users should use the [`crate::driver`] module instead of
//! talking to the wire directly.

pub mod codec;
pub mod error;
pub mod handshake;
pub mod message;
pub mod packstream;

pub use codec::ChunkCodec;
pub use error::{BoltError, BoltResult};
pub use handshake::{BoltVersion, BOLT_MAGIC};
pub use message::{
    AccessMode, AuthToken, BoltRequest, BoltResponse, FailureMessage, HelloMessage, MessageKind,
    NotificationConfig, RecordMessage, RouteMessage, RunMessage, StreamExtras, SuccessMessage,
};
pub use packstream::{
    GraphStruct, Node, PackStreamError, Path, Relationship, Structure, UnboundRelationship, Value,
};
