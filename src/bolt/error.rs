//! Wire-level Bolt errors.

use std::io;
use thiserror::Error;

use super::packstream::PackStreamError;

/// Result alias for wire-level operations.
pub type BoltResult<T> = Result<T, BoltError>;

/// Failures at the Bolt wire layer: serialization, framing, handshake
/// and message-shape problems.
#[derive(Debug, Error)]
pub enum BoltError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    PackStream(#[from] PackStreamError),

    /// Server answered the version handshake with the zero slot.
    #[error("server rejected every proposed protocol version")]
    HandshakeRejected,

    /// Server picked a version this client does not implement.
    #[error("server selected unsupported protocol version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    /// Message kind is not part of the negotiated version's vocabulary.
    #[error("message {kind} is not valid for Bolt {version}")]
    InvalidMessageForVersion { kind: &'static str, version: String },

    /// PULL/DISCARD extras outside their allowed ranges.
    #[error("invalid extra parameter: {0}")]
    InvalidExtraParameter(String),

    /// Reassembled message exceeds the configured cap.
    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// A frame decoded into something other than the expected shape.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// Peer closed the socket mid-exchange.
    #[error("connection closed by peer")]
    ConnectionClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_detail() {
        let err = BoltError::UnsupportedVersion { major: 9, minor: 9 };
        assert!(err.to_string().contains("9.9"));

        let err = BoltError::InvalidMessageForVersion {
            kind: "ROUTE",
            version: "3".into(),
        };
        assert!(err.to_string().contains("ROUTE"));

        let err = BoltError::MessageTooLarge { size: 10, max: 5 };
        assert!(err.to_string().contains("10"));
    }

    #[test]
    fn packstream_errors_convert() {
        let err: BoltError = PackStreamError::UnexpectedEof.into();
        assert!(matches!(err, BoltError::PackStream(_)));
    }
}
