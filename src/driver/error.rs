//! Client-facing error taxonomy.
//!
//! Wire-level failures are folded into a small set of variants that
//! encode the recovery policy: `Connection` means the socket is gone
//! and the lease must be discarded, `Cypher` means the statement failed
//! but the connection recovers via RESET, `InvalidInput` never touched
//! the wire at all.

use thiserror::Error;

use crate::bolt::message::FailureMessage;
use crate::bolt::BoltError;

/// Result alias for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors surfaced by the connection, pool and sandbox layers.
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    /// Version negotiation failed; the connection is unusable.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The server rejected the credentials.
    #[error("authentication failed: {code}: {message}")]
    Auth { code: String, message: String },

    /// A statement failed server-side. The connection was RESET and
    /// remains usable.
    #[error("server failure {code}: {message}")]
    Cypher { code: String, message: String },

    /// Unexpected message shape or an illegal state transition.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// Socket-level failure: closed, refused, timed out mid-exchange.
    #[error("connection error: {0}")]
    Connection(String),

    /// The server ignored a request because it is in a failed state.
    #[error("request ignored: server connection is in a failed state")]
    Ignored,

    /// Bad argument rejected before any wire I/O.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl DriverError {
    /// Whether a retry through [`crate::driver::retry::with_retry`]
    /// may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            DriverError::Connection(_) => true,
            DriverError::Cypher { code, .. } => is_transient_code(code),
            _ => false,
        }
    }

    /// Whether the underlying connection must be discarded.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, DriverError::Connection(_) | DriverError::Handshake(_))
    }

    /// Classify a wire FAILURE: security codes become `Auth`,
    /// everything else `Cypher`.
    pub fn from_failure(failure: &FailureMessage) -> Self {
        if failure.is_security_error() {
            DriverError::Auth {
                code: failure.code.clone(),
                message: failure.message.clone(),
            }
        } else {
            DriverError::Cypher {
                code: failure.code.clone(),
                message: failure.message.clone(),
            }
        }
    }
}

fn is_transient_code(code: &str) -> bool {
    code.starts_with("Neo.TransientError")
        || code == "Neo.ClientError.Cluster.NotALeader"
        || code == "Neo.ClientError.General.ForbiddenOnReadOnlyDatabase"
}

impl From<BoltError> for DriverError {
    fn from(err: BoltError) -> Self {
        match err {
            BoltError::HandshakeRejected => {
                DriverError::Handshake("server rejected every proposed version".to_owned())
            }
            BoltError::UnsupportedVersion { major, minor } => DriverError::Handshake(format!(
                "server selected unsupported version {major}.{minor}"
            )),
            BoltError::Io(e) => DriverError::Connection(e.to_string()),
            BoltError::ConnectionClosed => {
                DriverError::Connection("connection closed by peer".to_owned())
            }
            BoltError::InvalidMessageForVersion { kind, version } => DriverError::InvalidInput(
                format!("message {kind} is not valid for Bolt {version}"),
            ),
            BoltError::InvalidExtraParameter(msg) => DriverError::InvalidInput(msg),
            BoltError::PackStream(e) => DriverError::Protocol(e.to_string()),
            BoltError::MessageTooLarge { size, max } => {
                DriverError::Protocol(format!("message too large: {size} bytes (max {max})"))
            }
            BoltError::Protocol(msg) => DriverError::Protocol(msg),
        }
    }
}
