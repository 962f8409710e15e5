//! Bolt message types and the per-version vocabulary.

pub mod request;
pub mod response;
pub mod vocabulary;

pub use request::{
    AccessMode, AuthToken, BoltRequest, HelloMessage, NotificationConfig, RouteMessage,
    RunMessage, StreamExtras, TxExtras,
};
pub use response::{BoltResponse, FailureMessage, RecordMessage, SuccessMessage};
pub use vocabulary::{is_legal, MessageKind};

/// Message signature bytes.
pub mod signature {
    /// INIT (v1/v2) and HELLO (v3+) share a signature.
    pub const HELLO: u8 = 0x01;
    pub const GOODBYE: u8 = 0x02;
    pub const ACK_FAILURE: u8 = 0x0E;
    pub const RESET: u8 = 0x0F;
    pub const RUN: u8 = 0x10;
    pub const BEGIN: u8 = 0x11;
    pub const COMMIT: u8 = 0x12;
    pub const ROLLBACK: u8 = 0x13;
    /// DISCARD (v4+) and DISCARD_ALL (v1-v3) share a signature.
    pub const DISCARD: u8 = 0x2F;
    /// PULL (v4+) and PULL_ALL (v1-v3) share a signature.
    pub const PULL: u8 = 0x3F;
    pub const TELEMETRY: u8 = 0x54;
    pub const ROUTE: u8 = 0x66;
    pub const LOGON: u8 = 0x6A;
    pub const LOGOFF: u8 = 0x6B;

    pub const SUCCESS: u8 = 0x70;
    pub const RECORD: u8 = 0x71;
    pub const IGNORED: u8 = 0x7E;
    pub const FAILURE: u8 = 0x7F;
}
