//! Bolt protocol versions and their feature matrix.

use std::fmt;

/// A negotiated Bolt protocol version.
///
/// Discriminants are `(major << 16) | minor`, which makes ordering
/// follow protocol chronology. Bolt 5.5 was never assigned and has no
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum BoltVersion {
    V1 = 0x0001_0000,
    V2 = 0x0002_0000,
    V3 = 0x0003_0000,
    V4_0 = 0x0004_0000,
    V4_1 = 0x0004_0001,
    V4_2 = 0x0004_0002,
    V4_3 = 0x0004_0003,
    V4_4 = 0x0004_0004,
    V5_0 = 0x0005_0000,
    V5_1 = 0x0005_0001,
    V5_2 = 0x0005_0002,
    V5_3 = 0x0005_0003,
    V5_4 = 0x0005_0004,
    V5_6 = 0x0005_0006,
}

impl BoltVersion {
    /// Every implemented version, newest first.
    pub const ALL: [BoltVersion; 14] = [
        BoltVersion::V5_6,
        BoltVersion::V5_4,
        BoltVersion::V5_3,
        BoltVersion::V5_2,
        BoltVersion::V5_1,
        BoltVersion::V5_0,
        BoltVersion::V4_4,
        BoltVersion::V4_3,
        BoltVersion::V4_2,
        BoltVersion::V4_1,
        BoltVersion::V4_0,
        BoltVersion::V3,
        BoltVersion::V2,
        BoltVersion::V1,
    ];

    /// Look up a version from its major/minor pair.
    pub fn from_parts(major: u8, minor: u8) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.major() == major && v.minor() == minor)
    }

    pub fn major(self) -> u8 {
        ((self as u32) >> 16) as u8
    }

    pub fn minor(self) -> u8 {
        ((self as u32) & 0xFFFF) as u8
    }

    /// v1 and v2 authenticate with INIT instead of HELLO.
    pub fn uses_init(self) -> bool {
        self < BoltVersion::V3
    }

    /// Explicit BEGIN/COMMIT/ROLLBACK arrived in v3.
    pub fn supports_transactions(self) -> bool {
        self >= BoltVersion::V3
    }

    /// GOODBYE arrived in v3; older versions just close the socket.
    pub fn supports_goodbye(self) -> bool {
        self >= BoltVersion::V3
    }

    /// v4 replaced bare PULL_ALL/DISCARD_ALL with `{n, qid}` extras.
    pub fn uses_pull_n(self) -> bool {
        self >= BoltVersion::V4_0
    }

    /// ACK_FAILURE exists up to v3; v4+ uses RESET for recovery.
    pub fn supports_ack_failure(self) -> bool {
        self <= BoltVersion::V3
    }

    /// Database selection (`db` in RUN/BEGIN extras) arrived in v4.0.
    pub fn supports_db_selection(self) -> bool {
        self >= BoltVersion::V4_0
    }

    /// Routing context in HELLO arrived in v4.1.
    pub fn supports_routing_context(self) -> bool {
        self >= BoltVersion::V4_1
    }

    /// ROUTE message arrived in v4.3.
    pub fn supports_route(self) -> bool {
        self >= BoltVersion::V4_3
    }

    /// User impersonation (`imp_user`) arrived with ROUTE in v4.3.
    pub fn supports_imp_user(self) -> bool {
        self >= BoltVersion::V4_3
    }

    /// ROUTE's third field became an extra map in v4.4.
    pub fn route_uses_extra_map(self) -> bool {
        self >= BoltVersion::V4_4
    }

    /// Element ids on graph structures arrived in v5.0.
    pub fn uses_element_ids(self) -> bool {
        self >= BoltVersion::V5_0
    }

    /// The `bolt_agent` HELLO map arrived in v5.0.
    pub fn supports_bolt_agent(self) -> bool {
        self >= BoltVersion::V5_0
    }

    /// v5.1 moved authentication out of HELLO into LOGON/LOGOFF.
    pub fn supports_logon(self) -> bool {
        self >= BoltVersion::V5_1
    }

    /// `notifications_minimum_severity` arrived in v5.2.
    pub fn supports_notification_filtering(self) -> bool {
        self >= BoltVersion::V5_2
    }

    /// TELEMETRY arrived in v5.4.
    pub fn supports_telemetry(self) -> bool {
        self >= BoltVersion::V5_4
    }

    /// `notifications_disabled_classifications` arrived in v5.6.
    pub fn supports_notification_classifications(self) -> bool {
        self >= BoltVersion::V5_6
    }
}

impl fmt::Display for BoltVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.major() <= 3 {
            write!(f, "{}", self.major())
        } else {
            write!(f, "{}.{}", self.major(), self.minor())
        }
    }
}
