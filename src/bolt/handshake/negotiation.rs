//! Client-side version negotiation.
//!
//! After TCP connect the client writes the 4-byte magic followed by
//! four version slots, most preferred first. Each slot is
//! `[0, range, minor, major]`; a range of `r` offers minors
//! `minor - r ..= minor`. The server answers with one slot naming the
//! accepted version, or all zeroes to reject.

use super::version::BoltVersion;
use crate::bolt::error::BoltError;

/// Handshake preamble.
pub const BOLT_MAGIC: [u8; 4] = [0x60, 0x60, 0xB0, 0x17];

/// Full client proposal: magic + four slots.
pub const PROPOSAL_SIZE: usize = 20;

/// Server reply size.
pub const REPLY_SIZE: usize = 4;

/// One proposed version slot: an exact version or a minor range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionOffer {
    pub major: u8,
    pub minor: u8,
    /// How many consecutive lower minors are also acceptable.
    pub range: u8,
}

impl VersionOffer {
    pub const fn exact(major: u8, minor: u8) -> Self {
        Self {
            major,
            minor,
            range: 0,
        }
    }

    pub const fn with_range(major: u8, minor: u8, range: u8) -> Self {
        Self {
            major,
            minor,
            range,
        }
    }

    fn to_slot(self) -> [u8; 4] {
        [0, self.range, self.minor, self.major]
    }
}

/// Negotiation policy: newest 5.x with a range that skips nothing we
/// implement (5.5 was never assigned), then the 4.x range, then the
/// bare-major v3 and v2 slots.
pub const DEFAULT_OFFERS: [VersionOffer; 4] = [
    VersionOffer::with_range(5, 6, 4),
    VersionOffer::with_range(4, 4, 4),
    VersionOffer::exact(3, 0),
    VersionOffer::exact(2, 0),
];

/// Build the 20-byte client proposal for the given offers.
pub fn build_proposal(offers: &[VersionOffer]) -> [u8; PROPOSAL_SIZE] {
    let mut buf = [0u8; PROPOSAL_SIZE];
    buf[0..4].copy_from_slice(&BOLT_MAGIC);
    for (i, offer) in offers.iter().take(4).enumerate() {
        let at = 4 + i * 4;
        buf[at..at + 4].copy_from_slice(&offer.to_slot());
    }
    buf
}

/// The default proposal bytes.
pub fn default_proposal() -> [u8; PROPOSAL_SIZE] {
    build_proposal(&DEFAULT_OFFERS)
}

/// Parse the server's 4-byte reply into the accepted version.
///
/// A zero slot means the server rejected every offer; a version pair we
/// do not implement is reported as unsupported.
pub fn parse_reply(reply: [u8; REPLY_SIZE]) -> Result<BoltVersion, BoltError> {
    let major = reply[3];
    let minor = reply[2];
    if major == 0 && minor == 0 {
        return Err(BoltError::HandshakeRejected);
    }
    BoltVersion::from_parts(major, minor)
        .ok_or(BoltError::UnsupportedVersion { major, minor })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_starts_with_magic() {
        let buf = default_proposal();
        assert_eq!(&buf[0..4], &[0x60, 0x60, 0xB0, 0x17]);
    }

    #[test]
    fn default_slots_match_policy() {
        let buf = default_proposal();
        assert_eq!(&buf[4..8], &[0, 4, 6, 5]); // 5.6 range 4
        assert_eq!(&buf[8..12], &[0, 4, 4, 4]); // 4.4 range 4
        assert_eq!(&buf[12..16], &[0, 0, 0, 3]); // v3
        assert_eq!(&buf[16..20], &[0, 0, 0, 2]); // v2
    }

    #[test]
    fn unused_slots_are_zero_padded() {
        let buf = build_proposal(&[VersionOffer::exact(3, 0)]);
        assert_eq!(&buf[4..8], &[0, 0, 0, 3]);
        assert_eq!(&buf[8..20], &[0u8; 12]);
    }

    #[test]
    fn reply_vectors_from_the_wire() {
        assert_eq!(parse_reply([0, 0, 0, 3]).unwrap(), BoltVersion::V3);
        assert_eq!(parse_reply([0, 0, 4, 4]).unwrap(), BoltVersion::V4_4);
        assert_eq!(parse_reply([0, 4, 6, 5]).unwrap(), BoltVersion::V5_6);
    }

    #[test]
    fn zero_reply_is_rejection() {
        assert!(matches!(
            parse_reply([0, 0, 0, 0]),
            Err(BoltError::HandshakeRejected)
        ));
    }

    #[test]
    fn unknown_pair_is_unsupported() {
        assert!(matches!(
            parse_reply([0, 0, 5, 5]),
            Err(BoltError::UnsupportedVersion { major: 5, minor: 5 })
        ));
        assert!(matches!(
            parse_reply([0, 0, 0, 9]),
            Err(BoltError::UnsupportedVersion { major: 9, minor: 0 })
        ));
    }
}
