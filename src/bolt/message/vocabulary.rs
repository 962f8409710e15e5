//! Per-version message vocabulary.
//!
//! `is_legal` answers whether a message kind belongs to a version's
//! vocabulary at all. Normalization of equivalent request forms
//! (PULL_ALL vs PULL, ACK_FAILURE vs RESET) happens at the request
//! layer before legality is enforced.

use crate::bolt::handshake::BoltVersion;

/// Every request kind a caller can ask for.
///
/// The bare streaming forms (`PullAll`, `DiscardAll`) are distinct
/// kinds from their `{n, qid}` counterparts: they belong to disjoint
/// version ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Init,
    Hello,
    Logon,
    Logoff,
    Telemetry,
    Goodbye,
    AckFailure,
    Reset,
    Run,
    Discard,
    DiscardAll,
    Pull,
    PullAll,
    Begin,
    Commit,
    Rollback,
    Route,
}

impl MessageKind {
    pub fn name(self) -> &'static str {
        match self {
            MessageKind::Init => "INIT",
            MessageKind::Hello => "HELLO",
            MessageKind::Logon => "LOGON",
            MessageKind::Logoff => "LOGOFF",
            MessageKind::Telemetry => "TELEMETRY",
            MessageKind::Goodbye => "GOODBYE",
            MessageKind::AckFailure => "ACK_FAILURE",
            MessageKind::Reset => "RESET",
            MessageKind::Run => "RUN",
            MessageKind::Discard => "DISCARD",
            MessageKind::DiscardAll => "DISCARD_ALL",
            MessageKind::Pull => "PULL",
            MessageKind::PullAll => "PULL_ALL",
            MessageKind::Begin => "BEGIN",
            MessageKind::Commit => "COMMIT",
            MessageKind::Rollback => "ROLLBACK",
            MessageKind::Route => "ROUTE",
        }
    }
}

/// Whether `kind` is part of `version`'s request vocabulary.
pub fn is_legal(version: BoltVersion, kind: MessageKind) -> bool {
    match kind {
        MessageKind::Init => version.uses_init(),
        MessageKind::Hello => !version.uses_init(),
        MessageKind::Logon | MessageKind::Logoff => version.supports_logon(),
        MessageKind::Telemetry => version.supports_telemetry(),
        MessageKind::Goodbye => version.supports_goodbye(),
        MessageKind::AckFailure => version.supports_ack_failure(),
        MessageKind::Reset | MessageKind::Run => true,
        MessageKind::Pull | MessageKind::Discard => version.uses_pull_n(),
        MessageKind::PullAll | MessageKind::DiscardAll => !version.uses_pull_n(),
        MessageKind::Begin | MessageKind::Commit | MessageKind::Rollback => {
            version.supports_transactions()
        }
        MessageKind::Route => version.supports_route(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BoltVersion::*;
    use MessageKind::*;

    const GRID: [BoltVersion; 12] = [
        V1, V2, V3, V4_0, V4_2, V4_3, V4_4, V5_0, V5_1, V5_2, V5_4, V5_6,
    ];

    /// Versions (from the grid) whose vocabulary contains the kind.
    fn legal_set(kind: MessageKind) -> Vec<BoltVersion> {
        GRID.iter()
            .copied()
            .filter(|v| is_legal(*v, kind))
            .collect()
    }

    #[test]
    fn init_only_before_v3() {
        assert_eq!(legal_set(Init), vec![V1, V2]);
    }

    #[test]
    fn hello_from_v3() {
        assert_eq!(
            legal_set(Hello),
            vec![V3, V4_0, V4_2, V4_3, V4_4, V5_0, V5_1, V5_2, V5_4, V5_6]
        );
    }

    #[test]
    fn logon_logoff_from_v5_1() {
        assert_eq!(legal_set(Logon), vec![V5_1, V5_2, V5_4, V5_6]);
        assert_eq!(legal_set(Logoff), vec![V5_1, V5_2, V5_4, V5_6]);
    }

    #[test]
    fn bare_streaming_before_v4() {
        assert_eq!(legal_set(PullAll), vec![V1, V2, V3]);
        assert_eq!(legal_set(DiscardAll), vec![V1, V2, V3]);
    }

    #[test]
    fn sized_streaming_from_v4() {
        assert_eq!(
            legal_set(Pull),
            vec![V4_0, V4_2, V4_3, V4_4, V5_0, V5_1, V5_2, V5_4, V5_6]
        );
        assert_eq!(legal_set(Pull), legal_set(Discard));
    }

    #[test]
    fn ack_failure_through_v3() {
        assert_eq!(legal_set(AckFailure), vec![V1, V2, V3]);
    }

    #[test]
    fn transactions_from_v3() {
        for kind in [Begin, Commit, Rollback] {
            assert_eq!(
                legal_set(kind),
                vec![V3, V4_0, V4_2, V4_3, V4_4, V5_0, V5_1, V5_2, V5_4, V5_6]
            );
        }
    }

    #[test]
    fn route_from_v4_3() {
        assert_eq!(
            legal_set(Route),
            vec![V4_3, V4_4, V5_0, V5_1, V5_2, V5_4, V5_6]
        );
    }

    #[test]
    fn telemetry_from_v5_4() {
        assert_eq!(legal_set(Telemetry), vec![V5_4, V5_6]);
    }

    #[test]
    fn run_and_reset_everywhere() {
        assert_eq!(legal_set(Run), GRID.to_vec());
        assert_eq!(legal_set(Reset), GRID.to_vec());
    }

    #[test]
    fn goodbye_from_v3() {
        assert!(!is_legal(V1, Goodbye));
        assert!(!is_legal(V2, Goodbye));
        assert!(is_legal(V3, Goodbye));
        assert!(is_legal(V5_6, Goodbye));
    }
}
