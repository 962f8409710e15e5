//! Version negotiation: the magic preamble, version slots and the
//! feature matrix keyed by negotiated version.

pub mod negotiation;
pub mod version;

pub use negotiation::{
    build_proposal, default_proposal, parse_reply, VersionOffer, BOLT_MAGIC, DEFAULT_OFFERS,
    PROPOSAL_SIZE, REPLY_SIZE,
};
pub use version::BoltVersion;
