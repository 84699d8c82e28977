//! The slice of an ICE transport a DTLS transport depends on.
//!
//! Candidate gathering, connectivity checks and pair selection live in the
//! ICE agent. The DTLS transport only needs to learn the negotiated role,
//! the validated pairs and which local socket backs a candidate, and it
//! needs a way to have inbound non-STUN datagrams on that socket routed to
//! it.

use std::net::SocketAddr;

use shared::error::Result;

use crate::transport::DtlsTransportId;

pub mod candidate;
pub mod candidate_pair;
pub mod role;
pub mod state;

pub use candidate::{RTCIceCandidate, RTCIceCandidateType};
pub use candidate_pair::RTCIceCandidatePair;
pub use role::RTCIceRole;
pub use state::RTCIceTransportState;

/// Handle for a packet hook registered on a local socket.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HookId(pub u64);

/// Events the ICE side forwards to the DTLS transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IceTransportEvent {
    /// A connectivity check succeeded and the pair may now carry DTLS.
    CandidatePairValidated(RTCIceCandidatePair),
}

/// ICE transport collaborator.
///
/// The owner keeps the ICE transport in an `Rc<RefCell<_>>`; a DTLS
/// transport only holds a `Weak` to it. The ICE transport in turn remembers
/// at most one DTLS transport by id.
pub trait IceTransport {
    fn state(&self) -> RTCIceTransportState;

    /// Resolved ICE role, [`RTCIceRole::Unknown`] until negotiated.
    fn role(&self) -> RTCIceRole;

    /// Currently validated candidate pairs, highest priority first.
    fn validated_candidate_pairs(&self) -> Vec<RTCIceCandidatePair>;

    /// Local socket backing `candidate`, if it has one yet.
    fn candidate_socket(&self, candidate: &RTCIceCandidate) -> Option<SocketAddr>;

    /// Routes inbound non-STUN datagrams received on `socket` to `owner`.
    fn register_hook(&mut self, socket: SocketAddr, owner: DtlsTransportId) -> Result<HookId>;

    fn unregister_hook(&mut self, hook: HookId);

    /// The DTLS transport bound to this ICE transport.
    fn dtls_transport(&self) -> Option<DtlsTransportId>;

    fn set_dtls_transport(&mut self, dtls_transport: Option<DtlsTransportId>);
}
