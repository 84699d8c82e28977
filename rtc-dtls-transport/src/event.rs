use shared::error::Error;

use crate::state::RTCDtlsTransportState;

/// Notifications polled from a DTLS transport.
#[derive(Debug, PartialEq)]
pub enum DtlsTransportEvent {
    /// Fired on every state transition, in order.
    OnDtlsTransportStateChange(RTCDtlsTransportState),
    /// Reserved. Failures currently surface only as a transition to
    /// [`RTCDtlsTransportState::Failed`], so this is never emitted.
    OnError(Error),
}
