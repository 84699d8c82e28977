use std::fmt;

/// DTLSTransportState indicates the DTLS transport establishment state.
///
/// Transitions only move forward: `new` -> `connecting` -> `connected` or
/// `failed`, and `closed` may be entered from any state that is not terminal.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RTCDtlsTransportState {
    /// DTLSTransportStateNew indicates that DTLS has not started negotiating
    /// yet.
    #[default]
    New,

    /// DTLSTransportStateConnecting indicates that DTLS is in the process of
    /// negotiating a secure connection and verifying the remote fingerprint.
    Connecting,

    /// DTLSTransportStateConnected indicates that DTLS has completed
    /// negotiation of a secure connection and verified the remote fingerprint.
    Connected,

    /// DTLSTransportStateClosed indicates that the transport has been closed
    /// intentionally as the result of receipt of a close_notify alert, or
    /// calling close().
    Closed,

    /// DTLSTransportStateFailed indicates that the transport has failed as
    /// the result of an error (such as receipt of an error alert or failure to
    /// validate the remote fingerprint).
    Failed,
}

const DTLS_TRANSPORT_STATE_NEW_STR: &str = "new";
const DTLS_TRANSPORT_STATE_CONNECTING_STR: &str = "connecting";
const DTLS_TRANSPORT_STATE_CONNECTED_STR: &str = "connected";
const DTLS_TRANSPORT_STATE_CLOSED_STR: &str = "closed";
const DTLS_TRANSPORT_STATE_FAILED_STR: &str = "failed";

impl RTCDtlsTransportState {
    /// Closed and failed are terminal.
    pub fn is_closed(self) -> bool {
        matches!(
            self,
            RTCDtlsTransportState::Closed | RTCDtlsTransportState::Failed
        )
    }
}

impl TryFrom<&str> for RTCDtlsTransportState {
    type Error = shared::error::Error;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        match raw {
            DTLS_TRANSPORT_STATE_NEW_STR => Ok(RTCDtlsTransportState::New),
            DTLS_TRANSPORT_STATE_CONNECTING_STR => Ok(RTCDtlsTransportState::Connecting),
            DTLS_TRANSPORT_STATE_CONNECTED_STR => Ok(RTCDtlsTransportState::Connected),
            DTLS_TRANSPORT_STATE_CLOSED_STR => Ok(RTCDtlsTransportState::Closed),
            DTLS_TRANSPORT_STATE_FAILED_STR => Ok(RTCDtlsTransportState::Failed),
            _ => Err(shared::error::Error::Other(format!(
                "unknown dtls transport state '{raw}'"
            ))),
        }
    }
}

impl fmt::Display for RTCDtlsTransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RTCDtlsTransportState::New => DTLS_TRANSPORT_STATE_NEW_STR,
            RTCDtlsTransportState::Connecting => DTLS_TRANSPORT_STATE_CONNECTING_STR,
            RTCDtlsTransportState::Connected => DTLS_TRANSPORT_STATE_CONNECTED_STR,
            RTCDtlsTransportState::Closed => DTLS_TRANSPORT_STATE_CLOSED_STR,
            RTCDtlsTransportState::Failed => DTLS_TRANSPORT_STATE_FAILED_STR,
        };
        write!(f, "{s}")
    }
}
