#![warn(rust_2018_idioms)]

//! Sans-IO DTLS transport for WebRTC style peer connections.
//!
//! The crate drives the DTLS handshake lifecycle on top of an ICE transport:
//! role negotiation, handshake start/accept, and peer authentication by
//! certificate fingerprint. Handshake cryptography is delegated to a
//! [`DtlsEngine`](engine::DtlsEngine) and candidate selection to an
//! [`IceTransport`](ice::IceTransport).

pub mod certificate;
pub mod config;
pub mod engine;
pub mod event;
pub mod fingerprint;
pub mod ice;
pub mod parameters;
pub mod role;
pub mod state;
pub mod transport;
mod verify;

pub use certificate::RTCCertificate;
pub use config::DtlsTransportConfig;
pub use event::DtlsTransportEvent;
pub use fingerprint::{RTCDtlsFingerprint, RTCSignAlgorithm};
pub use parameters::DTLSParameters;
pub use role::RTCDtlsRole;
pub use state::RTCDtlsTransportState;
pub use transport::{CandidateBinding, DtlsTransportId, RTCDtlsTransport};
