use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    // Invalid argument
    #[error("dtls transport: ice transport is gone")]
    ErrNoIceTransport,
    #[error("dtls transport: no certificate")]
    ErrNonCertificate,
    #[error("dtls transport: the certificate is expired")]
    ErrCertificateExpired,
    #[error("dtls transport: ice transport is already bound to another dtls transport")]
    ErrIceTransportInUse,
    #[error("dtls transport: remote parameters carry no fingerprint")]
    ErrNoRemoteFingerprints,
    #[error("dtls transport: cipher suite list is empty")]
    ErrNoCipherSuites,
    #[error("dtls transport: diffie-hellman parameters are empty")]
    ErrNoDhParameters,
    #[error("dtls transport: malformed fingerprint")]
    ErrInvalidFingerprint,

    // Invalid state
    #[error("dtls transport: ice transport is closed")]
    ErrIceTransportClosed,
    #[error("dtls transport: start has already been called")]
    ErrInvalidDTLSStart,
    #[error("dtls transport: transport is closed")]
    ErrDtlsTransportClosed,
    #[error("dtls transport: ice role is not resolved yet")]
    ErrIceRoleUnknown,
    #[error("dtls transport: transport is not connected")]
    ErrDtlsTransportNotConnected,

    #[error("dtls transport: local candidate has no socket")]
    ErrNoSocket,
    #[error("dtls transport: unsupported fingerprint algorithm")]
    ErrUnsupportedFingerprintAlgorithm,
    #[error("dtls transport: no remote fingerprint matches the peer certificate")]
    ErrNoMatchingCertificateFingerprint,

    // Transient, reported as a connection reset while ICE converges
    #[error("dtls transport: no selected candidate pair")]
    ErrNoSelectedCandidatePair,
    #[error("dtls transport: selected candidate pair has no socket")]
    ErrSelectedCandidatePairNoSocket,

    //Third Party Error
    #[error("{0}")]
    RcGen(#[from] rcgen::Error),

    //Other Errors
    #[error("Other DTLS Err: {0}")]
    OtherDtlsErr(String),
    #[error("Other ICE Err: {0}")]
    OtherIceErr(String),
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Returns true for the send failures that are expected while ICE is
    /// still converging and that callers should treat like ECONNRESET.
    pub fn is_connection_reset(&self) -> bool {
        matches!(
            self,
            Error::ErrNoSelectedCandidatePair | Error::ErrSelectedCandidatePairNoSocket
        )
    }
}
