//! X.509 certificates presented during the DTLS handshake.
//!
//! A certificate is authenticated out of band: the peer receives its
//! fingerprint through signaling and compares it with the certificate it
//! observes in the handshake.
//!
//! # Examples
//!
//! ```
//! use rcgen::KeyPair;
//! use rtc_dtls_transport::certificate::RTCCertificate;
//! use rtc_dtls_transport::fingerprint::RTCSignAlgorithm;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let key_pair = KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256)?;
//! let certificate = RTCCertificate::from_key_pair(key_pair)?;
//!
//! // a=fingerprint:sha-256 xx:xx:...
//! let fingerprint = certificate.fingerprint(RTCSignAlgorithm::Sha256);
//! println!("a=fingerprint:{fingerprint}");
//! # Ok(())
//! # }
//! ```

use std::time::SystemTime;

use rcgen::{CertificateParams, KeyPair};
use shared::error::{Error, Result};
use shared::util::math_rand_alpha;

use crate::fingerprint::{RTCDtlsFingerprint, RTCSignAlgorithm};

/// X.509 certificate used to authenticate WebRTC peer-to-peer communications.
///
/// Holds the DER encoded certificate, its PKCS#8 private key and the time
/// after which it must no longer be used.
#[derive(Clone, Debug)]
pub struct RTCCertificate {
    pub(crate) certificate: Vec<u8>,
    pub(crate) private_key: Vec<u8>,
    pub(crate) expires: SystemTime,
}

impl PartialEq for RTCCertificate {
    fn eq(&self, other: &Self) -> bool {
        self.certificate == other.certificate
    }
}

impl RTCCertificate {
    fn from_params(params: CertificateParams, key_pair: KeyPair) -> Result<Self> {
        let expires: SystemTime = params.not_after.into();
        let x509_cert = params.self_signed(&key_pair)?;

        Ok(Self {
            certificate: x509_cert.der().to_vec(),
            private_key: key_pair.serialize_der(),
            expires,
        })
    }

    /// Generates a self-signed certificate with a random common name.
    ///
    /// Only ECDSA P-256 and Ed25519 key pairs are accepted.
    pub fn from_key_pair(key_pair: KeyPair) -> Result<Self> {
        if !(key_pair.is_compatible(&rcgen::PKCS_ED25519)
            || key_pair.is_compatible(&rcgen::PKCS_ECDSA_P256_SHA256))
        {
            return Err(Error::Other("Unsupported key_pair".to_owned()));
        }

        RTCCertificate::from_params(CertificateParams::new(vec![math_rand_alpha(16)])?, key_pair)
    }

    /// Wraps certificate material produced elsewhere, e.g. loaded from disk.
    pub fn from_existing(certificate: Vec<u8>, private_key: Vec<u8>, expires: SystemTime) -> Self {
        Self {
            certificate,
            private_key,
            expires,
        }
    }

    /// DER encoded certificate.
    pub fn der(&self) -> &[u8] {
        &self.certificate
    }

    /// PKCS#8 DER encoded private key.
    pub fn private_key_der(&self) -> &[u8] {
        &self.private_key
    }

    pub fn expires(&self) -> SystemTime {
        self.expires
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expires <= now
    }

    pub fn fingerprint(&self, algorithm: RTCSignAlgorithm) -> RTCDtlsFingerprint {
        RTCDtlsFingerprint::from_digest(algorithm, &algorithm.digest(&self.certificate))
    }
}
