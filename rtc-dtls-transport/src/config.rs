use std::fmt;
use std::sync::Arc;

use shared::error::{Error, Result};

use crate::certificate::RTCCertificate;
use crate::fingerprint::RTCSignAlgorithm;

/// Cipher suites offered by default, strongest first.
///
/// `ECDHE-ECDSA-AES128-SHA` is mandatory to implement for WebRTC and
/// `ECDHE-ECDSA-AES128-GCM-SHA256` is the recommended suite.
pub const DEFAULT_CIPHER_SUITES: &[&str] = &[
    "ECDHE-ECDSA-CHACHA20-POLY1305",
    "ECDHE-RSA-CHACHA20-POLY1305",
    "ECDHE-ECDSA-AES128-GCM-SHA256",
    "ECDHE-RSA-AES128-GCM-SHA256",
    "ECDHE-ECDSA-AES256-GCM-SHA384",
    "ECDHE-RSA-AES256-GCM-SHA384",
    "DHE-RSA-AES128-GCM-SHA256",
    "DHE-RSA-AES256-GCM-SHA384",
    "ECDHE-ECDSA-AES128-SHA256",
    "ECDHE-RSA-AES128-SHA256",
    "ECDHE-ECDSA-AES128-SHA",
    "ECDHE-RSA-AES256-SHA384",
    "ECDHE-RSA-AES128-SHA",
    "ECDHE-ECDSA-AES256-SHA384",
    "ECDHE-ECDSA-AES256-SHA",
    "ECDHE-RSA-AES256-SHA",
    "DHE-RSA-AES128-SHA256",
    "DHE-RSA-AES128-SHA",
    "DHE-RSA-AES256-SHA256",
    "DHE-RSA-AES256-SHA",
];

/// 2048-bit Diffie-Hellman parameters, DER encoded.
pub const DEFAULT_DH_PARAMETERS: &[u8] = &[
    0x30, 0x82, 0x01, 0x08, 0x02, 0x82, 0x01, 0x01, 0x00, 0xaa, 0x4c, 0x1f,
    0x1e, 0xc9, 0xed, 0xfe, 0x5c, 0x50, 0x2d, 0xff, 0xf4, 0x95, 0xf4, 0x80,
    0x69, 0xcf, 0xc3, 0x84, 0x29, 0x87, 0xd5, 0x2c, 0x4f, 0xf6, 0x9e, 0x88,
    0xa2, 0x5b, 0x61, 0xd2, 0x7d, 0x78, 0x97, 0xce, 0x47, 0x39, 0x9d, 0xc0,
    0x95, 0x14, 0x98, 0x1f, 0xa9, 0xa3, 0x42, 0x93, 0x58, 0x49, 0x3d, 0xad,
    0xeb, 0x6c, 0x3d, 0x79, 0x2d, 0x27, 0x94, 0x67, 0x4c, 0xdc, 0x94, 0x31,
    0xbf, 0xc1, 0x00, 0x9d, 0x96, 0x4a, 0x91, 0xa7, 0x4f, 0xab, 0x48, 0x44,
    0xcc, 0x54, 0x1a, 0x4e, 0x2a, 0x8e, 0xa1, 0x81, 0x4b, 0xeb, 0xea, 0xc3,
    0xba, 0xd6, 0x03, 0xfb, 0xf2, 0x9a, 0x48, 0x1f, 0xc8, 0xba, 0x73, 0x89,
    0x86, 0x25, 0x2e, 0xba, 0x10, 0x80, 0x2a, 0xeb, 0xf9, 0xe2, 0x28, 0xf1,
    0xcf, 0x85, 0x0d, 0xeb, 0x2f, 0x61, 0x51, 0x11, 0xe1, 0xe7, 0x82, 0xe5,
    0xa7, 0x5d, 0x71, 0x0a, 0xef, 0x8a, 0xe1, 0x97, 0x48, 0x41, 0xac, 0xd7,
    0xc5, 0xf7, 0xce, 0xd5, 0xcd, 0x66, 0x1e, 0x6b, 0x0e, 0x82, 0x4e, 0x77,
    0x5d, 0x89, 0x3b, 0xe2, 0x94, 0x7a, 0x10, 0xee, 0x5b, 0x5d, 0x36, 0x07,
    0x29, 0x8b, 0x06, 0xb6, 0x49, 0x1e, 0x17, 0x17, 0x57, 0xc8, 0xc1, 0x80,
    0x24, 0x15, 0x22, 0x9c, 0xb8, 0x59, 0x55, 0x08, 0x41, 0x67, 0x07, 0xca,
    0xa8, 0x54, 0x1a, 0xd1, 0xb7, 0x91, 0x2f, 0x41, 0x78, 0xc0, 0xcd, 0x2f,
    0x07, 0x49, 0x4b, 0xb9, 0x05, 0xf4, 0xea, 0x72, 0x3a, 0xcf, 0x04, 0x69,
    0xcb, 0x5b, 0xe4, 0xcb, 0x4f, 0x72, 0x40, 0xe4, 0x56, 0x1f, 0xca, 0xee,
    0x33, 0x2b, 0x29, 0x1a, 0x80, 0xda, 0x01, 0x3f, 0x03, 0xa6, 0xbf, 0x32,
    0x02, 0x6c, 0xfb, 0xb1, 0xb5, 0x81, 0xda, 0x32, 0x6f, 0xa1, 0x4b, 0x9f,
    0x42, 0x2e, 0x17, 0xc9, 0x95, 0x30, 0xda, 0x16, 0xb7, 0x9a, 0x7c, 0xf4,
    0x83, 0x02, 0x01, 0x02
];

/// Largest datagram handed to the socket, in bytes.
pub const DEFAULT_MTU: usize = 1400;

/// ClientAuthType declares the policy the server will follow for
/// TLS Client Authentication.
///
/// The peer certificate is authenticated by fingerprint rather than by a
/// CA chain, so a server either skips the client certificate or demands
/// one without verifying it.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum ClientAuthType {
    #[default]
    NoClientCert,
    RequireAnyClientCert,
}

/// Settings of a DTLS transport that outlive any single handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtlsTransportConfig {
    cipher_suites: Vec<String>,
    dh_parameters: Vec<u8>,
    sign_algorithm: RTCSignAlgorithm,
    mtu: usize,
}

impl Default for DtlsTransportConfig {
    fn default() -> Self {
        Self {
            cipher_suites: DEFAULT_CIPHER_SUITES.iter().map(|s| s.to_string()).collect(),
            dh_parameters: DEFAULT_DH_PARAMETERS.to_vec(),
            sign_algorithm: RTCSignAlgorithm::default(),
            mtu: DEFAULT_MTU,
        }
    }
}

impl DtlsTransportConfig {
    /// with_cipher_suites replaces the default cipher suite priority list.
    pub fn with_cipher_suites(mut self, cipher_suites: Vec<String>) -> Self {
        self.cipher_suites = cipher_suites;
        self
    }

    /// with_dh_parameters replaces the default DER encoded DH parameters.
    pub fn with_dh_parameters(mut self, dh_parameters: Vec<u8>) -> Self {
        self.dh_parameters = dh_parameters;
        self
    }

    /// with_sign_algorithm sets the hash used for local fingerprints.
    pub fn with_sign_algorithm(mut self, sign_algorithm: RTCSignAlgorithm) -> Self {
        self.sign_algorithm = sign_algorithm;
        self
    }

    pub fn with_mtu(mut self, mtu: usize) -> Self {
        self.mtu = mtu;
        self
    }

    pub fn cipher_suites(&self) -> &[String] {
        &self.cipher_suites
    }

    pub fn dh_parameters(&self) -> &[u8] {
        &self.dh_parameters
    }

    pub fn sign_algorithm(&self) -> RTCSignAlgorithm {
        self.sign_algorithm
    }

    pub fn mtu(&self) -> usize {
        self.mtu
    }

    /// Builds the handshake configuration presenting `certificate` and
    /// requiring the peer to present one too.
    pub(crate) fn handshake_config(
        &self,
        certificate: RTCCertificate,
    ) -> Result<Arc<HandshakeConfig>> {
        Ok(Arc::new(
            ConfigBuilder::default()
                .with_certificates(vec![certificate])
                .with_cipher_suites(self.cipher_suites.clone())
                .with_dh_parameters(self.dh_parameters.clone())
                .with_client_auth(ClientAuthType::RequireAnyClientCert)
                .with_mtu(self.mtu)
                .build()?,
        ))
    }
}

/// ConfigBuilder collects what a DTLS engine needs for a handshake.
/// After a HandshakeConfig is built it must not be modified.
#[derive(Default, Clone)]
pub struct ConfigBuilder {
    certificates: Vec<RTCCertificate>,
    cipher_suites: Vec<String>,
    dh_parameters: Vec<u8>,
    client_auth: ClientAuthType,
    mtu: usize,
}

impl ConfigBuilder {
    /// certificates contains certificate chain to present to the other side of the connection.
    pub fn with_certificates(mut self, certificates: Vec<RTCCertificate>) -> Self {
        self.certificates = certificates;
        self
    }

    /// cipher_suites is a list of supported cipher suites, strongest first.
    pub fn with_cipher_suites(mut self, cipher_suites: Vec<String>) -> Self {
        self.cipher_suites = cipher_suites;
        self
    }

    pub fn with_dh_parameters(mut self, dh_parameters: Vec<u8>) -> Self {
        self.dh_parameters = dh_parameters;
        self
    }

    /// client_auth determines the server's policy for
    /// TLS Client Authentication. The default is NoClientCert.
    pub fn with_client_auth(mut self, client_auth: ClientAuthType) -> Self {
        self.client_auth = client_auth;
        self
    }

    /// mtu is the length at which handshake messages will be fragmented to
    /// fit within the maximum transmission unit (default is 1400 bytes)
    pub fn with_mtu(mut self, mtu: usize) -> Self {
        self.mtu = mtu;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.certificates.is_empty() {
            return Err(Error::ErrNonCertificate);
        }
        if self.cipher_suites.is_empty() {
            return Err(Error::ErrNoCipherSuites);
        }
        if self.dh_parameters.is_empty() {
            return Err(Error::ErrNoDhParameters);
        }
        Ok(())
    }

    /// build handshake config
    pub fn build(self) -> Result<HandshakeConfig> {
        self.validate()?;

        let maximum_transmission_unit = if self.mtu == 0 { DEFAULT_MTU } else { self.mtu };

        Ok(HandshakeConfig {
            local_certificates: self.certificates,
            local_cipher_suites: self.cipher_suites,
            dh_parameters: self.dh_parameters,
            client_auth: self.client_auth,
            maximum_transmission_unit,
        })
    }
}

/// Immutable handshake settings shared with every connection the engine
/// creates.
#[derive(Clone)]
pub struct HandshakeConfig {
    pub(crate) local_certificates: Vec<RTCCertificate>,
    pub(crate) local_cipher_suites: Vec<String>,
    pub(crate) dh_parameters: Vec<u8>,
    pub(crate) client_auth: ClientAuthType,
    pub(crate) maximum_transmission_unit: usize,
}

impl fmt::Debug for HandshakeConfig {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("HandshakeConfig")
            .field("local_certificates", &self.local_certificates.len())
            .field("local_cipher_suites", &self.local_cipher_suites)
            .field("dh_parameters", &self.dh_parameters.len())
            .field("client_auth", &self.client_auth)
            .field("maximum_transmission_unit", &self.maximum_transmission_unit)
            .finish()
    }
}

impl HandshakeConfig {
    /// Certificate presented in the handshake.
    pub fn certificate(&self) -> Option<&RTCCertificate> {
        self.local_certificates.first()
    }

    pub fn cipher_suites(&self) -> &[String] {
        &self.local_cipher_suites
    }

    pub fn dh_parameters(&self) -> &[u8] {
        &self.dh_parameters
    }

    pub fn client_auth(&self) -> ClientAuthType {
        self.client_auth
    }

    pub fn maximum_transmission_unit(&self) -> usize {
        self.maximum_transmission_unit
    }
}
