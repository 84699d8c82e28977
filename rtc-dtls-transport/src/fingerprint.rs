use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};
use shared::error::{Error, Result};

/// Largest digest any supported algorithm produces, in bytes.
pub const MAX_FINGERPRINT_SIZE: usize = 64;

/// Hash function used to fingerprint a certificate.
///
/// <https://tools.ietf.org/html/rfc4572#section-5>
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RTCSignAlgorithm {
    #[default]
    #[serde(rename = "sha-256")]
    Sha256,
    #[serde(rename = "sha-384")]
    Sha384,
    #[serde(rename = "sha-512")]
    Sha512,
}

const SIGN_ALGORITHM_SHA256_STR: &str = "sha-256";
const SIGN_ALGORITHM_SHA384_STR: &str = "sha-384";
const SIGN_ALGORITHM_SHA512_STR: &str = "sha-512";

impl RTCSignAlgorithm {
    /// Every algorithm this crate can verify, strongest last.
    pub const SUPPORTED: [RTCSignAlgorithm; 3] = [
        RTCSignAlgorithm::Sha256,
        RTCSignAlgorithm::Sha384,
        RTCSignAlgorithm::Sha512,
    ];

    /// Digest length in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            RTCSignAlgorithm::Sha256 => 32,
            RTCSignAlgorithm::Sha384 => 48,
            RTCSignAlgorithm::Sha512 => 64,
        }
    }

    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            RTCSignAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            RTCSignAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            RTCSignAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

impl fmt::Display for RTCSignAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RTCSignAlgorithm::Sha256 => SIGN_ALGORITHM_SHA256_STR,
            RTCSignAlgorithm::Sha384 => SIGN_ALGORITHM_SHA384_STR,
            RTCSignAlgorithm::Sha512 => SIGN_ALGORITHM_SHA512_STR,
        };
        write!(f, "{s}")
    }
}

impl TryFrom<&str> for RTCSignAlgorithm {
    type Error = Error;

    fn try_from(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            SIGN_ALGORITHM_SHA256_STR => Ok(RTCSignAlgorithm::Sha256),
            SIGN_ALGORITHM_SHA384_STR => Ok(RTCSignAlgorithm::Sha384),
            SIGN_ALGORITHM_SHA512_STR => Ok(RTCSignAlgorithm::Sha512),
            _ => Err(Error::ErrUnsupportedFingerprintAlgorithm),
        }
    }
}

/// DTLSFingerprint specifies the hash function algorithm and certificate
/// fingerprint as described in <https://tools.ietf.org/html/rfc4572>.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCDtlsFingerprint {
    /// Algorithm specifies one of the the hash function algorithms defined in
    /// the 'Hash function Textual Names' registry.
    pub algorithm: String,

    /// Value specifies the value of the certificate fingerprint in lowercase
    /// hex string as expressed utilizing the syntax of 'fingerprint' in
    /// <https://tools.ietf.org/html/rfc4572#section-5>.
    pub value: String,
}

impl RTCDtlsFingerprint {
    pub fn new(algorithm: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            value: value.into(),
        }
    }

    /// Formats a raw digest as lowercase, colon separated hex.
    pub fn from_digest(algorithm: RTCSignAlgorithm, digest: &[u8]) -> Self {
        let values: Vec<String> = digest.iter().map(|x| format!("{x:02x}")).collect();
        Self {
            algorithm: algorithm.to_string(),
            value: values.join(":"),
        }
    }

    /// Decodes the hex value, with or without colon separators.
    pub fn digest(&self) -> Result<Vec<u8>> {
        let stripped: String = self.value.chars().filter(|c| *c != ':').collect();
        hex::decode(stripped).map_err(|_| Error::ErrInvalidFingerprint)
    }
}

impl fmt::Display for RTCDtlsFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.algorithm, self.value)
    }
}

/// Parses the value of an SDP `a=fingerprint` attribute,
/// e.g. `sha-256 AB:CD:...`.
impl TryFrom<&str> for RTCDtlsFingerprint {
    type Error = Error;

    fn try_from(raw: &str) -> Result<Self> {
        let (algorithm, value) = raw
            .trim()
            .split_once(char::is_whitespace)
            .ok_or(Error::ErrInvalidFingerprint)?;
        let value = value.trim();
        if algorithm.is_empty() || value.is_empty() {
            return Err(Error::ErrInvalidFingerprint);
        }

        Ok(RTCDtlsFingerprint::new(algorithm.to_ascii_lowercase(), value))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sign_algorithm_string() {
        let tests = vec![
            ("sha-256", Ok(RTCSignAlgorithm::Sha256)),
            ("SHA-384", Ok(RTCSignAlgorithm::Sha384)),
            ("sha-512", Ok(RTCSignAlgorithm::Sha512)),
            ("sha-1", Err(Error::ErrUnsupportedFingerprintAlgorithm)),
            ("md5", Err(Error::ErrUnsupportedFingerprintAlgorithm)),
            ("", Err(Error::ErrUnsupportedFingerprintAlgorithm)),
        ];

        for (raw, expected) in tests {
            assert_eq!(RTCSignAlgorithm::try_from(raw), expected, "{raw}");
        }

        for algorithm in RTCSignAlgorithm::SUPPORTED {
            assert_eq!(
                RTCSignAlgorithm::try_from(algorithm.to_string().as_str()),
                Ok(algorithm)
            );
        }
    }

    #[test]
    fn test_sign_algorithm_digest_len() {
        for algorithm in RTCSignAlgorithm::SUPPORTED {
            assert_eq!(algorithm.digest(b"abc").len(), algorithm.digest_len());
            assert!(algorithm.digest_len() <= MAX_FINGERPRINT_SIZE);
        }
    }

    #[test]
    fn test_sha256_known_digest() {
        let fp = RTCDtlsFingerprint::from_digest(
            RTCSignAlgorithm::Sha256,
            &RTCSignAlgorithm::Sha256.digest(b"abc"),
        );
        assert_eq!(fp.algorithm, "sha-256");
        assert_eq!(
            fp.value,
            "ba:78:16:bf:8f:01:cf:ea:41:41:40:de:5d:ae:22:23:\
             b0:03:61:a3:96:17:7a:9c:b4:10:ff:61:f2:00:15:ad"
        );
    }

    #[test]
    fn test_fingerprint_digest() {
        let tests = vec![
            ("AB:cd:01", Ok(vec![0xab, 0xcd, 0x01])),
            ("abcd01", Ok(vec![0xab, 0xcd, 0x01])),
            ("", Ok(vec![])),
            ("zz:01", Err(Error::ErrInvalidFingerprint)),
            ("abc", Err(Error::ErrInvalidFingerprint)),
        ];

        for (value, expected) in tests {
            let fp = RTCDtlsFingerprint::new("sha-256", value);
            assert_eq!(fp.digest(), expected, "{value}");
        }
    }

    #[test]
    fn test_fingerprint_from_sdp_value() {
        let fp = RTCDtlsFingerprint::try_from("SHA-256 AB:CD:EF").unwrap();
        assert_eq!(fp, RTCDtlsFingerprint::new("sha-256", "AB:CD:EF"));
        assert_eq!(fp.to_string(), "sha-256 AB:CD:EF");

        assert_eq!(
            RTCDtlsFingerprint::try_from("sha-256"),
            Err(Error::ErrInvalidFingerprint)
        );
        assert_eq!(
            RTCDtlsFingerprint::try_from("   "),
            Err(Error::ErrInvalidFingerprint)
        );
    }
}
