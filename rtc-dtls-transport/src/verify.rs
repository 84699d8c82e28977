use log::{debug, trace, warn};
use shared::error::Result;

use crate::fingerprint::{MAX_FINGERPRINT_SIZE, RTCDtlsFingerprint, RTCSignAlgorithm};

/// Checks the remote fingerprints against the digests of the certificate
/// the peer actually presented.
///
/// Entries are tried in order and the first match wins. Entries with an
/// unsupported algorithm, an undecodable value or an oversized digest are
/// skipped. `observed` returns the peer certificate digest for an algorithm;
/// an error from it aborts verification.
///
/// The comparison is a plain `==` and does not run in constant time.
pub(crate) fn verify_fingerprints<F>(remote: &[RTCDtlsFingerprint], mut observed: F) -> Result<bool>
where
    F: FnMut(RTCSignAlgorithm) -> Result<Vec<u8>>,
{
    for fingerprint in remote {
        let algorithm = match RTCSignAlgorithm::try_from(fingerprint.algorithm.as_str()) {
            Ok(algorithm) => algorithm,
            Err(_) => {
                debug!(
                    "skipping fingerprint with unsupported algorithm '{}'",
                    fingerprint.algorithm
                );
                continue;
            }
        };

        let expected = match fingerprint.digest() {
            Ok(expected) if expected.len() <= MAX_FINGERPRINT_SIZE => expected,
            Ok(expected) => {
                warn!(
                    "skipping {algorithm} fingerprint, {} bytes exceeds the maximum digest size",
                    expected.len()
                );
                continue;
            }
            Err(err) => {
                warn!("skipping {algorithm} fingerprint, could not decode hex value: {err}");
                continue;
            }
        };

        let actual = observed(algorithm)?;
        if actual == expected {
            debug!("peer certificate {algorithm} fingerprint is valid");
            return Ok(true);
        }
        trace!("peer certificate {algorithm} fingerprint does not match");
    }

    Ok(false)
}
