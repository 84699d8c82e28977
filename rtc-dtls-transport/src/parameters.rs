use serde::{Deserialize, Serialize};

use crate::fingerprint::*;
use crate::role::*;

/// DTLSParameters holds information relating to DTLS configuration.
///
/// The remote side hands these over through signaling; once accepted by
/// `start` they are never replaced.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DTLSParameters {
    pub role: RTCDtlsRole,
    pub fingerprints: Vec<RTCDtlsFingerprint>,
}
