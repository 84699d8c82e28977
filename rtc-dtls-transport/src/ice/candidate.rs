use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use shared::error::{Error, Result};

/// ICECandidateType represents the type of the ICE candidate used.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RTCIceCandidateType {
    #[default]
    Unspecified,

    /// ICECandidateTypeHost indicates that the candidate is of Host type as
    /// described in <https://tools.ietf.org/html/rfc8445#section-5.1.1.1>.
    #[serde(rename = "host")]
    Host,

    /// ICECandidateTypeSrflx indicates the the candidate is of Server
    /// Reflexive type as described
    /// <https://tools.ietf.org/html/rfc8445#section-5.1.1.2>.
    #[serde(rename = "srflx")]
    Srflx,

    /// ICECandidateTypePrflx indicates that the candidate is of Peer
    /// Reflexive type.
    #[serde(rename = "prflx")]
    Prflx,

    /// ICECandidateTypeRelay indicates the the candidate is of Relay type.
    /// Its socket only exists once the TURN allocation has succeeded.
    #[serde(rename = "relay")]
    Relay,
}

const ICE_CANDIDATE_TYPE_HOST_STR: &str = "host";
const ICE_CANDIDATE_TYPE_SRFLX_STR: &str = "srflx";
const ICE_CANDIDATE_TYPE_PRFLX_STR: &str = "prflx";
const ICE_CANDIDATE_TYPE_RELAY_STR: &str = "relay";
const ICE_CANDIDATE_TYPE_UNSPECIFIED_STR: &str = "Unspecified";

impl From<&str> for RTCIceCandidateType {
    fn from(raw: &str) -> Self {
        match raw {
            ICE_CANDIDATE_TYPE_HOST_STR => RTCIceCandidateType::Host,
            ICE_CANDIDATE_TYPE_SRFLX_STR => RTCIceCandidateType::Srflx,
            ICE_CANDIDATE_TYPE_PRFLX_STR => RTCIceCandidateType::Prflx,
            ICE_CANDIDATE_TYPE_RELAY_STR => RTCIceCandidateType::Relay,
            _ => RTCIceCandidateType::Unspecified,
        }
    }
}

impl fmt::Display for RTCIceCandidateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RTCIceCandidateType::Host => ICE_CANDIDATE_TYPE_HOST_STR,
            RTCIceCandidateType::Srflx => ICE_CANDIDATE_TYPE_SRFLX_STR,
            RTCIceCandidateType::Prflx => ICE_CANDIDATE_TYPE_PRFLX_STR,
            RTCIceCandidateType::Relay => ICE_CANDIDATE_TYPE_RELAY_STR,
            RTCIceCandidateType::Unspecified => ICE_CANDIDATE_TYPE_UNSPECIFIED_STR,
        };
        write!(f, "{s}")
    }
}

/// ICECandidate represents a ice candidate
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCIceCandidate {
    pub foundation: String,
    pub priority: u32,
    pub address: String,
    pub port: u16,
    pub typ: RTCIceCandidateType,
    pub component: u16,
}

impl fmt::Display for RTCIceCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}:{}",
            self.foundation, self.typ, self.address, self.port
        )
    }
}

impl RTCIceCandidate {
    /// A component 1 candidate at `addr`.
    pub fn new(typ: RTCIceCandidateType, addr: SocketAddr) -> Self {
        Self {
            foundation: format!("{typ}-{}", addr.ip()),
            priority: 0,
            address: addr.ip().to_string(),
            port: addr.port(),
            typ,
            component: 1,
        }
    }

    /// Transport address of the candidate.
    pub fn addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .address
            .parse()
            .map_err(|_| Error::OtherIceErr(format!("invalid address '{}'", self.address)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
