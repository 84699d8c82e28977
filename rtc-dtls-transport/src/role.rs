use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};
use shared::error::{Error, Result};

use crate::ice::RTCIceRole;

/// RTCDtlsRole indicates the role of the DTLS transport.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RTCDtlsRole {
    /// DTLSRoleAuto defines the DTLS role is determined based on
    /// the resolved ICE role: the ICE controlled role acts as the DTLS
    /// client and the ICE controlling role acts as the DTLS server.
    #[default]
    #[serde(rename = "auto")]
    Auto,

    /// DTLSRoleClient defines the DTLS client role.
    #[serde(rename = "client")]
    Client,

    /// DTLSRoleServer defines the DTLS server role.
    #[serde(rename = "server")]
    Server,
}

const DTLS_ROLE_AUTO_STR: &str = "auto";
const DTLS_ROLE_CLIENT_STR: &str = "client";
const DTLS_ROLE_SERVER_STR: &str = "server";

const SETUP_ACTPASS_STR: &str = "actpass";
const SETUP_ACTIVE_STR: &str = "active";
const SETUP_PASSIVE_STR: &str = "passive";

impl fmt::Display for RTCDtlsRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RTCDtlsRole::Auto => DTLS_ROLE_AUTO_STR,
            RTCDtlsRole::Client => DTLS_ROLE_CLIENT_STR,
            RTCDtlsRole::Server => DTLS_ROLE_SERVER_STR,
        };
        write!(f, "{s}")
    }
}

impl From<&str> for RTCDtlsRole {
    fn from(raw: &str) -> Self {
        match raw {
            DTLS_ROLE_CLIENT_STR => RTCDtlsRole::Client,
            DTLS_ROLE_SERVER_STR => RTCDtlsRole::Server,
            _ => RTCDtlsRole::Auto,
        }
    }
}

impl RTCDtlsRole {
    /// Maps an SDP `a=setup` value to the role the remote requests.
    ///
    /// <https://tools.ietf.org/html/rfc4145#section-4>
    /// `active` connects, `passive` accepts, and `actpass` (or anything
    /// unrecognised) leaves the decision to the ICE role.
    pub fn from_setup_attribute(value: &str) -> Self {
        match value {
            SETUP_ACTIVE_STR => RTCDtlsRole::Client,
            SETUP_PASSIVE_STR => RTCDtlsRole::Server,
            _ => RTCDtlsRole::Auto,
        }
    }

    /// The SDP `a=setup` value announcing this role.
    pub fn to_setup_attribute(self) -> &'static str {
        match self {
            RTCDtlsRole::Auto => SETUP_ACTPASS_STR,
            RTCDtlsRole::Client => SETUP_ACTIVE_STR,
            RTCDtlsRole::Server => SETUP_PASSIVE_STR,
        }
    }
}

/// Derives the local DTLS role from the role the remote requested and the
/// resolved ICE role.
///
/// An explicit remote role is always inverted. `auto` follows the ICE role:
/// the controlled agent connects, the controlling agent accepts.
pub(crate) fn derive_role(remote_role: RTCDtlsRole, ice_role: RTCIceRole) -> Result<RTCDtlsRole> {
    let role = match remote_role {
        RTCDtlsRole::Auto => match ice_role {
            RTCIceRole::Controlled => RTCDtlsRole::Client,
            RTCIceRole::Controlling => RTCDtlsRole::Server,
            RTCIceRole::Unknown => return Err(Error::ErrIceRoleUnknown),
        },
        RTCDtlsRole::Server => RTCDtlsRole::Client,
        RTCDtlsRole::Client => RTCDtlsRole::Server,
    };

    debug!("switching dtls role '{remote_role}' (remote) -> '{role}' (local), ice '{ice_role}'");
    Ok(role)
}
