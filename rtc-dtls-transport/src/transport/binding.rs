use std::net::SocketAddr;
use std::time::Instant;

use bytes::BytesMut;
use log::{debug, trace, warn};
use shared::error::{Error, Result};
use shared::{TransportContext, TransportMessage};

use super::RTCDtlsTransport;
use crate::engine::DtlsEngine;
use crate::ice::{HookId, IceTransport, RTCIceCandidatePair};
use crate::role::RTCDtlsRole;

/// A candidate pair whose local socket routes DTLS traffic to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateBinding {
    pub(crate) candidate_pair: RTCIceCandidatePair,
    pub(crate) socket: SocketAddr,
    pub(crate) hook: HookId,
}

impl CandidateBinding {
    pub fn candidate_pair(&self) -> &RTCIceCandidatePair {
        &self.candidate_pair
    }

    /// Local socket the hook is registered on.
    pub fn socket(&self) -> SocketAddr {
        self.socket
    }
}

impl<I: IceTransport, E: DtlsEngine> RTCDtlsTransport<I, E> {
    /// Attaches the transport to a validated candidate pair.
    ///
    /// Registers a hook on the pair's local socket so inbound DTLS records
    /// reach the transport. A client without a connection starts its
    /// handshake toward the pair's remote address right away.
    ///
    /// # Errors
    ///
    /// * [`Error::ErrDtlsTransportClosed`] if the transport is closed or failed
    /// * [`Error::ErrNoSocket`] if the local candidate has no socket yet
    pub fn add_candidate_pair(&mut self, candidate_pair: &RTCIceCandidatePair) -> Result<()> {
        if self.state.is_closed() {
            return Err(Error::ErrDtlsTransportClosed);
        }

        let ice = self.ice_transport()?;
        let socket = ice
            .borrow()
            .candidate_socket(candidate_pair.local())
            .ok_or(Error::ErrNoSocket)?;
        let peer = candidate_pair.remote().addr()?;

        let newly_bound = if self.is_bound(socket) {
            debug!("socket {socket} is already bound, not hooking it twice");
            false
        } else {
            let hook = ice.borrow_mut().register_hook(socket, self.id)?;
            self.bindings.push(CandidateBinding {
                candidate_pair: candidate_pair.clone(),
                socket,
                hook,
            });
            true
        };

        if self.role == RTCDtlsRole::Client && self.connection.is_none() {
            if let Err(err) = self.do_connect(peer) {
                if newly_bound {
                    if let Some(binding) = self.bindings.pop() {
                        ice.borrow_mut().unregister_hook(binding.hook);
                    }
                }
                return Err(err);
            }
            self.drive_connection(Instant::now());
        }

        debug!("attached to candidate pair {candidate_pair}");
        Ok(())
    }

    /// Sends an encrypted record over the best validated candidate pair.
    ///
    /// Fails with a connection reset style error while ICE has no usable
    /// pair; the warning is suppressed once the transport is closed.
    pub(crate) fn send(&mut self, now: Instant, message: BytesMut) -> Result<()> {
        let closed = self.state.is_closed();
        let ice = self.ice_transport()?;
        let ice = ice.borrow();

        let Some(candidate_pair) = ice.validated_candidate_pairs().into_iter().next() else {
            if !closed {
                warn!("cannot send message, no selected candidate pair");
            }
            return Err(Error::ErrNoSelectedCandidatePair);
        };

        let Some(local_addr) = ice.candidate_socket(candidate_pair.local()) else {
            if !closed {
                warn!("cannot send message, selected candidate pair has no socket");
            }
            return Err(Error::ErrSelectedCandidatePairNoSocket);
        };
        let peer_addr = candidate_pair.remote().addr()?;

        trace!(
            "sending dtls message ({} bytes) to {peer_addr} from {local_addr}",
            message.len()
        );
        self.transmits.push_back(TransportMessage {
            now,
            transport: TransportContext::udp(local_addr, peer_addr),
            message,
        });

        Ok(())
    }

    pub(crate) fn is_bound(&self, socket: SocketAddr) -> bool {
        self.bindings.iter().any(|binding| binding.socket == socket)
    }
}
