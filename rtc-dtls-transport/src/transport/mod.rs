//! DTLS transport state machine.
//!
//! A [`RTCDtlsTransport`] sits on top of one ICE transport. It negotiates
//! the DTLS role, starts or accepts the handshake over whichever candidate
//! pair is validated, and authenticates the peer by comparing its
//! certificate against the fingerprints received through signaling.
//!
//! The transport is sans-IO and single threaded. Everything that happens to
//! it is one of:
//!
//! * an API call: [`RTCDtlsTransport::new`], [`start`](RTCDtlsTransport::start),
//!   [`stop`](RTCDtlsTransport::stop),
//!   [`get_local_parameters`](RTCDtlsTransport::get_local_parameters),
//!   [`add_candidate_pair`](RTCDtlsTransport::add_candidate_pair)
//! * a datagram routed to it by the ICE transport (`handle_read`)
//! * an ICE event (`handle_event`) or a timer (`handle_timeout`)
//!
//! Outbound datagrams and state changes are drained with `poll_write` and
//! `poll_event`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::net::SocketAddr;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use bytes::BytesMut;
use log::{debug, info, trace, warn};
use shared::TaggedBytesMut;
use shared::error::{Error, Result};
use shared::util::match_dtls;

use crate::certificate::RTCCertificate;
use crate::config::{DtlsTransportConfig, HandshakeConfig};
use crate::engine::{DtlsConnection, DtlsConnectionEvent, DtlsEngine};
use crate::event::DtlsTransportEvent;
use crate::fingerprint::RTCDtlsFingerprint;
use crate::ice::{IceTransport, RTCIceTransportState};
use crate::parameters::DTLSParameters;
use crate::role::{RTCDtlsRole, derive_role};
use crate::state::RTCDtlsTransportState;
use crate::verify::verify_fingerprints;

pub mod binding;
mod proto;

pub use binding::CandidateBinding;

const CONTENT_TYPE_HANDSHAKE: u8 = 22;
const HANDSHAKE_TYPE_CLIENT_HELLO: u8 = 1;
const RECORD_HEADER_LEN: usize = 13;

/// Identifies a DTLS transport towards its ICE transport.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DtlsTransportId(pub u64);

impl fmt::Display for DtlsTransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A DTLS record carrying the first message of a handshake.
fn is_client_hello(buf: &[u8]) -> bool {
    buf.len() > RECORD_HEADER_LEN
        && buf[0] == CONTENT_TYPE_HANDSHAKE
        && buf[RECORD_HEADER_LEN] == HANDSHAKE_TYPE_CLIENT_HELLO
}

/// A DTLS session over one ICE transport.
///
/// Owns the certificates, the active handshake and the candidate bindings.
/// The DTLS role is resolved from the remote parameters and the ICE role, and
/// the transport only reports `connected` once the peer certificate matches
/// one of the fingerprints passed to [`start`](Self::start).
pub struct RTCDtlsTransport<I: IceTransport, E: DtlsEngine> {
    id: DtlsTransportId,
    state: RTCDtlsTransportState,
    role: RTCDtlsRole,
    established: bool,

    certificates: Vec<RTCCertificate>,
    local_fingerprints: Option<Vec<RTCDtlsFingerprint>>,
    remote_parameters: Option<DTLSParameters>,

    bindings: Vec<CandidateBinding>,
    connection: Option<E::Connection>,
    ice_transport: Weak<RefCell<I>>,

    config: DtlsTransportConfig,
    handshake_config: Arc<HandshakeConfig>,
    engine: E,

    events: VecDeque<DtlsTransportEvent>,
    transmits: VecDeque<TaggedBytesMut>,
}

impl<I: IceTransport, E: DtlsEngine> RTCDtlsTransport<I, E> {
    /// Creates a DTLS transport on top of `ice_transport`.
    ///
    /// The certificates are copied and the first one is presented in the
    /// handshake. Candidate pairs the ICE transport has already validated
    /// are attached on a best-effort basis.
    ///
    /// # Errors
    ///
    /// * [`Error::ErrNoIceTransport`] if the ICE transport is gone
    /// * [`Error::ErrNonCertificate`] if `certificates` is empty
    /// * [`Error::ErrCertificateExpired`] if any certificate has expired
    /// * [`Error::ErrIceTransportClosed`] if the ICE transport is closed
    /// * [`Error::ErrIceTransportInUse`] if another DTLS transport is bound
    ///   to the ICE transport
    pub fn new(
        ice_transport: Weak<RefCell<I>>,
        certificates: &[RTCCertificate],
        config: DtlsTransportConfig,
        engine: E,
    ) -> Result<Self> {
        let ice = ice_transport.upgrade().ok_or(Error::ErrNoIceTransport)?;
        let certificate = certificates.first().ok_or(Error::ErrNonCertificate)?;

        let now = SystemTime::now();
        if certificates.iter().any(|cert| cert.is_expired(now)) {
            return Err(Error::ErrCertificateExpired);
        }

        {
            let ice = ice.borrow();
            if ice.state() == RTCIceTransportState::Closed {
                return Err(Error::ErrIceTransportClosed);
            }
            if ice.dtls_transport().is_some() {
                return Err(Error::ErrIceTransportInUse);
            }
        }

        let handshake_config = config.handshake_config(certificate.clone())?;

        let mut transport = Self {
            id: DtlsTransportId(rand::random()),
            state: RTCDtlsTransportState::New,
            role: RTCDtlsRole::Auto,
            established: false,
            certificates: certificates.to_vec(),
            local_fingerprints: None,
            remote_parameters: None,
            bindings: vec![],
            connection: None,
            ice_transport,
            config,
            handshake_config,
            engine,
            events: VecDeque::new(),
            transmits: VecDeque::new(),
        };

        let candidate_pairs = ice.borrow().validated_candidate_pairs();
        for candidate_pair in candidate_pairs {
            if let Err(err) = transport.add_candidate_pair(&candidate_pair) {
                warn!("could not attach to candidate pair {candidate_pair}: {err}");
            }
        }

        ice.borrow_mut().set_dtls_transport(Some(transport.id));
        debug!("dtls transport {} created", transport.id);

        Ok(transport)
    }

    pub fn id(&self) -> DtlsTransportId {
        self.id
    }

    pub fn state(&self) -> RTCDtlsTransportState {
        self.state
    }

    /// Local DTLS role. `auto` until `start` or an inbound handshake
    /// resolves it.
    pub fn role(&self) -> RTCDtlsRole {
        self.role
    }

    /// Whether the current connection completed its handshake.
    pub fn is_established(&self) -> bool {
        self.established
    }

    pub fn certificates(&self) -> &[RTCCertificate] {
        &self.certificates
    }

    pub fn remote_parameters(&self) -> Option<&DTLSParameters> {
        self.remote_parameters.as_ref()
    }

    /// One binding per hooked local socket. A pair whose socket was already
    /// bound is attached without a new entry, so this lists sockets rather
    /// than every attached pair.
    pub fn bindings(&self) -> &[CandidateBinding] {
        &self.bindings
    }

    /// Starts DTLS transport negotiation with the parameters of the remote
    /// DTLS transport.
    ///
    /// Resolves the local role. A client (re)starts its handshake over the
    /// best validated candidate pair; a server whose handshake already
    /// completed verifies the peer right away. Can only succeed once.
    pub fn start(&mut self, remote_parameters: DTLSParameters) -> Result<()> {
        if remote_parameters.fingerprints.is_empty() {
            return Err(Error::ErrNoRemoteFingerprints);
        }

        if self.state.is_closed() {
            return Err(Error::ErrDtlsTransportClosed);
        }
        if self.remote_parameters.is_some() {
            return Err(Error::ErrInvalidDTLSStart);
        }

        if self.state != RTCDtlsTransportState::Connecting {
            self.set_state(RTCDtlsTransportState::Connecting);
        }

        let ice = self.ice_transport()?;
        let ice_role = ice.borrow().role();
        self.role = derive_role(remote_parameters.role, ice_role)?;

        if self.role == RTCDtlsRole::Client {
            if self.connection.take().is_some() {
                // a server side attempt from before the peer's role was known
                debug!("resetting dtls connection");
                self.established = false;
            }

            let candidate_pair = ice.borrow().validated_candidate_pairs().into_iter().next();
            if let Some(candidate_pair) = candidate_pair {
                if let Err(err) = candidate_pair
                    .remote()
                    .addr()
                    .and_then(|peer| self.do_connect(peer))
                {
                    self.connection = None;
                    return Err(err);
                }
            }

            self.remote_parameters = Some(remote_parameters);
            self.drive_connection(Instant::now());
        } else {
            self.remote_parameters = Some(remote_parameters);
            if self.established {
                self.verify_certificate();
            }
        }

        Ok(())
    }

    /// Stops and closes the DTLS transport. Calling it again is a no-op.
    pub fn stop(&mut self) -> Result<()> {
        if self.state.is_closed() {
            return Ok(());
        }

        self.set_state(RTCDtlsTransportState::Closed);
        Ok(())
    }

    /// Returns the local role and one fingerprint per certificate.
    ///
    /// Fingerprints are computed on first use and cached.
    pub fn get_local_parameters(&mut self) -> Result<DTLSParameters> {
        if self.state.is_closed() {
            return Err(Error::ErrDtlsTransportClosed);
        }

        let algorithm = self.config.sign_algorithm();
        let certificates = &self.certificates;
        let fingerprints = self.local_fingerprints.get_or_insert_with(|| {
            certificates
                .iter()
                .map(|cert| cert.fingerprint(algorithm))
                .collect()
        });

        Ok(DTLSParameters {
            role: self.role,
            fingerprints: fingerprints.clone(),
        })
    }

    fn ice_transport(&self) -> Result<Rc<RefCell<I>>> {
        self.ice_transport.upgrade().ok_or(Error::ErrNoIceTransport)
    }

    pub(crate) fn set_state(&mut self, state: RTCDtlsTransportState) {
        if self.state == state || self.state.is_closed() {
            warn!(
                "ignoring dtls transport state change {} -> {}",
                self.state, state
            );
            return;
        }

        debug!("dtls transport {} state {} -> {}", self.id, self.state, state);
        self.state = state;

        if state.is_closed() {
            self.teardown();
        }

        self.events
            .push_back(DtlsTransportEvent::OnDtlsTransportStateChange(state));
    }

    /// Drops the connection and releases the ICE transport's slot.
    /// Bindings live until the transport itself is dropped.
    fn teardown(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            if let Err(err) = connection.close() {
                trace!("closing dtls connection: {err}");
            }
            // best effort close_notify
            while let Some(record) = connection.poll_transmit() {
                if self.send(Instant::now(), record).is_err() {
                    break;
                }
            }
        }

        if let Some(ice) = self.ice_transport.upgrade() {
            let mut ice = ice.borrow_mut();
            if ice.dtls_transport() == Some(self.id) {
                ice.set_dtls_transport(None);
            }
        }
    }

    fn do_connect(&mut self, peer: SocketAddr) -> Result<()> {
        debug!("starting dtls connection to {peer}");
        let connection = self.engine.connect(Arc::clone(&self.handshake_config), peer)?;
        self.connection = Some(connection);
        Ok(())
    }

    /// Inbound handshake from `peer` with no connection for it.
    fn connect_handler(&mut self, peer: SocketAddr) {
        if self.role == RTCDtlsRole::Auto {
            debug!("switching dtls role 'auto' -> 'server'");
            self.role = RTCDtlsRole::Server;
        }

        let role_is_server = self.role == RTCDtlsRole::Server;
        let have_connection = self.connection.is_some();
        if role_is_server && !have_connection {
            if self.state != RTCDtlsTransportState::Connecting {
                self.set_state(RTCDtlsTransportState::Connecting);
            }

            debug!("accepting incoming dtls connection from {peer}");
            match self.engine.accept(Arc::clone(&self.handshake_config), peer) {
                Ok(connection) => self.connection = Some(connection),
                Err(err) => warn!("could not accept incoming dtls connection: {err}"),
            }
        } else {
            if have_connection {
                warn!("incoming dtls connect from {peer} but we already have a connection");
            }
            if !role_is_server {
                warn!("incoming dtls connect from {peer} but role is 'client'");
            }
        }
    }

    pub(crate) fn handle_datagram(&mut self, msg: TaggedBytesMut) -> Result<()> {
        if self.state.is_closed() {
            trace!("ignoring incoming dtls message, transport is closed");
            return Ok(());
        }

        if !self.is_bound(msg.transport.local_addr) {
            trace!(
                "dropping datagram received on unbound socket {}",
                msg.transport.local_addr
            );
            return Ok(());
        }

        if !match_dtls(&msg.message) {
            trace!("dropping non-dtls datagram from {}", msg.transport.peer_addr);
            return Ok(());
        }

        let peer = msg.transport.peer_addr;
        if !self.is_connection_peer(peer) {
            if !is_client_hello(&msg.message) {
                trace!("dropping dtls record from unknown peer {peer}");
                return Ok(());
            }

            self.connect_handler(peer);
            if !self.is_connection_peer(peer) {
                return Ok(());
            }
        }

        if let Some(connection) = self.connection.as_mut() {
            if let Err(err) = connection.handle_read(msg.now, &msg.message) {
                warn!("dtls connection could not process datagram from {peer}: {err}");
            }
        }
        self.drive_connection(msg.now);

        Ok(())
    }

    pub(crate) fn handle_application_write(&mut self, data: BytesMut) -> Result<()> {
        if self.state != RTCDtlsTransportState::Connected {
            return Err(Error::ErrDtlsTransportNotConnected);
        }

        let now = Instant::now();
        if let Some(connection) = self.connection.as_mut() {
            connection.handle_write(now, &data)?;
        }
        self.drive_connection(now);

        Ok(())
    }

    pub(crate) fn handle_connection_timeout(&mut self, now: Instant) -> Result<()> {
        if self.state.is_closed() {
            return Ok(());
        }

        if let Some(connection) = self.connection.as_mut() {
            if let Err(err) = connection.handle_timeout(now) {
                warn!("dtls connection timeout handling failed: {err}");
            }
        }
        self.drive_connection(now);

        Ok(())
    }

    pub(crate) fn connection_timeout(&self) -> Option<Instant> {
        if self.state.is_closed() {
            return None;
        }
        self.connection.as_ref().and_then(|c| c.poll_timeout())
    }

    fn is_connection_peer(&self, peer: SocketAddr) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|connection| connection.peer_addr() == peer)
    }

    /// Sends what the connection produced, then reacts to its events.
    fn drive_connection(&mut self, now: Instant) {
        self.flush_connection(now);
        while let Some(event) = self.connection.as_mut().and_then(|c| c.poll_event()) {
            self.handle_connection_event(event);
            self.flush_connection(now);
        }
    }

    fn flush_connection(&mut self, now: Instant) {
        while let Some(record) = self.connection.as_mut().and_then(|c| c.poll_transmit()) {
            if let Err(err) = self.send(now, record) {
                if err.is_connection_reset() {
                    warn!("dtls transport lost its candidate pair: {err}");
                } else {
                    warn!("dtls transport could not send: {err}");
                }
                self.set_state(RTCDtlsTransportState::Failed);
            }
        }
    }

    fn handle_connection_event(&mut self, event: DtlsConnectionEvent) {
        match event {
            DtlsConnectionEvent::Established => self.establish_handler(),
            DtlsConnectionEvent::ApplicationData(data) => {
                if self.state != RTCDtlsTransportState::Connected {
                    debug!(
                        "dropping {} bytes of application data, transport is {}",
                        data.len(),
                        self.state
                    );
                } else {
                    trace!("dropping {} bytes of application data", data.len());
                }
            }
            DtlsConnectionEvent::Closed(err) => self.close_handler(err),
        }
    }

    fn establish_handler(&mut self) {
        if self.state.is_closed() {
            warn!("ignoring established dtls connection, transport is closed");
            return;
        }

        info!("dtls connection established");
        self.established = true;

        if self.remote_parameters.is_some() {
            self.verify_certificate();
        }
    }

    /// A closed connection always fails the transport: a graceful close by
    /// the peer looks the same as an aborted one.
    fn close_handler(&mut self, reason: Error) {
        if self.state.is_closed() {
            return;
        }

        debug!("dtls connection closed: {reason}");
        self.set_state(RTCDtlsTransportState::Failed);
    }

    fn verify_certificate(&mut self) {
        let result = match (&self.remote_parameters, &self.connection) {
            (Some(remote_parameters), Some(connection)) => {
                verify_fingerprints(&remote_parameters.fingerprints, |algorithm| {
                    connection.peer_fingerprint(algorithm)
                })
            }
            _ => Err(Error::ErrDtlsTransportNotConnected),
        };

        match result {
            Ok(true) => self.set_state(RTCDtlsTransportState::Connected),
            Ok(false) => {
                warn!(
                    "verifying certificate failed: {}",
                    Error::ErrNoMatchingCertificateFingerprint
                );
                self.set_state(RTCDtlsTransportState::Failed);
            }
            Err(err) => {
                warn!("verifying certificate failed: {err}");
                self.set_state(RTCDtlsTransportState::Failed);
            }
        }
    }
}

impl<I: IceTransport, E: DtlsEngine> Drop for RTCDtlsTransport<I, E> {
    fn drop(&mut self) {
        let Some(ice) = self.ice_transport.upgrade() else {
            return;
        };
        let Ok(mut ice) = ice.try_borrow_mut() else {
            warn!("dtls transport {} dropped while its ice transport is borrowed", self.id);
            return;
        };

        for binding in self.bindings.drain(..) {
            ice.unregister_hook(binding.hook);
        }
        if ice.dtls_transport() == Some(self.id) {
            ice.set_dtls_transport(None);
        }
    }
}
