#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::net::SocketAddr;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::{BufMut, BytesMut};
use rcgen::KeyPair;
use sansio::Protocol;
use shared::error::{Error, Result};
use shared::{TaggedBytesMut, TransportContext, TransportMessage};

use rtc_dtls_transport::config::HandshakeConfig;
use rtc_dtls_transport::engine::{DtlsConnection, DtlsConnectionEvent, DtlsEngine};
use rtc_dtls_transport::ice::{
    HookId, IceTransport, RTCIceCandidate, RTCIceCandidatePair, RTCIceCandidateType, RTCIceRole,
    RTCIceTransportState,
};
use rtc_dtls_transport::{
    DTLSParameters, DtlsTransportConfig, DtlsTransportEvent, DtlsTransportId, RTCCertificate,
    RTCDtlsRole, RTCDtlsTransport, RTCDtlsTransportState, RTCSignAlgorithm,
};

pub const CONTENT_TYPE_ALERT: u8 = 21;
pub const CONTENT_TYPE_HANDSHAKE: u8 = 22;
pub const CONTENT_TYPE_APPLICATION_DATA: u8 = 23;
pub const CLIENT_HELLO: u8 = 1;
pub const SERVER_HELLO: u8 = 2;

const RETRANSMIT_INTERVAL: Duration = Duration::from_secs(1);

pub fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn addr(s: &str) -> SocketAddr {
    s.parse().unwrap()
}

pub fn certificate() -> RTCCertificate {
    let kp = KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256).unwrap();
    RTCCertificate::from_key_pair(kp).unwrap()
}

pub fn host_pair(local: SocketAddr, remote: SocketAddr) -> RTCIceCandidatePair {
    RTCIceCandidatePair::new(
        RTCIceCandidate::new(RTCIceCandidateType::Host, local),
        RTCIceCandidate::new(RTCIceCandidateType::Host, remote),
    )
}

/// A fake DTLS record: a 13 byte header followed by the payload.
pub fn record(content_type: u8, payload: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(13 + payload.len());
    buf.put_u8(content_type);
    buf.put_u16(0xfefd);
    buf.put_u16(0);
    buf.put_slice(&[0u8; 6]);
    buf.put_u16(payload.len() as u16);
    buf.put_slice(payload);
    buf
}

pub fn handshake_record(msg_type: u8, body: &[u8]) -> BytesMut {
    let mut payload = vec![msg_type];
    payload.extend_from_slice(body);
    record(CONTENT_TYPE_HANDSHAKE, &payload)
}

pub fn datagram(local: SocketAddr, peer: SocketAddr, message: BytesMut) -> TaggedBytesMut {
    TransportMessage {
        now: Instant::now(),
        transport: TransportContext::udp(local, peer),
        message,
    }
}

#[derive(Default)]
pub struct MockIceTransport {
    pub state: RTCIceTransportState,
    pub role: RTCIceRole,
    pub pairs: Vec<RTCIceCandidatePair>,
    pub sockets: HashSet<SocketAddr>,
    pub hooks: HashMap<HookId, (SocketAddr, DtlsTransportId)>,
    pub dtls_transport: Option<DtlsTransportId>,
    next_hook: u64,
}

impl MockIceTransport {
    pub fn new(role: RTCIceRole) -> Self {
        Self {
            role,
            ..Default::default()
        }
    }

    /// Validates a pair whose local candidate owns a socket.
    pub fn add_pair(&mut self, pair: RTCIceCandidatePair) {
        if let Ok(local) = pair.local().addr() {
            self.sockets.insert(local);
        }
        self.pairs.push(pair);
    }

    pub fn hooks_on(&self, socket: SocketAddr) -> usize {
        self.hooks.values().filter(|(s, _)| *s == socket).count()
    }
}

impl IceTransport for MockIceTransport {
    fn state(&self) -> RTCIceTransportState {
        self.state
    }

    fn role(&self) -> RTCIceRole {
        self.role
    }

    fn validated_candidate_pairs(&self) -> Vec<RTCIceCandidatePair> {
        self.pairs.clone()
    }

    fn candidate_socket(&self, candidate: &RTCIceCandidate) -> Option<SocketAddr> {
        let addr = candidate.addr().ok()?;
        self.sockets.contains(&addr).then_some(addr)
    }

    fn register_hook(&mut self, socket: SocketAddr, owner: DtlsTransportId) -> Result<HookId> {
        self.next_hook += 1;
        let hook = HookId(self.next_hook);
        self.hooks.insert(hook, (socket, owner));
        Ok(hook)
    }

    fn unregister_hook(&mut self, hook: HookId) {
        self.hooks.remove(&hook);
    }

    fn dtls_transport(&self) -> Option<DtlsTransportId> {
        self.dtls_transport
    }

    fn set_dtls_transport(&mut self, dtls_transport: Option<DtlsTransportId>) {
        self.dtls_transport = dtls_transport;
    }
}

#[derive(Default, Debug)]
pub struct MockEngineStats {
    pub connects: usize,
    pub accepts: usize,
    pub closes: usize,
}

/// Loopback engine speaking a two message fake handshake: the client
/// sends its certificate in a ClientHello, the server answers with its own
/// in a ServerHello.
#[derive(Default, Clone)]
pub struct MockEngine {
    pub stats: Rc<RefCell<MockEngineStats>>,
    pub fail_connect: bool,
}

impl DtlsEngine for MockEngine {
    type Connection = MockConnection;

    fn connect(
        &mut self,
        config: Arc<HandshakeConfig>,
        peer: SocketAddr,
    ) -> Result<MockConnection> {
        if self.fail_connect {
            return Err(Error::OtherDtlsErr("connect refused".to_owned()));
        }
        self.stats.borrow_mut().connects += 1;

        let mut connection = MockConnection::new(&config, peer, Rc::clone(&self.stats));
        connection.send_hello(CLIENT_HELLO);
        connection.retransmit_at = Some(Instant::now() + RETRANSMIT_INTERVAL);
        Ok(connection)
    }

    fn accept(&mut self, config: Arc<HandshakeConfig>, peer: SocketAddr) -> Result<MockConnection> {
        self.stats.borrow_mut().accepts += 1;
        Ok(MockConnection::new(&config, peer, Rc::clone(&self.stats)))
    }
}

pub struct MockConnection {
    peer: SocketAddr,
    certificate: Vec<u8>,
    peer_certificate: Option<Vec<u8>>,
    established: bool,
    retransmit_at: Option<Instant>,
    transmits: VecDeque<BytesMut>,
    events: VecDeque<DtlsConnectionEvent>,
    stats: Rc<RefCell<MockEngineStats>>,
}

impl MockConnection {
    fn new(
        config: &HandshakeConfig,
        peer: SocketAddr,
        stats: Rc<RefCell<MockEngineStats>>,
    ) -> Self {
        Self {
            peer,
            certificate: config
                .certificate()
                .map(|c| c.der().to_vec())
                .unwrap_or_default(),
            peer_certificate: None,
            established: false,
            retransmit_at: None,
            transmits: VecDeque::new(),
            events: VecDeque::new(),
            stats,
        }
    }

    fn send_hello(&mut self, msg_type: u8) {
        self.transmits
            .push_back(handshake_record(msg_type, &self.certificate));
    }

    fn establish(&mut self, peer_certificate: &[u8]) {
        self.peer_certificate = Some(peer_certificate.to_vec());
        self.established = true;
        self.retransmit_at = None;
        self.events.push_back(DtlsConnectionEvent::Established);
    }
}

impl DtlsConnection for MockConnection {
    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    fn handle_read(&mut self, _now: Instant, datagram: &[u8]) -> Result<()> {
        if datagram.len() < 13 {
            return Err(Error::OtherDtlsErr("short record".to_owned()));
        }
        let payload = &datagram[13..];

        match datagram[0] {
            CONTENT_TYPE_HANDSHAKE => match payload.first() {
                Some(&CLIENT_HELLO) if !self.established => {
                    self.send_hello(SERVER_HELLO);
                    self.establish(&payload[1..]);
                }
                Some(&SERVER_HELLO) if !self.established => self.establish(&payload[1..]),
                _ => {}
            },
            CONTENT_TYPE_APPLICATION_DATA => self
                .events
                .push_back(DtlsConnectionEvent::ApplicationData(BytesMut::from(payload))),
            CONTENT_TYPE_ALERT => self.events.push_back(DtlsConnectionEvent::Closed(
                Error::OtherDtlsErr("close_notify".to_owned()),
            )),
            other => {
                return Err(Error::OtherDtlsErr(format!("unexpected content type {other}")));
            }
        }

        Ok(())
    }

    fn handle_write(&mut self, _now: Instant, data: &[u8]) -> Result<()> {
        if !self.established {
            return Err(Error::OtherDtlsErr("handshake not complete".to_owned()));
        }
        self.transmits
            .push_back(record(CONTENT_TYPE_APPLICATION_DATA, data));
        Ok(())
    }

    fn poll_transmit(&mut self) -> Option<BytesMut> {
        self.transmits.pop_front()
    }

    fn poll_event(&mut self) -> Option<DtlsConnectionEvent> {
        self.events.pop_front()
    }

    fn handle_timeout(&mut self, now: Instant) -> Result<()> {
        if let Some(at) = self.retransmit_at {
            if now >= at {
                self.send_hello(CLIENT_HELLO);
                self.retransmit_at = Some(now + RETRANSMIT_INTERVAL);
            }
        }
        Ok(())
    }

    fn poll_timeout(&self) -> Option<Instant> {
        self.retransmit_at
    }

    fn peer_fingerprint(&self, algorithm: RTCSignAlgorithm) -> Result<Vec<u8>> {
        self.peer_certificate
            .as_ref()
            .map(|cert| algorithm.digest(cert))
            .ok_or_else(|| Error::OtherDtlsErr("no peer certificate".to_owned()))
    }

    fn close(&mut self) -> Result<()> {
        self.stats.borrow_mut().closes += 1;
        self.transmits.push_back(record(CONTENT_TYPE_ALERT, &[1, 0]));
        Ok(())
    }
}

pub type Transport = RTCDtlsTransport<MockIceTransport, MockEngine>;

/// One side of a session: its ICE transport, DTLS transport and engine
/// counters.
pub struct Peer {
    pub socket: SocketAddr,
    pub certificate: RTCCertificate,
    pub ice: Rc<RefCell<MockIceTransport>>,
    pub stats: Rc<RefCell<MockEngineStats>>,
    pub transport: Transport,
}

impl Peer {
    /// A peer whose ICE transport already validated `socket` <-> `remote`.
    pub fn new(ice_role: RTCIceRole, socket: SocketAddr, remote: SocketAddr) -> Self {
        let ice = Rc::new(RefCell::new(MockIceTransport::new(ice_role)));
        ice.borrow_mut().add_pair(host_pair(socket, remote));
        Self::with_ice(ice, socket)
    }

    pub fn with_ice(ice: Rc<RefCell<MockIceTransport>>, socket: SocketAddr) -> Self {
        let certificate = certificate();
        let engine = MockEngine::default();
        let stats = Rc::clone(&engine.stats);
        let transport = Transport::new(
            Rc::downgrade(&ice),
            &[certificate.clone()],
            DtlsTransportConfig::default(),
            engine,
        )
        .unwrap();

        Self {
            socket,
            certificate,
            ice,
            stats,
            transport,
        }
    }

    pub fn fingerprint(&self) -> rtc_dtls_transport::RTCDtlsFingerprint {
        self.certificate.fingerprint(RTCSignAlgorithm::Sha256)
    }

    /// Remote parameters announcing this peer's certificate.
    pub fn parameters(&self, role: RTCDtlsRole) -> DTLSParameters {
        DTLSParameters {
            role,
            fingerprints: vec![self.fingerprint()],
        }
    }

    pub fn transmits(&mut self) -> Vec<TaggedBytesMut> {
        let mut out = vec![];
        while let Some(transmit) = self.transport.poll_write() {
            out.push(transmit);
        }
        out
    }

    pub fn state_changes(&mut self) -> Vec<RTCDtlsTransportState> {
        let mut out = vec![];
        while let Some(event) = self.transport.poll_event() {
            if let DtlsTransportEvent::OnDtlsTransportStateChange(state) = event {
                out.push(state);
            }
        }
        out
    }

    /// Receives a datagram the way a socket with a DTLS hook would.
    pub fn receive(&mut self, transmit: TaggedBytesMut) {
        let local = transmit.transport.peer_addr;
        let from = transmit.transport.local_addr;
        if self.ice.borrow().hooks_on(local) == 0 {
            return;
        }
        self.transport
            .handle_read(datagram(local, from, transmit.message))
            .unwrap();
    }
}

/// Shuttles datagrams between two peers until both are quiet. Returns the
/// number of datagrams delivered.
pub fn pump(a: &mut Peer, b: &mut Peer) -> usize {
    let mut delivered = 0;
    loop {
        let from_a = a.transmits();
        let from_b = b.transmits();
        if from_a.is_empty() && from_b.is_empty() {
            return delivered;
        }

        for transmit in from_a {
            assert_eq!(transmit.transport.local_addr, a.socket);
            delivered += 1;
            b.receive(transmit);
        }
        for transmit in from_b {
            assert_eq!(transmit.transport.local_addr, b.socket);
            delivered += 1;
            a.receive(transmit);
        }
    }
}
