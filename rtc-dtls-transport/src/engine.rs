use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::BytesMut;
use shared::error::{Error, Result};

use crate::config::HandshakeConfig;
use crate::fingerprint::RTCSignAlgorithm;

/// Outcome of feeding a connection.
#[derive(Debug, PartialEq)]
pub enum DtlsConnectionEvent {
    /// The handshake completed. The peer certificate is now available.
    Established,
    /// Decrypted application data.
    ApplicationData(BytesMut),
    /// The peer closed the connection or the handshake failed.
    Closed(Error),
}

/// A DTLS record engine.
///
/// It performs the handshake cryptography and record protection; the
/// transport decides when to connect or accept and what to trust.
pub trait DtlsEngine {
    type Connection: DtlsConnection;

    /// Starts a client handshake toward `peer`.
    fn connect(&mut self, config: Arc<HandshakeConfig>, peer: SocketAddr)
    -> Result<Self::Connection>;

    /// Creates a server side connection for an inbound handshake from `peer`.
    fn accept(&mut self, config: Arc<HandshakeConfig>, peer: SocketAddr)
    -> Result<Self::Connection>;
}

/// A single sans-IO DTLS association.
pub trait DtlsConnection {
    fn peer_addr(&self) -> SocketAddr;

    /// Feeds one received datagram.
    fn handle_read(&mut self, now: Instant, datagram: &[u8]) -> Result<()>;

    /// Encrypts application data.
    fn handle_write(&mut self, now: Instant, data: &[u8]) -> Result<()>;

    /// Next record to put on the wire.
    fn poll_transmit(&mut self) -> Option<BytesMut>;

    fn poll_event(&mut self) -> Option<DtlsConnectionEvent>;

    fn handle_timeout(&mut self, now: Instant) -> Result<()>;

    fn poll_timeout(&self) -> Option<Instant>;

    /// Digest of the certificate the peer presented, under `algorithm`.
    fn peer_fingerprint(&self, algorithm: RTCSignAlgorithm) -> Result<Vec<u8>>;

    /// Sends close_notify. Transmits may still be pending afterwards.
    fn close(&mut self) -> Result<()>;
}
