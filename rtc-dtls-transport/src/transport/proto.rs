use std::time::Instant;

use bytes::BytesMut;
use shared::TaggedBytesMut;
use shared::error::{Error, Result};

use super::RTCDtlsTransport;
use crate::engine::DtlsEngine;
use crate::event::DtlsTransportEvent;
use crate::ice::{IceTransport, IceTransportEvent};

impl<I: IceTransport, E: DtlsEngine> sansio::Protocol<TaggedBytesMut, BytesMut, IceTransportEvent>
    for RTCDtlsTransport<I, E>
{
    type Rout = ();
    type Wout = TaggedBytesMut;
    type Eout = DtlsTransportEvent;
    type Error = Error;
    type Time = Instant;

    /// Handles a datagram the ICE transport routed to one of our sockets.
    fn handle_read(&mut self, msg: TaggedBytesMut) -> Result<()> {
        self.handle_datagram(msg)
    }

    /// Decrypted application data is not delivered upward.
    fn poll_read(&mut self) -> Option<Self::Rout> {
        None
    }

    /// Encrypts application data; only allowed once connected.
    fn handle_write(&mut self, msg: BytesMut) -> Result<()> {
        self.handle_application_write(msg)
    }

    /// Returns packets to transmit
    ///
    /// It should be polled for transmit after:
    /// - a call was made to `handle_read`
    /// - a call was made to `handle_write`
    /// - a call was made to `handle_event`
    /// - a call was made to `handle_timeout`
    /// - a call was made to `start` or `stop`
    fn poll_write(&mut self) -> Option<Self::Wout> {
        self.transmits.pop_front()
    }

    fn handle_event(&mut self, evt: IceTransportEvent) -> Result<()> {
        match evt {
            IceTransportEvent::CandidatePairValidated(candidate_pair) => {
                self.add_candidate_pair(&candidate_pair)
            }
        }
    }

    fn poll_event(&mut self) -> Option<Self::Eout> {
        self.events.pop_front()
    }

    fn handle_timeout(&mut self, now: Instant) -> Result<()> {
        self.handle_connection_timeout(now)
    }

    fn poll_timeout(&mut self) -> Option<Self::Time> {
        self.connection_timeout()
    }

    fn close(&mut self) -> Result<()> {
        self.stop()
    }
}
