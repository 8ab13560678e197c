//! The MQTT client instance: connection state machine, event dispatch, and
//! the tick-driven run loop.
//!
//! # Examples
//!
//! ```rust,no_run
//! use umqtt_embedded::{Client, ConnectOptions, EventHandler};
//! use umqtt_embedded::transport::{Close, Connection, Read, Write};
//! # struct Tcp;
//! # impl Connection for Tcp {}
//! # impl Read for Tcp { type Error = (); fn read(&mut self, _b: &mut [u8]) -> Result<usize, ()> { Ok(0) } }
//! # impl Write for Tcp { type Error = (); fn write(&mut self, b: &[u8]) -> Result<usize, ()> { Ok(b.len()) } fn flush(&mut self) -> Result<(), ()> { Ok(()) } }
//! # impl Close for Tcp { type Error = (); fn close(self) -> Result<(), ()> { Ok(()) } }
//! #[derive(Default)]
//! struct Noop;
//! impl EventHandler for Noop {}
//!
//! let mut client = Client::new(Tcp, Noop);
//! client.connect(ConnectOptions {
//!     client_id: "sensor-01",
//!     keep_alive_secs: 60,
//!     clean_session: true,
//!     will: None,
//!     username: None,
//!     password: None,
//! }).unwrap();
//!
//! // Drive the state machine from the host's tick source.
//! client.run(0).unwrap();
//! ```

use crate::codec::{self, DecodedPacket, QoS};
use crate::error::Error;
use crate::queue::PendingQueue;
use crate::{CONNECT_TIMEOUT_MS, MAX_ENCODED_PACKET_LEN, MAX_PENDING, MAX_TOPIC_LEN};
use crate::transport::{Connection, Read, Write};
use heapless::Vec;

/// The last-will message a broker publishes on the client's behalf if it
/// disconnects ungracefully.
#[derive(Debug, Clone, Copy)]
pub struct Will<'a> {
    /// Topic the will message is published to.
    pub topic: &'a str,
    /// Will message payload.
    pub message: &'a [u8],
    /// Quality of service the broker uses to deliver the will message.
    pub qos: QoS,
    /// Whether the broker should retain the will message on the topic.
    pub retain: bool,
}

/// Parameters for a single CONNECT attempt.
#[derive(Debug, Clone)]
pub struct ConnectOptions<'a> {
    /// Client identifier; must be non-empty.
    pub client_id: &'a str,
    /// Keep-alive interval in seconds; 0 disables keep-alive.
    pub keep_alive_secs: u16,
    /// Whether the broker should discard any previous session for this client id.
    pub clean_session: bool,
    /// Optional last-will message.
    pub will: Option<Will<'a>>,
    /// Optional username.
    pub username: Option<&'a str>,
    /// Optional password.
    pub password: Option<&'a [u8]>,
}

/// Current connection state, as reported by [`Client::status`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ConnectionStatus {
    /// No connection is established or being established.
    Disconnected,
    /// CONNECT has been sent; awaiting CONNACK.
    ConnectPending,
    /// CONNACK with return code 0 has been received.
    Connected,
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConnectionStatus {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ConnectionStatus::Disconnected => defmt::write!(f, "Disconnected"),
            ConnectionStatus::ConnectPending => defmt::write!(f, "ConnectPending"),
            ConnectionStatus::Connected => defmt::write!(f, "Connected"),
        }
    }
}

/// Inbound events a [`Client`] dispatches to its [`EventHandler`].
///
/// All methods default to no-ops; implement only the ones a particular
/// embedder cares about.
#[allow(unused_variables)]
pub trait EventHandler {
    /// CONNACK received.
    fn on_connack(&mut self, session_present: bool, return_code: u8) {}
    /// PUBLISH received (after the client has sent any QoS 1 PUBACK it implies).
    fn on_publish(&mut self, topic: &str, payload: &[u8], qos: u8, dup: bool, retain: bool) {}
    /// PUBACK received, acknowledging one of this client's QoS 1 publishes.
    fn on_puback(&mut self, packet_id: u16) {}
    /// SUBACK received.
    fn on_suback(&mut self, packet_id: u16, return_codes: &[u8]) {}
    /// UNSUBACK received.
    fn on_unsuback(&mut self, packet_id: u16) {}
    /// PINGRESP received.
    fn on_pingresp(&mut self) {}
    /// A malformed or unrecognised inbound packet was encountered. The
    /// connection state is left unchanged; the packet is simply dropped.
    fn on_packet_error(&mut self, err: Error) {}
}

/// A recorded [`EventHandler`] call, used by [`EventLog`] for assertions in tests.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum LoggedEvent {
    /// See [`EventHandler::on_connack`].
    ConnAck {
        /// Session-present flag from CONNACK.
        session_present: bool,
        /// Return code from CONNACK.
        return_code: u8,
    },
    /// See [`EventHandler::on_publish`].
    Publish {
        /// Topic the message was published to.
        topic: heapless::String<MAX_TOPIC_LEN>,
        /// Message payload.
        payload: Vec<u8, { crate::MAX_PAYLOAD_LEN }>,
        /// Raw wire QoS value.
        qos: u8,
    },
    /// See [`EventHandler::on_puback`].
    PubAck {
        /// Packet identifier being acknowledged.
        packet_id: u16,
    },
    /// See [`EventHandler::on_suback`].
    SubAck {
        /// Packet identifier being acknowledged.
        packet_id: u16,
    },
    /// See [`EventHandler::on_unsuback`].
    UnsubAck {
        /// Packet identifier being acknowledged.
        packet_id: u16,
    },
    /// See [`EventHandler::on_pingresp`].
    PingResp,
    /// See [`EventHandler::on_packet_error`].
    PacketError(Error),
}

/// A test-only [`EventHandler`] that records every call into a log instead
/// of acting on it, so tests assert against the log rather than
/// instrumenting individual callbacks.
#[derive(Debug, Default)]
pub struct EventLog {
    /// Every event dispatched to this handler, in arrival order.
    pub events: Vec<LoggedEvent, 32>,
}

impl EventHandler for EventLog {
    fn on_connack(&mut self, session_present: bool, return_code: u8) {
        let _ = self.events.push(LoggedEvent::ConnAck {
            session_present,
            return_code,
        });
    }

    fn on_publish(&mut self, topic: &str, payload: &[u8], qos: u8, _dup: bool, _retain: bool) {
        let _ = self.events.push(LoggedEvent::Publish {
            topic: heapless::String::try_from(topic).unwrap_or_default(),
            payload: Vec::from_slice(payload).unwrap_or_default(),
            qos,
        });
    }

    fn on_puback(&mut self, packet_id: u16) {
        let _ = self.events.push(LoggedEvent::PubAck { packet_id });
    }

    fn on_suback(&mut self, packet_id: u16, _return_codes: &[u8]) {
        let _ = self.events.push(LoggedEvent::SubAck { packet_id });
    }

    fn on_unsuback(&mut self, packet_id: u16) {
        let _ = self.events.push(LoggedEvent::UnsubAck { packet_id });
    }

    fn on_pingresp(&mut self) {
        let _ = self.events.push(LoggedEvent::PingResp);
    }

    fn on_packet_error(&mut self, err: Error) {
        let _ = self.events.push(LoggedEvent::PacketError(err));
    }
}

/// An MQTT 3.1.1 client instance.
///
/// Owns a transport `C` and drives the connection state machine
/// (`Disconnected -> ConnectPending -> Connected -> Disconnected`) across
/// calls to the public send operations and [`Client::run`]. Inbound events
/// are dispatched to `H`, a user-supplied [`EventHandler`].
pub struct Client<C: Connection, H: EventHandler> {
    connection: C,
    handler: H,
    pending: PendingQueue,
    next_packet_id: u16,
    status: ConnectionStatus,
    keep_alive_secs: u16,
    last_tx_ticks: u32,
    current_ticks: u32,
}

impl<C: Connection, H: EventHandler> core::fmt::Debug for Client<C, H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Client")
            .field("status", &self.status)
            .field("next_packet_id", &self.next_packet_id)
            .field("pending_len", &self.pending.len())
            .finish()
    }
}

impl<C: Connection, H: EventHandler> Client<C, H> {
    /// Construct a new, disconnected client over `connection`, dispatching
    /// inbound events to `handler`.
    pub fn new(connection: C, handler: H) -> Self {
        Self {
            connection,
            handler,
            pending: PendingQueue::new(),
            next_packet_id: 0,
            status: ConnectionStatus::Disconnected,
            keep_alive_secs: 0,
            last_tx_ticks: 0,
            current_ticks: 0,
        }
    }

    /// The current connection state.
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Borrow the event handler, e.g. to inspect an [`EventLog`] in tests.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    fn next_id(&mut self) -> u16 {
        self.next_packet_id = match self.next_packet_id.checked_add(1) {
            Some(0) | None => 1,
            Some(n) => n,
        };
        self.next_packet_id
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<(), Error> {
        match self.connection.write(buf) {
            Ok(n) if n == buf.len() => {
                self.connection.flush().map_err(|_| Error::Network)?;
                self.last_tx_ticks = self.current_ticks;
                Ok(())
            }
            Ok(_) => Err(Error::Network),
            Err(_) => Err(Error::Network),
        }
    }

    /// Issue a CONNECT and enter [`ConnectionStatus::ConnectPending`].
    ///
    /// Returns [`Error::ConnectPending`] or [`Error::Connected`] without
    /// sending anything if a connection is already in flight or established.
    pub fn connect(&mut self, options: ConnectOptions) -> Result<(), Error> {
        match self.status {
            ConnectionStatus::ConnectPending => return Err(Error::ConnectPending),
            ConnectionStatus::Connected => return Err(Error::Connected),
            ConnectionStatus::Disconnected => {}
        }

        let will = options
            .will
            .map(|w| (w.topic, w.message, w.qos, w.retain));
        let fields = codec::ConnectFields {
            client_id: options.client_id,
            keep_alive_secs: options.keep_alive_secs,
            clean_session: options.clean_session,
            will,
            username: options.username,
            password: options.password,
        };

        let mut buf = [0u8; MAX_ENCODED_PACKET_LEN];
        let n = codec::encode_connect(&mut buf, &fields)?;

        self.pending
            .enqueue(0, codec::CONNECT, self.current_ticks, &buf[..n])?;
        self.write_all(&buf[..n])?;
        self.keep_alive_secs = options.keep_alive_secs;
        self.status = ConnectionStatus::ConnectPending;
        Ok(())
    }

    /// Publish a message. Returns the assigned packet identifier (0 for QoS 0).
    pub fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<u16, Error> {
        if self.status != ConnectionStatus::Connected {
            return Err(Error::Network);
        }

        let packet_id = if qos == QoS::AtLeastOnce {
            Some(self.next_id())
        } else {
            None
        };

        let mut buf = [0u8; MAX_ENCODED_PACKET_LEN];
        let n = codec::encode_publish(
            &mut buf,
            topic,
            payload,
            qos.as_u8(),
            false,
            retain,
            packet_id,
        )?;

        if let Some(id) = packet_id {
            self.pending
                .enqueue(id, codec::PUBLISH, self.current_ticks, &buf[..n])?;
        }
        self.write_all(&buf[..n])?;
        Ok(packet_id.unwrap_or(0))
    }

    /// Subscribe to one or more topics. `topics` and `qos` must be the same
    /// non-empty length. Returns the assigned packet identifier.
    pub fn subscribe(&mut self, topics: &[&str], qos: &[QoS]) -> Result<u16, Error> {
        if self.status != ConnectionStatus::Connected {
            return Err(Error::Network);
        }

        let mut raw_qos: Vec<u8, { crate::MAX_SUBSCRIBE_TOPICS }> = Vec::new();
        for &q in qos {
            raw_qos.push(q.as_u8()).map_err(|_| Error::BufSize)?;
        }

        let packet_id = self.next_id();
        let mut buf = [0u8; MAX_ENCODED_PACKET_LEN];
        let n = codec::encode_subscribe(&mut buf, packet_id, topics, &raw_qos)?;

        self.pending
            .enqueue(packet_id, codec::SUBSCRIBE, self.current_ticks, &buf[..n])?;
        self.write_all(&buf[..n])?;
        Ok(packet_id)
    }

    /// Unsubscribe from one or more topics. Returns the assigned packet identifier.
    pub fn unsubscribe(&mut self, topics: &[&str]) -> Result<u16, Error> {
        if self.status != ConnectionStatus::Connected {
            return Err(Error::Network);
        }

        let packet_id = self.next_id();
        let mut buf = [0u8; MAX_ENCODED_PACKET_LEN];
        let n = codec::encode_unsubscribe(&mut buf, packet_id, topics)?;

        self.pending
            .enqueue(packet_id, codec::UNSUBSCRIBE, self.current_ticks, &buf[..n])?;
        self.write_all(&buf[..n])?;
        Ok(packet_id)
    }

    /// Send DISCONNECT and transition to [`ConnectionStatus::Disconnected`].
    ///
    /// Unlike `connect`, this does not short-circuit when already
    /// disconnected: it always attempts the send, matching the original
    /// library's behavior of reporting whatever the transport write yields.
    pub fn disconnect(&mut self) -> Result<(), Error> {
        let mut buf = [0u8; 2];
        let n = codec::encode_disconnect(&mut buf)?;
        self.write_all(&buf[..n])?;
        self.status = ConnectionStatus::Disconnected;
        Ok(())
    }

    /// Advance the state machine by one tick.
    ///
    /// Performs, in order: inbound pump, connect-timeout check, keep-alive
    /// emission, retry scan — then returns the first non-`Ok` result
    /// encountered across the whole pass. A decode error in step 1 does not
    /// abort the run: steps 2-4 still execute (reporting it early to
    /// [`EventHandler::on_packet_error`] for observability), but unless a
    /// later step produces its own error first, `run` still surfaces that
    /// decode error as its `Err` once the pass completes.
    pub fn run(&mut self, ticks: u32) -> Result<(), Error> {
        self.current_ticks = ticks;
        let mut pending_error = None;

        // 1. Inbound pump.
        let mut rx = [0u8; MAX_ENCODED_PACKET_LEN];
        match self.connection.read(&mut rx) {
            Ok(0) => {}
            Ok(n) => match self.dispatch(&rx[..n]) {
                Ok(()) => {}
                Err(Error::PacketError) => {
                    self.handler.on_packet_error(Error::PacketError);
                    pending_error = Some(Error::PacketError);
                }
                Err(e) => return Err(e),
            },
            Err(_) => return Err(Error::Network),
        }

        // 2. Connect timeout.
        if self.status == ConnectionStatus::ConnectPending
            && ticks.wrapping_sub(self.last_tx_ticks) > CONNECT_TIMEOUT_MS
        {
            self.pending.remove_by_type(codec::CONNECT);
            self.status = ConnectionStatus::Disconnected;
            return Err(Error::Timeout);
        }

        // 3. Keep-alive.
        if self.status == ConnectionStatus::Connected
            && self.keep_alive_secs > 0
            && ticks.wrapping_sub(self.last_tx_ticks)
                >= (self.keep_alive_secs as u32 * 1000 * 2 / 3)
        {
            let mut buf = [0u8; 2];
            let n = codec::encode_pingreq(&mut buf)?;
            self.write_all(&buf[..n])?;
        }

        // 4. Retry scan.
        let mut expired: Vec<(u16, u8), MAX_PENDING> = Vec::new();
        let connection = &mut self.connection;
        let last_tx_ticks = &mut self.last_tx_ticks;
        let result = self.pending.scan_retries(ticks, &mut expired, |bytes| {
            match connection.write(bytes) {
                Ok(n) if n == bytes.len() => {
                    connection.flush().map_err(|_| Error::Network)?;
                    *last_tx_ticks = ticks;
                    Ok(())
                }
                _ => Err(Error::Network),
            }
        });
        result?;
        if !expired.is_empty() {
            return Err(Error::Timeout);
        }

        match pending_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn dispatch(&mut self, buf: &[u8]) -> Result<(), Error> {
        let packet = codec::decode(buf)?;
        match packet {
            DecodedPacket::ConnAck {
                session_present,
                return_code,
            } => {
                self.pending.remove_by_type(codec::CONNECT);
                self.status = if return_code == 0 {
                    ConnectionStatus::Connected
                } else {
                    ConnectionStatus::Disconnected
                };
                self.handler.on_connack(session_present, return_code);
            }
            DecodedPacket::Publish {
                dup,
                qos,
                retain,
                topic,
                payload,
                packet_id,
            } => {
                if qos == 1 {
                    if let Some(id) = packet_id {
                        let mut buf = [0u8; 4];
                        let n = codec::encode_puback(&mut buf, id)?;
                        self.write_all(&buf[..n])?;
                    }
                }
                self.handler
                    .on_publish(topic.as_str(), &payload, qos, dup, retain);
            }
            DecodedPacket::PubAck { packet_id } => {
                self.pending.remove(packet_id, codec::PUBLISH);
                self.handler.on_puback(packet_id);
            }
            DecodedPacket::SubAck {
                packet_id,
                return_codes,
            } => {
                self.pending.remove(packet_id, codec::SUBSCRIBE);
                self.handler.on_suback(packet_id, &return_codes);
            }
            DecodedPacket::UnsubAck { packet_id } => {
                self.pending.remove(packet_id, codec::UNSUBSCRIBE);
                self.handler.on_unsuback(packet_id);
            }
            DecodedPacket::PingResp => {
                self.handler.on_pingresp();
            }
        }
        Ok(())
    }
}
