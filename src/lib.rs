//! # umqtt-embedded — a lightweight MQTT 3.1.1 client engine
//!
//! This crate implements the core of an MQTT 3.1.1 client suitable for
//! embedded and other constrained environments: a byte-exact wire codec, a
//! fixed-capacity pending-packet queue, and a tick-driven run loop that
//! drives connect timeout, keep-alive, inbound dispatch, and retry of
//! unacknowledged traffic.
//!
//! ## Design Philosophy
//!
//! - **Embedded-first**: `no_std` by default, no heap allocator anywhere.
//!   Every buffer is a fixed-capacity [`heapless`] container sized by the
//!   constants in this module.
//! - **Transport agnostic**: the engine is generic over a
//!   [`transport::Connection`] the caller supplies (TCP, TLS, a
//!   UART-framed link, a test double).
//! - **No hidden clock**: the engine never reads wall-clock time. The
//!   `ticks` parameter passed to [`Client::run`] is the sole time source,
//!   which makes the state machine trivially testable.
//! - **Single-threaded, cooperative**: all mutation happens on the thread
//!   driving `run()` and the public send operations; there is no internal
//!   task or reentrant callback.
//!
//! ## Out of scope
//!
//! QoS 2 delivery semantics, message persistence across process lifetime,
//! client-side topic-tree matching, TLS, and authentication beyond the
//! `USERNAME`/`PASSWORD` fields carried in CONNECT. These are the
//! responsibility of the broker or of collaborators injected at
//! construction time.
//!
//! ## Example
//!
//! ```rust,no_run
//! use umqtt_embedded::{Client, ConnectOptions, EventHandler};
//! use umqtt_embedded::transport::{Close, Connection, Read, Write};
//!
//! struct MockConnection;
//! impl Connection for MockConnection {}
//! impl Read for MockConnection {
//!     type Error = ();
//!     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
//! }
//! impl Write for MockConnection {
//!     type Error = ();
//!     fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> { Ok(buf.len()) }
//!     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! }
//! impl Close for MockConnection {
//!     type Error = ();
//!     fn close(self) -> Result<(), Self::Error> { Ok(()) }
//! }
//!
//! #[derive(Default)]
//! struct NoopHandler;
//! impl EventHandler for NoopHandler {}
//!
//! let mut client = Client::new(MockConnection, NoopHandler);
//! client.connect(ConnectOptions {
//!     client_id: "sensor-01",
//!     keep_alive_secs: 60,
//!     clean_session: true,
//!     will: None,
//!     username: None,
//!     password: None,
//! }).unwrap();
//! client.run(0).unwrap();
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

/// Byte-exact encode/decode of every MQTT 3.1.1 control packet this client speaks.
pub mod codec;
/// The `Client` instance: connection state machine, run loop, public API.
pub mod client;
/// Unified error/status kind shared by every fallible operation in the crate.
pub mod error;
/// The fixed-capacity pending-packet queue and its retry bookkeeping.
pub mod queue;
/// Transport abstraction: the `Read`/`Write`/`Close`/`Connection` traits an embedder implements.
pub mod transport;

pub use client::{Client, ConnectOptions, ConnectionStatus, EventHandler, LoggedEvent, Will};
pub use codec::{DecodedPacket, QoS};
pub use error::Error;

/// Maximum length in bytes of a client identifier accepted by [`ConnectOptions`].
pub const MAX_CLIENT_ID_LEN: usize = 64;
/// Maximum length in bytes of a topic name or topic filter.
pub const MAX_TOPIC_LEN: usize = 256;
/// Maximum length in bytes of a PUBLISH payload.
pub const MAX_PAYLOAD_LEN: usize = 1024;
/// Maximum length in bytes of the CONNECT USERNAME field.
pub const MAX_USERNAME_LEN: usize = 64;
/// Maximum length in bytes of the CONNECT PASSWORD field.
pub const MAX_PASSWORD_LEN: usize = 64;
/// Maximum length in bytes of a will message.
pub const MAX_WILL_MESSAGE_LEN: usize = 256;
/// Maximum number of topics a single SUBSCRIBE/UNSUBSCRIBE may carry.
pub const MAX_SUBSCRIBE_TOPICS: usize = 8;
/// Maximum number of acknowledgement-awaiting packets outstanding at once.
pub const MAX_PENDING: usize = 8;

/// Upper bound on the size of a single encoded control packet this client builds.
///
/// Fixed header (up to 5 bytes) + variable header (worst case: CONNECT's
/// 10-byte header) + the largest payload combination the client ever sends
/// (a topic plus a full-size publish payload).
pub const MAX_ENCODED_PACKET_LEN: usize = 5 + 10 + 2 + MAX_TOPIC_LEN + 2 + MAX_PAYLOAD_LEN;

/// CONNACK must arrive within this many milliseconds of sending CONNECT.
pub const CONNECT_TIMEOUT_MS: u32 = 5000;
/// An unacknowledged packet is retransmitted after this many milliseconds.
pub const RETRY_INTERVAL_MS: u32 = 5000;
/// Number of retransmissions attempted before a packet is abandoned.
pub const MAX_RETRIES: u8 = 9;
