//! Unified error and status kind for the MQTT engine.

/// A common error type for every fallible operation in this crate.
///
/// [`Error::ConnectPending`] and [`Error::Connected`] are not failures in
/// the usual sense. They are the "informational, no action taken" result of
/// calling [`crate::Client::connect`] while a connection is already in
/// flight or established, mirroring [`crate::Client::status`].
/// [`Error::Disconnected`] is kept alongside them to complete that
/// three-state mirror of [`crate::ConnectionStatus`] (spec.md's error table
/// lists all three together), but [`crate::Client::disconnect`] never gates
/// on the current status before sending — see its doc comment and
/// `DESIGN.md` — so nothing in this crate currently constructs this variant.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// A null, zero-length, or logically inconsistent argument was supplied
    /// (e.g. a will topic without a will message, or a QoS greater than 1).
    Parm,
    /// The caller-supplied buffer was too small to hold the encoded packet,
    /// or a fixed-capacity internal container (the pending queue, a
    /// `heapless` string/vec) is already full.
    BufSize,
    /// Inbound bytes were malformed, or the remaining-length field did not
    /// match the number of bytes presented to the decoder.
    PacketError,
    /// The transport reported a read/write failure or a short write.
    Network,
    /// CONNECT went unacknowledged within [`crate::CONNECT_TIMEOUT_MS`], or a
    /// pending packet exhausted its retry budget.
    Timeout,
    /// The connection is already disconnected. Currently unreachable: no
    /// operation in this crate gates on "already disconnected" and returns
    /// this as a no-op (see the type-level doc comment above).
    Disconnected,
    /// A CONNECT is already in flight awaiting CONNACK.
    ConnectPending,
    /// The connection is already established.
    Connected,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Parm => defmt::write!(f, "Parm"),
            Error::BufSize => defmt::write!(f, "BufSize"),
            Error::PacketError => defmt::write!(f, "PacketError"),
            Error::Network => defmt::write!(f, "Network"),
            Error::Timeout => defmt::write!(f, "Timeout"),
            Error::Disconnected => defmt::write!(f, "Disconnected"),
            Error::ConnectPending => defmt::write!(f, "ConnectPending"),
            Error::Connected => defmt::write!(f, "Connected"),
        }
    }
}
