//! Transport abstraction for the MQTT engine.
//!
//! The engine never opens a socket itself. Callers inject a type that
//! implements [`Connection`] — over a TCP stream, a TLS session, a
//! UART-framed radio link, or (in tests) a byte-queue double — and the
//! engine drives it through these four small traits.
//!
//! ## Framing contract
//!
//! [`Read::read`] must return exactly one complete, framed MQTT control
//! packet per call (or `Ok(0)` if none is available yet). The engine does
//! not reframe partial reads across calls; pre-framing the byte stream into
//! discrete packets is the transport adapter's responsibility.

/// Trait for reading data from a network connection.
///
/// This trait provides a synchronous, non-blocking interface: a call that
/// has no data ready returns `Ok(0)` rather than blocking.
pub trait Read {
    /// Associated error type for read operations.
    type Error: core::fmt::Debug;

    /// Read the next framed control packet into `buf`.
    ///
    /// # Returns
    ///
    /// * `Ok(n)` with `n > 0` — a complete packet of `n` bytes was copied into `buf`.
    /// * `Ok(0)` — no packet is available right now; the caller should continue.
    /// * `Err(e)` — a fatal transport failure occurred.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Trait for writing data to a network connection.
pub trait Write {
    /// Associated error type for write operations.
    type Error: core::fmt::Debug;

    /// Write `buf` to the connection.
    ///
    /// Implementations should write synchronously and return the number of
    /// bytes actually written; a return value less than `buf.len()` is
    /// treated by the engine as a transport failure.
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered write data.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Trait for closing network connections.
pub trait Close {
    /// Associated error type for close operations.
    type Error: core::fmt::Debug;

    /// Close the connection and release any associated resources.
    fn close(self) -> Result<(), Self::Error>;
}

/// A complete synchronous network connection: read, write, and close.
///
/// Any type implementing this trait can back a [`crate::Client`].
pub trait Connection: Read + Write + Close {}
