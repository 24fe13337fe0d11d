//! Transport trait for receiver communication.
//!
//! The [`Transport`] trait abstracts over the byte stream to the receiver.
//! The production implementation is `TcpTransport` from `gqrx-transport`;
//! the test harness provides an in-memory `MockTransport` and loopback TCP
//! servers.
//!
//! The protocol client operates on a `Transport` rather than directly on a
//! socket, so the line framing and status decoding can be exercised
//! deterministically without a running receiver.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to a receiver.
///
/// Implementations deliver bytes in order and reliably. Line framing and
/// reply classification are handled by the protocol client that consumes
/// this trait.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the receiver.
    ///
    /// Implementations must write all of `data` (and flush it) before
    /// returning, so a command line is never left half-sent.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the receiver into the provided buffer.
    ///
    /// Returns the number of bytes read, which is always non-zero: a peer
    /// that closed the connection yields
    /// [`Error::ConnectionLost`](crate::error::Error::ConnectionLost).
    ///
    /// With `timeout` set to `None` the call waits indefinitely. Otherwise
    /// it returns [`Error::Timeout`](crate::error::Error::Timeout) once the
    /// deadline passes without data.
    async fn receive(&mut self, buf: &mut [u8], timeout: Option<Duration>) -> Result<usize>;

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent `send()` and `receive()` calls
    /// should return [`Error::NotConnected`](crate::error::Error::NotConnected).
    /// Closing an already-closed transport is a no-op.
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
