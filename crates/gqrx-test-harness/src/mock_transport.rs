//! Mock transport for deterministic testing of the protocol client.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/response pairs. This lets you test command encoding, reply
//! reassembly, and status decoding without a running receiver.
//!
//! # Example
//!
//! ```
//! use gqrx_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! // When the client sends "f\n", answer with a frequency line.
//! mock.expect(b"f\n", b"430000000\n");
//! // Deliver a status reply in two pieces.
//! mock.expect_chunked(b"AOS\n", &[b"RPRT", b" 0\n"]);
//! // Drop the connection instead of answering.
//! mock.expect_hangup(b"c\n");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

use gqrx_core::error::{Error, Result};
use gqrx_core::transport::Transport;

/// What the mock does once a matching request has been sent.
#[derive(Debug, Clone)]
enum Reply {
    /// Deliver these chunks, one per `receive()` call at most.
    Chunks(Vec<Vec<u8>>),
    /// Behave as if the peer closed the connection.
    Hangup,
}

/// A pre-loaded request/reply pair for the mock transport.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be sent.
    request: Vec<u8>,
    reply: Reply,
}

/// A mock [`Transport`] for testing the protocol client without a receiver.
///
/// Expectations are consumed in order. When `send()` is called, the sent
/// data is recorded and matched against the next expectation; its reply is
/// then handed out by subsequent `receive()` calls, never more than one
/// chunk (and never more than the caller's buffer) per call.
///
/// A `receive()` with nothing pending returns [`Error::Timeout`], mimicking
/// a receiver that stays silent. A mismatched or unexpected send returns
/// [`Error::Protocol`].
#[derive(Debug)]
pub struct MockTransport {
    /// Ordered queue of expected requests.
    expectations: VecDeque<Expectation>,
    /// Chunks waiting to be returned by `receive()`.
    pending: VecDeque<Vec<u8>>,
    /// Set once a hang-up expectation has fired.
    hung_up: bool,
    /// Whether the transport is "connected".
    connected: bool,
    /// Log of all bytes sent through this transport.
    sent_log: Vec<Vec<u8>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            expectations: VecDeque::new(),
            pending: VecDeque::new(),
            hung_up: false,
            connected: true,
            sent_log: Vec::new(),
        }
    }

    /// Add an expected request/response pair.
    ///
    /// When `send()` is called with data matching `request`, subsequent
    /// `receive()` calls return `response`. An empty `response` queues
    /// nothing.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expect_chunked(request, &[response]);
    }

    /// Add an expected request whose response arrives in several pieces.
    ///
    /// Each chunk is delivered by a separate `receive()` call, which is how
    /// a reply split across TCP segments looks to the client.
    pub fn expect_chunked(&mut self, request: &[u8], chunks: &[&[u8]]) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            reply: Reply::Chunks(chunks.iter().map(|c| c.to_vec()).collect()),
        });
    }

    /// Add an expected request after which the peer hangs up.
    ///
    /// Once `request` has been sent, every `receive()` returns
    /// [`Error::ConnectionLost`].
    pub fn expect_hangup(&mut self, request: &[u8]) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            reply: Reply::Hangup,
        });
    }

    /// Return a reference to all data that has been sent through this transport.
    ///
    /// Each element is the byte slice from one `send()` call.
    pub fn sent_data(&self) -> &[Vec<u8>] {
        &self.sent_log
    }

    /// Return the number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }

    /// Set the connected state of the mock transport.
    ///
    /// When set to `false`, subsequent `send()` and `receive()` calls will
    /// return [`Error::NotConnected`].
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        if self.hung_up {
            return Err(Error::ConnectionLost);
        }

        self.sent_log.push(data.to_vec());

        let expectation = self.expectations.pop_front().ok_or_else(|| {
            Error::Protocol(format!(
                "no more expectations in mock transport (sent {:?})",
                String::from_utf8_lossy(data)
            ))
        })?;

        if data != expectation.request.as_slice() {
            return Err(Error::Protocol(format!(
                "unexpected send data: expected {:?}, got {:?}",
                String::from_utf8_lossy(&expectation.request),
                String::from_utf8_lossy(data)
            )));
        }

        match expectation.reply {
            Reply::Chunks(chunks) => {
                self.pending
                    .extend(chunks.into_iter().filter(|c| !c.is_empty()));
            }
            Reply::Hangup => self.hung_up = true,
        }
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Option<Duration>) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        let Some(mut chunk) = self.pending.pop_front() else {
            if self.hung_up {
                return Err(Error::ConnectionLost);
            }
            return Err(Error::Timeout);
        };

        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            // Keep the unread tail for the next call.
            self.pending.push_front(chunk.split_off(n));
        }
        Ok(n)
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.pending.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
