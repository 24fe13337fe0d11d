//! Mock TCP server for protocol-level testing.
//!
//! [`MockTcpServer`] provides a lightweight TCP listener pre-loaded with
//! scripted replies, enabling deterministic testing of the TCP transport
//! and the protocol client over a real socket.
//!
//! # Example
//!
//! ```
//! use gqrx_test_harness::MockTcpServer;
//!
//! # async fn example() -> gqrx_core::Result<()> {
//! let mut server = MockTcpServer::new().await?;
//!
//! // When the client sends "f\n", respond with "145500000\n"
//! server.expect(b"f\n", b"145500000\n");
//!
//! // Get the address to connect a TcpTransport to
//! let addr = server.addr().to_string();
//! server.start();
//! // ... connect and test ...
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use gqrx_core::error::{Error, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Gap between the pieces of a chunked reply, long enough for them to
/// arrive as separate reads on loopback.
const CHUNK_GAP: Duration = Duration::from_millis(20);

/// A pre-loaded request/reply pair for the mock TCP server.
#[derive(Debug, Clone)]
struct TcpExpectation {
    /// The exact bytes we expect the client to send.
    request: Vec<u8>,
    /// Reply pieces, written with a short gap between them. `None` closes
    /// the connection instead of replying.
    reply: Option<Vec<Vec<u8>>>,
}

/// A mock TCP server for testing the client over the network.
///
/// The server listens on a random available port on localhost. Once
/// [`start`](MockTcpServer::start) is called, it accepts a single
/// connection and processes expectations in order: for each expected
/// request, it reads from the client and writes back the corresponding
/// reply.
///
/// If the client sends data that does not match the next expectation,
/// the server task ends with an error and drops the connection.
pub struct MockTcpServer {
    /// The address the server is listening on (e.g., "127.0.0.1:54321").
    addr: String,
    /// Held until `start()` moves it into the server task.
    listener: Option<TcpListener>,
    /// Ordered queue of expected request/reply pairs.
    expectations: VecDeque<TcpExpectation>,
    /// Handle to the server task once started.
    server_handle: Option<JoinHandle<std::result::Result<(), String>>>,
}

impl MockTcpServer {
    /// Create a new mock TCP server listening on a random port.
    ///
    /// The listener is bound immediately, so clients may connect before
    /// [`start`](MockTcpServer::start); they are accepted once it runs.
    pub async fn new() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| Error::Transport(format!("failed to bind mock TCP server: {e}")))?;
        let addr = listener.local_addr().map_err(Error::Io)?.to_string();

        Ok(Self {
            addr,
            listener: Some(listener),
            expectations: VecDeque::new(),
            server_handle: None,
        })
    }

    /// Add an expected request/reply pair.
    ///
    /// Expectations are consumed in order. When the connected client sends
    /// bytes matching `request`, the server replies with `response`.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expect_chunked(request, &[response]);
    }

    /// Add an expected request whose reply is written in several pieces.
    pub fn expect_chunked(&mut self, request: &[u8], chunks: &[&[u8]]) {
        self.expectations.push_back(TcpExpectation {
            request: request.to_vec(),
            reply: Some(chunks.iter().map(|c| c.to_vec()).collect()),
        });
    }

    /// Add an expected request after which the server closes the connection.
    pub fn expect_hangup(&mut self, request: &[u8]) {
        self.expectations.push_back(TcpExpectation {
            request: request.to_vec(),
            reply: None,
        });
    }

    /// Get the address the server is listening on.
    ///
    /// Use this to connect a `TcpTransport` to the mock server.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Start the server, accepting a single client connection and processing
    /// all expectations.
    ///
    /// This spawns a background task. Call [`wait`](MockTcpServer::wait) to
    /// block until all expectations have been processed and check for errors.
    /// Calling `start()` a second time has no effect.
    pub fn start(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        let expectations: Vec<TcpExpectation> = self.expectations.drain(..).collect();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener
                .accept()
                .await
                .map_err(|e| format!("failed to accept connection: {e}"))?;

            for (i, expectation) in expectations.iter().enumerate() {
                let mut buf = vec![0u8; expectation.request.len()];
                let mut total_read = 0;

                // Read exactly the expected number of bytes
                while total_read < expectation.request.len() {
                    let n = stream
                        .read(&mut buf[total_read..])
                        .await
                        .map_err(|e| format!("expectation {i}: read error: {e}"))?;
                    if n == 0 {
                        return Err(format!(
                            "expectation {i}: client disconnected after {total_read} bytes (expected {})",
                            expectation.request.len()
                        ));
                    }
                    total_read += n;
                }

                if buf != expectation.request {
                    return Err(format!(
                        "expectation {i}: request mismatch: expected {:?}, got {:?}",
                        String::from_utf8_lossy(&expectation.request),
                        String::from_utf8_lossy(&buf)
                    ));
                }

                let Some(chunks) = &expectation.reply else {
                    // Hang up: dropping the stream closes the socket.
                    return Ok(());
                };

                for (j, chunk) in chunks.iter().enumerate() {
                    if j > 0 {
                        tokio::time::sleep(CHUNK_GAP).await;
                    }
                    stream
                        .write_all(chunk)
                        .await
                        .map_err(|e| format!("expectation {i}: write error: {e}"))?;
                    stream
                        .flush()
                        .await
                        .map_err(|e| format!("expectation {i}: flush error: {e}"))?;
                }
            }

            Ok(())
        });

        self.server_handle = Some(handle);
    }

    /// Wait for the server task to complete and return any errors.
    ///
    /// Call this after the client has finished its interactions to verify
    /// that all expectations were met.
    pub async fn wait(self) -> std::result::Result<(), String> {
        if let Some(handle) = self.server_handle {
            handle
                .await
                .map_err(|e| format!("server task panicked: {e}"))?
        } else {
            Ok(())
        }
    }
}
