//! gqrx-test-harness: Test utilities for the gqrx remote-control client.
//!
//! - [`MockTransport`] -- in-memory [`Transport`](gqrx_core::Transport)
//!   with scripted request/response pairs, for deterministic unit tests of
//!   the protocol client.
//! - [`MockTcpServer`] -- a loopback listener that plays back a script over
//!   a real socket, for exercising the TCP transport.
//! - [`SimulatedReceiver`] -- a stateful loopback server that speaks the
//!   remote-control command set, for end-to-end client and scanner tests.

pub mod mock_tcp;
pub mod mock_transport;
pub mod sim;

pub use mock_tcp::MockTcpServer;
pub use mock_transport::MockTransport;
pub use sim::{SimulatedReceiver, SimulatedState};
