//! Transport implementations for the gqrx client.
//!
//! This crate provides [`TcpTransport`], the concrete implementation of the
//! [`Transport`](gqrx_core::Transport) trait used to reach a receiver's
//! remote-control port.
//!
//! # Example
//!
//! ```no_run
//! use gqrx_transport::TcpTransport;
//! use gqrx_core::transport::Transport;
//!
//! # async fn example() -> gqrx_core::Result<()> {
//! let mut transport = TcpTransport::connect("localhost:7356").await?;
//!
//! // Ask for the tuned frequency
//! transport.send(b"f\n").await?;
//!
//! // Wait for the reply with no deadline
//! let mut buf = [0u8; 64];
//! let n = transport.receive(&mut buf, None).await?;
//! # Ok(())
//! # }
//! ```

pub mod tcp;

pub use tcp::TcpTransport;
