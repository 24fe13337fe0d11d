//! gqrx-remote: Remote-control client and band scanner for the gqrx
//! software-defined radio receiver.
//!
//! gqrx exposes a small line-oriented subset of the Hamlib `rigctld`
//! protocol on TCP port 7356. This crate implements:
//!
//! - [`protocol`] -- line framing and the `RPRT` status grammar
//! - [`commands`] -- pure builders and parsers for each command
//! - [`GqrxClient`] -- the transaction client, implementing
//!   [`Receiver`](gqrx_core::Receiver)
//! - [`GqrxBuilder`] / [`ClientConfig`] -- connection configuration
//! - [`Scanner`] -- sweeps a band and reports signals above a threshold
//!
//! # Example
//!
//! ```no_run
//! use gqrx_core::Receiver;
//! use gqrx_remote::{GqrxBuilder, ScanConfig, Scanner};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> gqrx_core::Result<()> {
//! let mut client = GqrxBuilder::new().build().await?;
//! println!("tuned to {} Hz", client.get_frequency().await?);
//!
//! let scanner = Scanner::new(ScanConfig::new(144_000_000, 148_000_000))?;
//! let cancel = CancellationToken::new();
//! scanner.run(&mut client, &cancel, |obs| println!("{obs}")).await?;
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod client;
pub mod commands;
pub mod protocol;
pub mod scanner;

pub use builder::{ClientConfig, GqrxBuilder, DEFAULT_HOST, DEFAULT_PORT};
pub use client::GqrxClient;
pub use scanner::{next_frequency, Observation, ScanConfig, ScanSummary, Scanner};
