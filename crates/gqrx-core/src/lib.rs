//! gqrx-core: Core traits, types, and error definitions for the gqrx
//! remote-control client.
//!
//! This crate defines the transport-agnostic abstractions shared by the
//! protocol client, the band scanner, and the test harness. Applications
//! that only need to program against a receiver depend on these types
//! without pulling in the TCP transport.
//!
//! # Key types
//!
//! - [`Receiver`] -- the typed request/response interface to a receiver
//! - [`Transport`] -- byte-level communication channel
//! - [`Band`] -- the band presets the scanner can sweep
//! - [`Error`] / [`Result`] -- error handling

pub mod band;
pub mod error;
pub mod helpers;
pub mod receiver;
pub mod transport;

// Re-export key types at crate root for ergonomic `use gqrx_core::*`.
pub use band::{Band, BandRange, ParseBandError};
pub use error::{Error, Result};
pub use helpers::{format_freq_mhz, parse_freq_hz};
pub use receiver::Receiver;
pub use transport::Transport;
