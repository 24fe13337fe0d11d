//! # gqrx -- Remote Control for the gqrx SDR Receiver
//!
//! `gqrx` is an asynchronous Rust client for the remote-control interface
//! of the [gqrx](https://gqrx.dk) software-defined radio receiver, plus a
//! band scanner built on it.
//!
//! Enable remote control in gqrx (Tools > Remote control) and connect:
//!
//! ```no_run
//! use gqrx::{GqrxBuilder, Receiver};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut rx = GqrxBuilder::new().host("localhost").port(7356).build().await?;
//!
//!     rx.set_frequency(145_500_000).await?;
//!     println!("strength: {} dBFS", rx.get_signal_strength().await?);
//!     rx.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! | Crate               | Purpose                                            |
//! |---------------------|----------------------------------------------------|
//! | `gqrx-core`         | Traits ([`Receiver`], [`Transport`]), bands, errors |
//! | `gqrx-transport`    | TCP transport                                      |
//! | `gqrx-remote`       | Protocol client ([`GqrxClient`]) and [`Scanner`]   |
//! | **`gqrx`**          | This facade crate -- re-exports everything         |
//!
//! ## Scanning
//!
//! [`Scanner`] steps the receiver across a band and calls back on every
//! reading above the threshold. It runs until its cancellation token fires:
//!
//! ```no_run
//! use gqrx::{Band, GqrxBuilder, ScanConfig, Scanner};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> gqrx::Result<()> {
//! let mut rx = GqrxBuilder::new().build().await?;
//! let scanner = Scanner::new(ScanConfig::for_band(Band::Band2m))?;
//! let cancel = CancellationToken::new();
//! let summary = scanner.run(&mut rx, &cancel, |obs| println!("{obs}")).await?;
//! println!("{} hits", summary.hits);
//! # Ok(())
//! # }
//! ```

pub use gqrx_core::*;

pub use gqrx_remote::{
    next_frequency, ClientConfig, GqrxBuilder, GqrxClient, Observation, ScanConfig, ScanSummary,
    Scanner, DEFAULT_HOST, DEFAULT_PORT,
};

/// Line protocol framing, command builders, and reply parsers.
pub mod protocol {
    pub use gqrx_remote::commands;
    pub use gqrx_remote::protocol::*;
}

/// Scanner defaults.
pub mod scanner {
    pub use gqrx_remote::scanner::{DEFAULT_PAUSE, DEFAULT_STEP_HZ, DEFAULT_THRESHOLD_DB};
}

/// TCP transport to a receiver.
pub mod tcp {
    pub use gqrx_transport::tcp::*;
}
