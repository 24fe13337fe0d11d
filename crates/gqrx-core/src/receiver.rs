//! The `Receiver` trait -- typed remote control of a receiver.
//!
//! Every method is one request/response transaction with the receiver.
//! Nothing is cached locally: getters always perform a fresh round trip,
//! because the receiver's state may be changed by other clients or by the
//! operator at any time.
//!
//! Methods take `&mut self`. The remote-control protocol is strictly
//! request/response with no pipelining, so a connection can carry at most
//! one command in flight; exclusive borrows make that a compile-time
//! property.
//!
//! Setters return the receiver's status reply: `Ok(true)` for `RPRT 0`,
//! `Ok(false)` for `RPRT 1`. Anything else is a protocol error.

use async_trait::async_trait;

use crate::error::Result;

/// Unified asynchronous interface for controlling a receiver.
#[async_trait]
pub trait Receiver: Send {
    /// Get the tuned frequency in hertz.
    async fn get_frequency(&mut self) -> Result<u64>;

    /// Tune to a frequency in hertz.
    async fn set_frequency(&mut self, freq_hz: u64) -> Result<bool>;

    /// Get the audio gain.
    async fn get_gain(&mut self) -> Result<f64>;

    /// Set the audio gain.
    async fn set_gain(&mut self, gain: f64) -> Result<bool>;

    /// Get the demodulator mode token (e.g. `"WFM"`, `"AM"`), verbatim.
    async fn get_demod_mode(&mut self) -> Result<String>;

    /// Set the demodulator mode token.
    async fn set_demod_mode(&mut self, mode: &str) -> Result<bool>;

    /// Read the signal strength in dBFS.
    async fn get_signal_strength(&mut self) -> Result<f64>;

    /// Get the squelch threshold in dBFS.
    async fn get_squelch(&mut self) -> Result<f64>;

    /// Set the squelch threshold in dBFS.
    async fn set_squelch(&mut self, dbfs: f64) -> Result<bool>;

    /// Get the audio recorder status token, verbatim.
    async fn get_record_status(&mut self) -> Result<String>;

    /// Set the audio recorder status token (e.g. `"1"` to start, `"0"` to stop).
    async fn set_record_status(&mut self, status: &str) -> Result<bool>;

    /// Signal acquisition of signal (AOS), e.g. at the start of a satellite pass.
    async fn acquire_signal(&mut self) -> Result<bool>;

    /// Signal loss of signal (LOS), e.g. at the end of a satellite pass.
    async fn loss_of_signal(&mut self) -> Result<bool>;

    /// Say goodbye to the receiver and release the connection.
    ///
    /// Best effort and idempotent: calling it again after the connection
    /// has been released returns `Ok(())`.
    async fn close(&mut self) -> Result<()>;
}
