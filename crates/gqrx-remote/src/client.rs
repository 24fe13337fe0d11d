//! GqrxClient -- the [`Receiver`] implementation for gqrx's remote control.
//!
//! This module ties the line protocol ([`protocol`], [`commands`]) to a
//! [`Transport`] to produce a working client. It handles command framing,
//! newline-delimited reply reassembly, status decoding, and connection
//! teardown.
//!
//! Every operation is one transaction: send a command line, then read and
//! decode exactly one reply line. The client never sends a command while a
//! previous reply is still outstanding; if an earlier transaction was cut
//! short (for example by a read timeout), the stale reply is read and
//! discarded before the next command goes out.

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use tracing::{debug, info, trace, warn};

use gqrx_core::error::{Error, Result};
use gqrx_core::receiver::Receiver;
use gqrx_core::transport::Transport;

use crate::builder::ClientConfig;
use crate::commands;
use crate::protocol::{self, DecodeResult, MAX_REPLY_LEN, READ_CHUNK};

/// How long `close()` waits for the goodbye exchange when no read timeout
/// is configured.
const CLOSE_REPLY_TIMEOUT: Duration = Duration::from_secs(2);

/// A connection to a gqrx receiver's remote-control port.
///
/// Constructed via [`GqrxClient::connect`] or
/// [`GqrxBuilder`](crate::builder::GqrxBuilder). The client exclusively owns
/// its transport; call [`close`](Receiver::close) to release it.
pub struct GqrxClient {
    /// The connection, `None` once `close()` has run.
    transport: Option<Box<dyn Transport>>,
    /// Bytes received but not yet consumed as a reply line.
    rx_buf: BytesMut,
    /// Set between sending a command and consuming its reply.
    reply_pending: bool,
    read_timeout: Option<Duration>,
    addr: String,
}

impl GqrxClient {
    /// Connect to the receiver described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for an unusable configuration and
    /// a connection error (`Transport`, `Io`, `Timeout`) if the socket
    /// cannot be established.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let addr = config.addr();
        let transport =
            gqrx_transport::TcpTransport::connect_with_timeout(&addr, config.connect_timeout)
                .await?;
        Ok(Self::with_transport(Box::new(transport), config))
    }

    /// Wrap an already-open transport.
    pub(crate) fn with_transport(transport: Box<dyn Transport>, config: &ClientConfig) -> Self {
        GqrxClient {
            transport: Some(transport),
            rx_buf: BytesMut::with_capacity(READ_CHUNK),
            reply_pending: false,
            read_timeout: config.read_timeout,
            addr: config.addr(),
        }
    }

    /// The `host:port` this client talks to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Whether the connection is still open.
    pub fn is_connected(&self) -> bool {
        self.transport.as_ref().is_some_and(|t| t.is_connected())
    }

    /// Write one encoded command line to the receiver.
    ///
    /// `cmd` must be a complete line including the trailing `\n`, as
    /// produced by the builders in [`commands`]. If the reply to an earlier
    /// command has not been consumed yet, it is read and discarded first.
    pub async fn send_command(&mut self, cmd: &[u8]) -> Result<()> {
        if self.reply_pending {
            let stale = self.read_reply().await?;
            warn!(addr = %self.addr, stale = %stale, "discarded unconsumed reply");
        }

        let transport = self.transport.as_mut().ok_or(Error::NotConnected)?;
        transport.send(cmd).await?;
        self.reply_pending = true;
        Ok(())
    }

    /// Read the next reply line, with trailing whitespace stripped.
    ///
    /// Reads at most [`READ_CHUNK`] bytes per receive and reassembles until
    /// a `\n` arrives. Bytes following the terminator are kept for the
    /// next reply.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionLost`] if the peer closes before a full line.
    /// - [`Error::Timeout`] if a read timeout is configured and expires.
    /// - [`Error::Protocol`] for a line that is not UTF-8 or that exceeds
    ///   [`MAX_REPLY_LEN`] bytes.
    pub async fn read_reply(&mut self) -> Result<String> {
        loop {
            match protocol::decode_line(&self.rx_buf) {
                DecodeResult::Line { text, consumed } => {
                    self.rx_buf.advance(consumed);
                    self.reply_pending = false;
                    // `consumed` counts the terminator.
                    if consumed - 1 > MAX_REPLY_LEN {
                        return Err(Error::Protocol(format!(
                            "reply of {} bytes exceeds {MAX_REPLY_LEN} bytes",
                            consumed - 1
                        )));
                    }
                    trace!(addr = %self.addr, reply = %text, "reply line");
                    return Ok(text);
                }
                DecodeResult::Invalid(consumed) => {
                    self.rx_buf.advance(consumed);
                    self.reply_pending = false;
                    return Err(Error::Protocol("reply is not valid UTF-8".into()));
                }
                DecodeResult::Incomplete => {}
            }

            if self.rx_buf.len() > MAX_REPLY_LEN {
                // The rest of this line is still in flight; leave the reply
                // pending so it gets drained before the next command.
                let len = self.rx_buf.len();
                self.rx_buf.clear();
                return Err(Error::Protocol(format!(
                    "reply exceeds {MAX_REPLY_LEN} bytes without a line terminator ({len} bytes buffered)"
                )));
            }

            let transport = self.transport.as_mut().ok_or(Error::NotConnected)?;
            let mut chunk = [0u8; READ_CHUNK];
            let n = transport.receive(&mut chunk, self.read_timeout).await?;
            self.rx_buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Read the next reply and classify it as a status line.
    ///
    /// Returns `Ok(true)` for `RPRT 0`, `Ok(false)` for `RPRT 1`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] for any other reply.
    pub async fn status(&mut self) -> Result<bool> {
        let reply = self.read_reply().await?;
        protocol::parse_status(&reply)
    }

    /// Send a command that answers with a value and return the reply text.
    async fn query(&mut self, cmd: &[u8]) -> Result<String> {
        self.send_command(cmd).await?;
        self.read_reply().await
    }

    /// Send a command that answers with a status line.
    async fn execute(&mut self, cmd: &[u8]) -> Result<bool> {
        self.send_command(cmd).await?;
        self.status().await
    }

    /// Send `c` and wait (bounded) for the goodbye status.
    ///
    /// The bound also covers draining a reply left over from an abandoned
    /// transaction.
    async fn say_goodbye(&mut self) -> Result<bool> {
        let timeout = self.read_timeout.unwrap_or(CLOSE_REPLY_TIMEOUT);
        let exchange = async {
            self.send_command(&commands::cmd_close()).await?;
            self.status().await
        };
        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout),
        }
    }
}

#[async_trait]
impl Receiver for GqrxClient {
    async fn get_frequency(&mut self) -> Result<u64> {
        let reply = self.query(&commands::cmd_get_frequency()).await?;
        let freq_hz = commands::parse_frequency_response(&reply)?;
        debug!(freq_hz, "read frequency");
        Ok(freq_hz)
    }

    async fn set_frequency(&mut self, freq_hz: u64) -> Result<bool> {
        debug!(freq_hz, "setting frequency");
        self.execute(&commands::cmd_set_frequency(freq_hz)).await
    }

    async fn get_gain(&mut self) -> Result<f64> {
        let reply = self.query(&commands::cmd_get_gain()).await?;
        let gain = commands::parse_level_response("gain", &reply)?;
        debug!(gain, "read audio gain");
        Ok(gain)
    }

    async fn set_gain(&mut self, gain: f64) -> Result<bool> {
        let cmd = commands::cmd_set_gain(gain)?;
        debug!(gain, "setting audio gain");
        self.execute(&cmd).await
    }

    async fn get_demod_mode(&mut self) -> Result<String> {
        let mode = self.query(&commands::cmd_get_demod_mode()).await?;
        debug!(mode = %mode, "read demodulator mode");
        Ok(mode)
    }

    async fn set_demod_mode(&mut self, mode: &str) -> Result<bool> {
        let cmd = commands::cmd_set_demod_mode(mode)?;
        debug!(mode, "setting demodulator mode");
        self.execute(&cmd).await
    }

    async fn get_signal_strength(&mut self) -> Result<f64> {
        let reply = self.query(&commands::cmd_get_signal_strength()).await?;
        let dbfs = commands::parse_level_response("signal strength", &reply)?;
        debug!(dbfs, "read signal strength");
        Ok(dbfs)
    }

    async fn get_squelch(&mut self) -> Result<f64> {
        let reply = self.query(&commands::cmd_get_squelch()).await?;
        let dbfs = commands::parse_level_response("squelch", &reply)?;
        debug!(dbfs, "read squelch");
        Ok(dbfs)
    }

    async fn set_squelch(&mut self, dbfs: f64) -> Result<bool> {
        let cmd = commands::cmd_set_squelch(dbfs)?;
        debug!(dbfs, "setting squelch");
        self.execute(&cmd).await
    }

    async fn get_record_status(&mut self) -> Result<String> {
        let status = self.query(&commands::cmd_get_record_status()).await?;
        debug!(status = %status, "read recorder status");
        Ok(status)
    }

    async fn set_record_status(&mut self, status: &str) -> Result<bool> {
        let cmd = commands::cmd_set_record_status(status)?;
        debug!(status, "setting recorder status");
        self.execute(&cmd).await
    }

    async fn acquire_signal(&mut self) -> Result<bool> {
        debug!("signalling AOS");
        self.execute(&commands::cmd_acquire_signal()).await
    }

    async fn loss_of_signal(&mut self) -> Result<bool> {
        debug!("signalling LOS");
        self.execute(&commands::cmd_loss_of_signal()).await
    }

    async fn close(&mut self) -> Result<()> {
        if self.transport.is_none() {
            return Ok(());
        }

        // The goodbye is best effort: whatever happens, the transport is
        // released below.
        match self.say_goodbye().await {
            Ok(true) => debug!(addr = %self.addr, "receiver acknowledged close"),
            Ok(false) => warn!(addr = %self.addr, "receiver refused close (RPRT 1)"),
            Err(Error::ConnectionLost) => {
                debug!(addr = %self.addr, "receiver hung up before acknowledging close")
            }
            Err(e) => warn!(addr = %self.addr, error = %e, "no clean status for close"),
        }

        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.close().await {
                warn!(addr = %self.addr, error = %e, "transport close failed (continuing anyway)");
            }
        }
        self.rx_buf.clear();
        self.reply_pending = false;
        info!(addr = %self.addr, "disconnected from receiver");
        Ok(())
    }
}

impl Drop for GqrxClient {
    fn drop(&mut self) {
        if self.transport.is_some() {
            debug!(addr = %self.addr, "GqrxClient dropped without close()");
        }
    }
}
