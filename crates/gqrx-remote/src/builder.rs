//! Client configuration and the fluent [`GqrxBuilder`].
//!
//! [`ClientConfig`] is the explicit configuration handed to
//! [`GqrxClient::connect`]: where the receiver listens and how long to wait
//! for it. [`GqrxBuilder`] is a fluent front end over the same settings.
//!
//! # Example
//!
//! ```no_run
//! use gqrx_remote::GqrxBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> gqrx_core::Result<()> {
//! let client = GqrxBuilder::new()
//!     .host("192.168.1.20")
//!     .port(7356)
//!     .read_timeout(Duration::from_secs(2))
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use gqrx_core::error::{Error, Result};
use gqrx_core::transport::Transport;

use crate::client::GqrxClient;

/// Host gqrx listens on when nothing else is configured.
pub const DEFAULT_HOST: &str = "localhost";

/// gqrx's default remote-control TCP port.
pub const DEFAULT_PORT: u16 = 7356;

/// Where to find the receiver and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Host name or address of the receiver.
    pub host: String,
    /// Remote-control TCP port.
    pub port: u16,
    /// Upper bound on establishing the connection.
    pub connect_timeout: Duration,
    /// Upper bound on each read while waiting for a reply.
    ///
    /// `None` (the default) waits indefinitely, so a receiver that stops
    /// answering blocks the caller. When set, expiry surfaces as
    /// [`Error::Timeout`].
    pub read_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: gqrx_transport::tcp::DEFAULT_CONNECT_TIMEOUT,
            read_timeout: None,
        }
    }
}

impl ClientConfig {
    /// The `host:port` address to connect to.
    ///
    /// IPv6 literals are bracketed (`[::1]:7356`).
    pub fn addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Check the configuration before any connection attempt.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::InvalidParameter("host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(Error::InvalidParameter("port must not be 0".into()));
        }
        if self.connect_timeout.is_zero() {
            return Err(Error::InvalidParameter(
                "connect_timeout must be positive".into(),
            ));
        }
        if self.read_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::InvalidParameter(
                "read_timeout must be positive when set".into(),
            ));
        }
        Ok(())
    }
}

/// Fluent builder for [`GqrxClient`].
///
/// Every setting has a default matching gqrx's out-of-the-box remote
/// control (`localhost:7356`, no read timeout), so the simplest usage is:
///
/// ```ignore
/// let client = GqrxBuilder::new().build().await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct GqrxBuilder {
    config: ClientConfig,
}

impl GqrxBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn from_config(config: ClientConfig) -> Self {
        GqrxBuilder { config }
    }

    /// Set the receiver's host name or address.
    pub fn host(mut self, host: &str) -> Self {
        self.config.host = host.to_string();
        self
    }

    /// Set the remote-control TCP port (default: 7356).
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the timeout for establishing the connection (default: 5s).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Bound each read while waiting for a reply (default: unbounded).
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = Some(timeout);
        self
    }

    /// The configuration assembled so far.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build a [`GqrxClient`] with a caller-provided transport.
    ///
    /// This is the entry point for tests (pass a `MockTransport` from
    /// `gqrx-test-harness`) and for callers that manage the transport
    /// lifecycle themselves. Host and port are used for logging only.
    pub fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<GqrxClient> {
        self.config.validate()?;
        Ok(GqrxClient::with_transport(transport, &self.config))
    }

    /// Connect to the configured receiver over TCP.
    pub async fn build(self) -> Result<GqrxClient> {
        GqrxClient::connect(&self.config).await
    }
}
