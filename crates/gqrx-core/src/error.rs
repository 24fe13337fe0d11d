//! Error types for the gqrx client.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. Connection-level failures and protocol
//! violations are kept apart so callers can decide whether reconnecting
//! makes sense; see [`Error::is_connection_error`] and
//! [`Error::is_protocol_error`].

/// The error type for all gqrx client operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The connection could not be established (e.g. refused).
    #[error("transport error: {0}")]
    Transport(String),

    /// A reply did not match the shape expected for the command issued:
    /// a non-numeric value where a number was expected, or a status line
    /// other than `RPRT 0` / `RPRT 1`.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A connect or read deadline expired.
    ///
    /// Reads carry no deadline unless one is configured, so this only
    /// shows up when the caller opted into a read timeout.
    #[error("timeout waiting for response")]
    Timeout,

    /// An argument was rejected locally, before anything was sent.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The connection has already been closed.
    #[error("not connected")]
    NotConnected,

    /// The receiver closed or reset the connection mid-exchange.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A failure inside a multi-step operation, tagged with the step that
    /// failed. Classifies like its cause.
    #[error("{op} failed")]
    Operation {
        op: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Whether this error is a connection failure: establishing, writing to,
    /// or reading from the socket failed, or the peer went away.
    ///
    /// These are never retried internally; the caller decides whether to
    /// reconnect.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self.root_cause(),
            Error::Transport(_)
                | Error::Timeout
                | Error::NotConnected
                | Error::ConnectionLost
                | Error::Io(_)
        )
    }

    /// Whether this error is a protocol violation by the receiver.
    pub fn is_protocol_error(&self) -> bool {
        matches!(self.root_cause(), Error::Protocol(_))
    }

    /// Tag this error with the step of an operation that produced it.
    pub fn during(self, op: &'static str) -> Self {
        Error::Operation {
            op,
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through [`Error::Operation`] tags.
    pub fn root_cause(&self) -> &Error {
        let mut err = self;
        while let Error::Operation { source, .. } = err {
            err = &**source;
        }
        err
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
