//! gqrx remote-control line protocol encoder/decoder.
//!
//! The protocol is a small subset of the Hamlib `rigctld` text protocol.
//! Every command is one ASCII line and every command produces exactly one
//! reply line.
//!
//! # Command format
//!
//! ```text
//! <verb>[ <arg>]*\n
//! ```
//!
//! - `verb`: a command letter or word (`f`, `F`, `l`, `L`, `AOS`, ...).
//! - `arg`: zero or more space-separated ASCII arguments.
//! - Terminator: `\n` (0x0A).
//!
//! # Reply format
//!
//! Either a bare value (`430000000`, `-38.5`, `WFM`) or a status line
//! `RPRT 0` (success) / `RPRT 1` (failure), terminated by `\n`. The caller
//! knows from the command it sent which of the two shapes to expect.

use bytes::{BufMut, BytesMut};

use gqrx_core::error::{Error, Result};

/// Line terminator for commands and replies.
pub const TERMINATOR: u8 = b'\n';

/// Upper bound on the bytes requested from the transport per receive call.
///
/// Replies are reassembled on [`TERMINATOR`] across as many receives as it
/// takes, so this only bounds the size of a single read.
pub const READ_CHUNK: usize = 64;

/// Longest reply line accepted, excluding the terminator.
///
/// Real replies are a few bytes long; anything growing past this without a
/// terminator is treated as a protocol violation rather than buffered
/// without limit.
pub const MAX_REPLY_LEN: usize = 1024;

/// Status reply signalling success.
pub const STATUS_OK: &str = "RPRT 0";

/// Status reply signalling failure.
pub const STATUS_FAILED: &str = "RPRT 1";

/// Result of attempting to decode one reply line from a byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    /// A complete line was decoded.
    Line {
        /// Line text with trailing whitespace (including `\r`) stripped.
        text: String,
        /// Number of bytes consumed from the input buffer, terminator included.
        consumed: usize,
    },

    /// A complete line was found but it is not valid UTF-8.
    ///
    /// The `usize` is the number of bytes consumed from the input buffer.
    Invalid(usize),

    /// The buffer does not yet contain a complete line.
    Incomplete,
}

/// Encode a command into raw bytes ready for transmission.
///
/// Joins the verb and arguments with single spaces and appends the
/// terminator.
///
/// # Example
///
/// ```
/// use gqrx_remote::protocol::encode_command;
///
/// assert_eq!(encode_command("f", &[]), b"f\n");
/// assert_eq!(encode_command("L", &["SQL", "-40"]), b"L SQL -40\n");
/// ```
pub fn encode_command(verb: &str, args: &[&str]) -> Vec<u8> {
    let capacity = verb.len() + args.iter().map(|a| a.len() + 1).sum::<usize>() + 1;
    let mut buf = BytesMut::with_capacity(capacity);
    buf.put_slice(verb.as_bytes());
    for arg in args {
        buf.put_u8(b' ');
        buf.put_slice(arg.as_bytes());
    }
    buf.put_u8(TERMINATOR);
    buf.to_vec()
}

/// Attempt to decode one reply line from a byte buffer.
///
/// Scans `buf` for the `\n` terminator. Returns [`DecodeResult::Line`] with
/// the number of bytes consumed, [`DecodeResult::Invalid`] if the line is
/// not valid UTF-8, or [`DecodeResult::Incomplete`] if no terminator has
/// arrived yet. Bytes after the first terminator are left for the caller.
///
/// # Example
///
/// ```
/// use gqrx_remote::protocol::{decode_line, DecodeResult};
///
/// match decode_line(b"RPRT 0\n") {
///     DecodeResult::Line { text, consumed } => {
///         assert_eq!(text, "RPRT 0");
///         assert_eq!(consumed, 7);
///     }
///     _ => panic!("expected Line"),
/// }
/// ```
pub fn decode_line(buf: &[u8]) -> DecodeResult {
    let term_pos = match buf.iter().position(|&b| b == TERMINATOR) {
        Some(pos) => pos,
        None => return DecodeResult::Incomplete,
    };

    let consumed = term_pos + 1;
    match std::str::from_utf8(&buf[..term_pos]) {
        Ok(line) => DecodeResult::Line {
            text: line.trim_end().to_string(),
            consumed,
        },
        Err(_) => DecodeResult::Invalid(consumed),
    }
}

/// Classify a status reply.
///
/// Exactly `RPRT 0` is success and exactly `RPRT 1` is failure. Everything
/// else, including an empty line or another code, is a protocol violation.
///
/// # Example
///
/// ```
/// use gqrx_remote::protocol::parse_status;
///
/// assert!(parse_status("RPRT 0").unwrap());
/// assert!(!parse_status("RPRT 1").unwrap());
/// assert!(parse_status("RPRT 2").is_err());
/// ```
pub fn parse_status(text: &str) -> Result<bool> {
    match text {
        STATUS_OK => Ok(true),
        STATUS_FAILED => Ok(false),
        other => Err(Error::Protocol(format!(
            "expected status line, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---------------------------------------------------------------
    // Command encoding
    // ---------------------------------------------------------------

    #[test]
    fn encode_bare_verb() {
        assert_eq!(encode_command("f", &[]), b"f\n");
        assert_eq!(encode_command("AOS", &[]), b"AOS\n");
    }

    #[test]
    fn encode_with_arguments() {
        assert_eq!(encode_command("F", &["430000000"]), b"F 430000000\n");
        assert_eq!(encode_command("U", &["RECORD", "1"]), b"U RECORD 1\n");
    }

    // ---------------------------------------------------------------
    // Line decoding
    // ---------------------------------------------------------------

    #[test]
    fn decode_empty_buffer() {
        assert_eq!(decode_line(b""), DecodeResult::Incomplete);
    }

    #[test]
    fn decode_no_terminator() {
        assert_eq!(decode_line(b"43000"), DecodeResult::Incomplete);
    }

    #[test]
    fn decode_value_line() {
        assert_eq!(
            decode_line(b"430000000\n"),
            DecodeResult::Line {
                text: "430000000".into(),
                consumed: 10,
            }
        );
    }

    #[test]
    fn decode_strips_trailing_whitespace() {
        assert_eq!(
            decode_line(b"-38.5 \r\n"),
            DecodeResult::Line {
                text: "-38.5".into(),
                consumed: 8,
            }
        );
    }

    #[test]
    fn decode_empty_line() {
        assert_eq!(
            decode_line(b"\n"),
            DecodeResult::Line {
                text: "".into(),
                consumed: 1,
            }
        );
    }

    #[test]
    fn decode_leaves_following_bytes() {
        let buf = b"RPRT 0\nWFM\n";
        assert_eq!(
            decode_line(buf),
            DecodeResult::Line {
                text: "RPRT 0".into(),
                consumed: 7,
            }
        );
        assert_eq!(
            decode_line(&buf[7..]),
            DecodeResult::Line {
                text: "WFM".into(),
                consumed: 4,
            }
        );
    }

    #[test]
    fn decode_non_utf8_is_invalid() {
        let buf = [0xFF, 0xFE, b'\n', b'1'];
        assert_eq!(decode_line(&buf), DecodeResult::Invalid(3));
    }

    // ---------------------------------------------------------------
    // Status grammar
    // ---------------------------------------------------------------

    #[test]
    fn status_success_and_failure() {
        assert!(parse_status("RPRT 0").unwrap());
        assert!(!parse_status("RPRT 1").unwrap());
    }

    #[test]
    fn status_rejects_everything_else() {
        for text in ["", "RPRT 2", "RPRT", "RPRT 0 ", "rprt 0", "0", "RPRT -1"] {
            let err = parse_status(text).unwrap_err();
            assert!(err.is_protocol_error(), "{text:?} gave {err:?}");
        }
    }
}
