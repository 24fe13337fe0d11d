//! gqrx command builders and reply parsers.
//!
//! This module provides functions to construct the command lines for every
//! supported operation and to parse the value replies that come back.
//!
//! All functions are pure -- they produce or consume byte vectors / string
//! slices without performing any I/O. [`GqrxClient`](crate::client::GqrxClient)
//! sends the bytes and feeds the reply text back into the parsers.
//!
//! # Command reference
//!
//! | Command            | Reply            |
//! |--------------------|------------------|
//! | `f`                | integer hertz    |
//! | `F <hz>`           | status line      |
//! | `l AF`             | float            |
//! | `L AF <value>`     | status line      |
//! | `m`                | mode token       |
//! | `M <mode>`         | status line      |
//! | `l STRENGTH`       | float dBFS       |
//! | `l SQL`            | float dBFS       |
//! | `L SQL <dbfs>`     | status line      |
//! | `u RECORD`         | token            |
//! | `U RECORD <token>` | status line      |
//! | `c`                | status line      |
//! | `AOS`              | status line      |
//! | `LOS`              | status line      |

use gqrx_core::{Error, Result};

use crate::protocol::encode_command;

// ---------------------------------------------------------------
// Command builders
// ---------------------------------------------------------------

/// Build a "read frequency" command (`f`).
pub fn cmd_get_frequency() -> Vec<u8> {
    encode_command("f", &[])
}

/// Build a "set frequency" command (`F <hz>`).
///
/// The frequency is sent as a plain base-10 integer in hertz.
pub fn cmd_set_frequency(freq_hz: u64) -> Vec<u8> {
    encode_command("F", &[&freq_hz.to_string()])
}

/// Build a "read audio gain" command (`l AF`).
pub fn cmd_get_gain() -> Vec<u8> {
    encode_command("l", &["AF"])
}

/// Build a "set audio gain" command (`L AF <value>`).
///
/// The value is written with six decimal places (`L AF -10.500000`).
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] for NaN or infinite values.
pub fn cmd_set_gain(gain: f64) -> Result<Vec<u8>> {
    check_finite("gain", gain)?;
    Ok(encode_command("L", &["AF", &format!("{gain:.6}")]))
}

/// Build a "read demodulator mode" command (`m`).
pub fn cmd_get_demod_mode() -> Vec<u8> {
    encode_command("m", &[])
}

/// Build a "set demodulator mode" command (`M <mode>`).
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] if `mode` is not a single token.
pub fn cmd_set_demod_mode(mode: &str) -> Result<Vec<u8>> {
    validate_token("mode", mode)?;
    Ok(encode_command("M", &[mode]))
}

/// Build a "read signal strength" command (`l STRENGTH`).
pub fn cmd_get_signal_strength() -> Vec<u8> {
    encode_command("l", &["STRENGTH"])
}

/// Build a "read squelch threshold" command (`l SQL`).
pub fn cmd_get_squelch() -> Vec<u8> {
    encode_command("l", &["SQL"])
}

/// Build a "set squelch threshold" command (`L SQL <dbfs>`).
///
/// The level uses the shortest representation that round-trips
/// (`L SQL -40`, `L SQL -52.5`).
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] for NaN or infinite values.
pub fn cmd_set_squelch(dbfs: f64) -> Result<Vec<u8>> {
    check_finite("squelch", dbfs)?;
    Ok(encode_command("L", &["SQL", &dbfs.to_string()]))
}

/// Build a "read recorder status" command (`u RECORD`).
pub fn cmd_get_record_status() -> Vec<u8> {
    encode_command("u", &["RECORD"])
}

/// Build a "set recorder status" command (`U RECORD <token>`).
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] if `status` is not a single token.
pub fn cmd_set_record_status(status: &str) -> Result<Vec<u8>> {
    validate_token("record status", status)?;
    Ok(encode_command("U", &["RECORD", status]))
}

/// Build an "acquisition of signal" command (`AOS`).
pub fn cmd_acquire_signal() -> Vec<u8> {
    encode_command("AOS", &[])
}

/// Build a "loss of signal" command (`LOS`).
pub fn cmd_loss_of_signal() -> Vec<u8> {
    encode_command("LOS", &[])
}

/// Build a "close connection" command (`c`).
pub fn cmd_close() -> Vec<u8> {
    encode_command("c", &[])
}

// ---------------------------------------------------------------
// Reply parsers
// ---------------------------------------------------------------

/// Parse a frequency reply (`430000000`) into hertz.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the reply is empty, negative, or not a
/// base-10 integer.
pub fn parse_frequency_response(data: &str) -> Result<u64> {
    data.parse::<u64>()
        .map_err(|e| Error::Protocol(format!("invalid frequency reply {data:?} ({e})")))
}

/// Parse a level reply (gain, squelch, or signal strength) as a float.
///
/// `what` names the quantity for the error message.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the reply is empty or not a number.
pub fn parse_level_response(what: &str, data: &str) -> Result<f64> {
    data.parse::<f64>()
        .map_err(|e| Error::Protocol(format!("invalid {what} reply {data:?} ({e})")))
}

// ---------------------------------------------------------------
// Argument checks
// ---------------------------------------------------------------

/// Check that a token argument is a single non-empty word.
///
/// Whitespace or control characters would split the command line or start
/// a second command, breaking the one-reply-per-command pairing.
pub fn validate_token(what: &str, token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(Error::InvalidParameter(format!("{what} must not be empty")));
    }
    if token
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || !c.is_ascii())
    {
        return Err(Error::InvalidParameter(format!(
            "{what} must be a single ASCII word, got {token:?}"
        )));
    }
    Ok(())
}

fn check_finite(what: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "{what} must be a finite number, got {value}"
        )))
    }
}
