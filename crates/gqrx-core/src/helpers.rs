//! Formatting and parsing helpers for frequencies.

/// Format a frequency in hertz as a human-readable MHz string.
///
/// # Example
///
/// ```
/// use gqrx_core::format_freq_mhz;
///
/// assert_eq!(format_freq_mhz(432_100_000), "432.100000 MHz");
/// ```
pub fn format_freq_mhz(freq_hz: u64) -> String {
    let mhz = freq_hz as f64 / 1_000_000.0;
    format!("{mhz:.6} MHz")
}

/// Parse a frequency given on a command line into hertz.
///
/// Accepts plain hertz (`430000000`), scientific notation (`430e6`), and
/// `k`/`M`/`G` suffixes (`430M`, `12.5k`). The result must be a whole,
/// non-negative number of hertz.
///
/// # Example
///
/// ```
/// use gqrx_core::parse_freq_hz;
///
/// assert_eq!(parse_freq_hz("420e6"), Ok(420_000_000));
/// assert_eq!(parse_freq_hz("146.52M"), Ok(146_520_000));
/// assert_eq!(parse_freq_hz("12.5k"), Ok(12_500));
/// assert!(parse_freq_hz("-1").is_err());
/// ```
pub fn parse_freq_hz(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim();
    if let Ok(hz) = s.parse::<u64>() {
        return Ok(hz);
    }

    let (number, multiplier) = match s.char_indices().last() {
        Some((i, 'k' | 'K')) => (&s[..i], 1e3),
        Some((i, 'M')) => (&s[..i], 1e6),
        Some((i, 'G' | 'g')) => (&s[..i], 1e9),
        _ => (s, 1.0),
    };

    let value = number
        .parse::<f64>()
        .map_err(|_| format!("invalid frequency: '{s}'"))?
        * multiplier;

    if !value.is_finite() || value < 0.0 || value >= u64::MAX as f64 {
        return Err(format!("frequency out of range: '{s}'"));
    }
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 {
        return Err(format!("frequency must be a whole number of hertz: '{s}'"));
    }
    Ok(rounded as u64)
}
