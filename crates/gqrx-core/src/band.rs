//! Band presets for scanning.
//!
//! Provides a [`Band`] enum covering the VHF/UHF amateur bands the scanner
//! is typically pointed at, with their edges as an inclusive [`BandRange`].
//!
//! # Example
//!
//! ```
//! use gqrx_core::Band;
//!
//! let band: Band = "70cm".parse().unwrap();
//! assert_eq!(band.freq_range().low_hz, 420_000_000);
//! assert_eq!(band.to_string(), "70cm");
//! assert_eq!(Band::from_freq(146_520_000), Some(Band::Band2m));
//! ```

use std::fmt;
use std::str::FromStr;

/// An inclusive frequency range in hertz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BandRange {
    /// Lower bound of the range in hertz (inclusive).
    pub low_hz: u64,
    /// Upper bound of the range in hertz (inclusive).
    pub high_hz: u64,
}

impl BandRange {
    /// Create a new band range.
    pub fn new(low_hz: u64, high_hz: u64) -> Self {
        BandRange { low_hz, high_hz }
    }

    /// Check whether a frequency (in hertz) falls within this range (inclusive).
    pub fn contains(&self, freq_hz: u64) -> bool {
        freq_hz >= self.low_hz && freq_hz <= self.high_hz
    }
}

impl fmt::Display for BandRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} Hz", self.low_hz, self.high_hz)
    }
}

/// Amateur band preset.
///
/// Band edges follow ITU Region 2 allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    /// 2 meters (144.0–148.0 MHz).
    Band2m,
    /// 1.25 meters (220.0–225.0 MHz).
    Band125cm,
    /// 70 centimeters (420.0–450.0 MHz).
    Band70cm,
}

/// All bands in frequency order, lowest first.
const ALL_BANDS: &[Band] = &[Band::Band2m, Band::Band125cm, Band::Band70cm];

impl Band {
    /// Returns the band containing the given frequency, or `None` if the
    /// frequency does not fall within any preset.
    pub fn from_freq(freq_hz: u64) -> Option<Band> {
        ALL_BANDS
            .iter()
            .copied()
            .find(|band| band.freq_range().contains(freq_hz))
    }

    /// Returns the frequency range (lower and upper edges) for this band.
    pub fn freq_range(&self) -> BandRange {
        match self {
            Band::Band2m => BandRange::new(144_000_000, 148_000_000),
            Band::Band125cm => BandRange::new(220_000_000, 225_000_000),
            Band::Band70cm => BandRange::new(420_000_000, 450_000_000),
        }
    }

    /// Returns the short band name (e.g. "2m", "70cm").
    pub fn name(&self) -> &'static str {
        match self {
            Band::Band2m => "2m",
            Band::Band125cm => "1.25m",
            Band::Band70cm => "70cm",
        }
    }

    /// Returns a slice of all bands in frequency order (lowest first).
    pub fn all() -> &'static [Band] {
        ALL_BANDS
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when a string cannot be parsed into a [`Band`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBandError(String);

impl fmt::Display for ParseBandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown band: '{}'", self.0)
    }
}

impl std::error::Error for ParseBandError {}

impl FromStr for Band {
    type Err = ParseBandError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "2m" | "2" => Ok(Band::Band2m),
            "1.25m" | "125cm" | "1.25" => Ok(Band::Band125cm),
            "70cm" | "70" => Ok(Band::Band70cm),
            _ => Err(ParseBandError(s.to_string())),
        }
    }
}
