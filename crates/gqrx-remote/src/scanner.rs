//! Band scanner -- steps a receiver across a band and reports strong signals.
//!
//! Each iteration reads the tuned frequency, advances it by a fixed step
//! (wrapping back to the bottom of the band past the top), tunes there, and
//! samples the signal strength. Readings above the threshold are emitted as
//! [`Observation`]s through a caller-supplied callback, followed by a pause
//! so the operator gets a chance to listen.
//!
//! The scanner runs until its [`CancellationToken`] fires or the receiver
//! returns an error. Cancellation is observed between iterations, while
//! waiting on a reply, and during the post-hit pause. Commands are single
//! short writes, so a cancelled iteration leaves at most an unread reply
//! behind, which [`GqrxClient`](crate::client::GqrxClient) drains before its
//! next command.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local, SecondsFormat};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use gqrx_core::band::Band;
use gqrx_core::error::{Error, Result};
use gqrx_core::helpers::format_freq_mhz;
use gqrx_core::receiver::Receiver;

/// Default frequency step: 1 kHz.
pub const DEFAULT_STEP_HZ: u64 = 1_000;

/// Default hit threshold in dBFS.
pub const DEFAULT_THRESHOLD_DB: f64 = -40.0;

/// Default pause after a hit.
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(1);

/// Parameters for one scan run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Bottom of the band, in hertz. Also the wrap target.
    pub low_hz: u64,
    /// Top of the band, in hertz (inclusive).
    pub high_hz: u64,
    /// Distance between successive frequencies, in hertz.
    pub step_hz: u64,
    /// A reading strictly above this level (dBFS) is a hit.
    pub threshold_db: f64,
    /// How long to stay on a frequency after a hit.
    pub pause: Duration,
}

impl ScanConfig {
    /// A config for `low_hz..=high_hz` with the default step, threshold and pause.
    pub fn new(low_hz: u64, high_hz: u64) -> Self {
        ScanConfig {
            low_hz,
            high_hz,
            step_hz: DEFAULT_STEP_HZ,
            threshold_db: DEFAULT_THRESHOLD_DB,
            pause: DEFAULT_PAUSE,
        }
    }

    /// A config covering a band preset.
    pub fn for_band(band: Band) -> Self {
        let range = band.freq_range();
        Self::new(range.low_hz, range.high_hz)
    }

    pub fn step_hz(mut self, step_hz: u64) -> Self {
        self.step_hz = step_hz;
        self
    }

    pub fn threshold_db(mut self, threshold_db: f64) -> Self {
        self.threshold_db = threshold_db;
        self
    }

    pub fn pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Reject configurations the scan loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.low_hz > self.high_hz {
            return Err(Error::InvalidParameter(format!(
                "scan range is inverted: low {} Hz > high {} Hz",
                self.low_hz, self.high_hz
            )));
        }
        if self.step_hz == 0 {
            return Err(Error::InvalidParameter("scan step must be positive".into()));
        }
        if !self.threshold_db.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "threshold must be a finite number, got {}",
                self.threshold_db
            )));
        }
        Ok(())
    }
}

impl Default for ScanConfig {
    /// The 70 cm band, which the scanner covers when nothing else is asked for.
    fn default() -> Self {
        Self::for_band(Band::Band70cm)
    }
}

/// A reading above the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Local wall-clock time the reading was taken.
    pub timestamp: DateTime<Local>,
    /// Frequency the receiver was tuned to, in hertz.
    pub freq_hz: u64,
    /// Measured signal strength in dBFS.
    pub strength_db: f64,
}

impl fmt::Display for Observation {
    /// `<rfc3339 timestamp> <freq_hz> <strength_db>`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, false),
            self.freq_hz,
            self.strength_db
        )
    }
}

/// Totals for a finished (cancelled) scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Completed iterations.
    pub iterations: u64,
    /// Observations emitted.
    pub hits: u64,
}

/// The frequency to tune after `current`.
///
/// `current + step`, or `low_hz` when that would leave the band in either
/// direction. Wrapping, not reflecting: the sweep always moves upward.
pub fn next_frequency(current: u64, config: &ScanConfig) -> u64 {
    let next = current.saturating_add(config.step_hz);
    if next > config.high_hz || next < config.low_hz {
        config.low_hz
    } else {
        next
    }
}

fn step_failed(op: &'static str) -> impl FnOnce(Error) -> Error {
    move |e| {
        error!(error = %e, op, "scan step failed");
        e.during(op)
    }
}

/// Sweeps a receiver across a [`ScanConfig`].
#[derive(Debug, Clone)]
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    /// Create a scanner, validating the configuration.
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Scanner { config })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Run one iteration: step, tune, measure.
    ///
    /// Returns the [`Observation`] if the reading is above the threshold.
    /// A refused tune (`RPRT 1`) is logged and the measurement still taken.
    /// Receiver errors come back as [`Error::Operation`] naming the command
    /// that failed.
    pub async fn step<R: Receiver + ?Sized>(&self, receiver: &mut R) -> Result<Option<Observation>> {
        let current = receiver
            .get_frequency()
            .await
            .map_err(step_failed("get_frequency"))?;

        let next = next_frequency(current, &self.config);

        let accepted = receiver
            .set_frequency(next)
            .await
            .map_err(step_failed("set_frequency"))?;
        if !accepted {
            warn!(freq_hz = next, "receiver refused frequency");
        }

        let strength_db = receiver
            .get_signal_strength()
            .await
            .map_err(step_failed("get_signal_strength"))?;

        debug!(freq_hz = next, strength_db, "scan sample");

        if strength_db > self.config.threshold_db {
            Ok(Some(Observation {
                timestamp: Local::now(),
                freq_hz: next,
                strength_db,
            }))
        } else {
            Ok(None)
        }
    }

    /// Scan until `cancel` fires, passing every hit to `on_hit`.
    ///
    /// Returns the run's totals on cancellation. Any receiver error ends the
    /// scan and is returned tagged with the failing step (see
    /// [`step`](Self::step)); the connection is not closed.
    pub async fn run<R, F>(
        &self,
        receiver: &mut R,
        cancel: &CancellationToken,
        mut on_hit: F,
    ) -> Result<ScanSummary>
    where
        R: Receiver + ?Sized,
        F: FnMut(&Observation),
    {
        info!(
            low = %format_freq_mhz(self.config.low_hz),
            high = %format_freq_mhz(self.config.high_hz),
            step_hz = self.config.step_hz,
            threshold_db = self.config.threshold_db,
            "scan started"
        );

        let mut summary = ScanSummary::default();
        while !cancel.is_cancelled() {
            // Cancellation may land while a reply is outstanding; the client
            // discards that reply before its next command.
            let hit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                hit = self.step(receiver) => hit?,
            };
            summary.iterations += 1;

            let Some(observation) = hit else {
                continue;
            };
            summary.hits += 1;
            info!(
                freq = %format_freq_mhz(observation.freq_hz),
                strength_db = observation.strength_db,
                "signal above threshold"
            );
            on_hit(&observation);

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.pause) => {}
            }
        }

        info!(
            iterations = summary.iterations,
            hits = summary.hits,
            "scan cancelled"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gqrx_test_harness::MockTransport;
    use tokio::time::Instant;

    use crate::builder::GqrxBuilder;
    use crate::client::GqrxClient;

    fn band_70cm() -> ScanConfig {
        ScanConfig::new(420_000_000, 450_000_000)
    }

    fn client_with(mock: MockTransport) -> GqrxClient {
        GqrxBuilder::new()
            .build_with_transport(Box::new(mock))
            .unwrap()
    }

    /// Script one scan iteration on the mock.
    fn expect_iteration(mock: &mut MockTransport, current: u64, next: u64, strength: &str) {
        mock.expect(b"f\n", format!("{current}\n").as_bytes());
        mock.expect(format!("F {next}\n").as_bytes(), b"RPRT 0\n");
        mock.expect(b"l STRENGTH\n", format!("{strength}\n").as_bytes());
    }

    // ---------------------------------------------------------------
    // Stepping rule
    // ---------------------------------------------------------------

    #[test]
    fn next_frequency_advances_within_band() {
        assert_eq!(next_frequency(430_000_000, &band_70cm()), 430_001_000);
    }

    #[test]
    fn next_frequency_wraps_past_top() {
        assert_eq!(next_frequency(450_000_000, &band_70cm()), 420_000_000);
        assert_eq!(next_frequency(449_999_500, &band_70cm()), 420_000_000);
    }

    #[test]
    fn next_frequency_lands_on_top_edge() {
        assert_eq!(next_frequency(449_999_000, &band_70cm()), 450_000_000);
    }

    #[test]
    fn next_frequency_from_below_band_wraps_to_low() {
        assert_eq!(next_frequency(100_000_000, &band_70cm()), 420_000_000);
    }

    #[test]
    fn next_frequency_saturates() {
        let config = ScanConfig::new(0, u64::MAX).step_hz(10);
        assert_eq!(next_frequency(u64::MAX - 5, &config), u64::MAX);
    }

    #[test]
    fn single_frequency_band_stays_put() {
        let config = ScanConfig::new(145_500_000, 145_500_000);
        assert_eq!(next_frequency(145_500_000, &config), 145_500_000);
    }

    // ---------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------

    #[test]
    fn config_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.low_hz, 420_000_000);
        assert_eq!(config.high_hz, 450_000_000);
        assert_eq!(config.step_hz, 1_000);
        assert_eq!(config.threshold_db, -40.0);
        assert_eq!(config.pause, Duration::from_secs(1));
    }

    #[test]
    fn config_for_band() {
        let config = ScanConfig::for_band(Band::Band2m);
        assert_eq!((config.low_hz, config.high_hz), (144_000_000, 148_000_000));
    }

    #[test]
    fn config_validation() {
        assert!(Scanner::new(ScanConfig::new(450_000_000, 420_000_000)).is_err());
        assert!(Scanner::new(band_70cm().step_hz(0)).is_err());
        assert!(Scanner::new(band_70cm().threshold_db(f64::NAN)).is_err());
        assert!(Scanner::new(band_70cm()).is_ok());
    }

    #[test]
    fn observation_display() {
        let observation = Observation {
            timestamp: Local::now(),
            freq_hz: 430_001_000,
            strength_db: -35.5,
        };
        let text = observation.to_string();
        assert!(text.ends_with(" 430001000 -35.5"), "{text}");
        let stamp = text.split(' ').next().unwrap();
        assert!(DateTime::parse_from_rfc3339(stamp).is_ok(), "{stamp}");
    }

    // ---------------------------------------------------------------
    // Single iterations
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn step_hit() {
        let mut mock = MockTransport::new();
        expect_iteration(&mut mock, 430_000_000, 430_001_000, "-35.0");
        let mut client = client_with(mock);

        let scanner = Scanner::new(band_70cm()).unwrap();
        let observation = scanner.step(&mut client).await.unwrap().unwrap();
        assert_eq!(observation.freq_hz, 430_001_000);
        assert_eq!(observation.strength_db, -35.0);
    }

    #[tokio::test]
    async fn step_miss() {
        let mut mock = MockTransport::new();
        expect_iteration(&mut mock, 430_000_000, 430_001_000, "-45.0");
        let mut client = client_with(mock);

        let scanner = Scanner::new(band_70cm()).unwrap();
        assert!(scanner.step(&mut client).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn step_at_threshold_is_not_a_hit() {
        let mut mock = MockTransport::new();
        expect_iteration(&mut mock, 430_000_000, 430_001_000, "-40.0");
        let mut client = client_with(mock);

        let scanner = Scanner::new(band_70cm()).unwrap();
        assert!(scanner.step(&mut client).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn step_wraps_at_top_of_band() {
        let mut mock = MockTransport::new();
        expect_iteration(&mut mock, 450_000_000, 420_000_000, "-80.0");
        let mut client = client_with(mock);

        let scanner = Scanner::new(band_70cm()).unwrap();
        assert!(scanner.step(&mut client).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn step_continues_after_refused_tune() {
        let mut mock = MockTransport::new();
        mock.expect(b"f\n", b"430000000\n");
        mock.expect(b"F 430001000\n", b"RPRT 1\n");
        mock.expect(b"l STRENGTH\n", b"-20.0\n");
        let mut client = client_with(mock);

        let scanner = Scanner::new(band_70cm()).unwrap();
        let observation = scanner.step(&mut client).await.unwrap().unwrap();
        assert_eq!(observation.freq_hz, 430_001_000);
    }

    #[tokio::test]
    async fn step_propagates_protocol_error() {
        let mut mock = MockTransport::new();
        mock.expect(b"f\n", b"430000000\n");
        mock.expect(b"F 430001000\n", b"RPRT 7\n");
        let mut client = client_with(mock);

        let scanner = Scanner::new(band_70cm()).unwrap();
        let err = scanner.step(&mut client).await.unwrap_err();
        assert!(err.is_protocol_error());
        assert!(matches!(err, Error::Operation { op: "set_frequency", .. }));
    }

    // ---------------------------------------------------------------
    // Run loop
    // ---------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn run_pauses_after_hit() {
        let mut mock = MockTransport::new();
        expect_iteration(&mut mock, 430_000_000, 430_001_000, "-35.0");
        expect_iteration(&mut mock, 430_001_000, 430_002_000, "-30.0");
        let mut client = client_with(mock);

        let scanner = Scanner::new(band_70cm()).unwrap();
        let cancel = CancellationToken::new();
        let mut seen = Vec::new();
        let started = Instant::now();

        let summary = scanner
            .run(&mut client, &cancel, |obs| {
                seen.push((obs.freq_hz, obs.strength_db));
                if seen.len() == 2 {
                    cancel.cancel();
                }
            })
            .await
            .unwrap();

        // One full pause after the first hit; the second is cut short.
        let elapsed = started.elapsed();
        assert!(elapsed >= DEFAULT_PAUSE, "{elapsed:?}");
        assert!(elapsed < DEFAULT_PAUSE * 2, "{elapsed:?}");
        assert_eq!(seen, vec![(430_001_000, -35.0), (430_002_000, -30.0)]);
        assert_eq!(summary, ScanSummary { iterations: 2, hits: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn run_does_not_pause_on_miss() {
        let mut mock = MockTransport::new();
        expect_iteration(&mut mock, 430_000_000, 430_001_000, "-45.0");
        expect_iteration(&mut mock, 430_001_000, 430_002_000, "-30.0");
        let mut client = client_with(mock);

        let scanner = Scanner::new(band_70cm()).unwrap();
        let cancel = CancellationToken::new();
        let mut hits = 0;
        let started = Instant::now();

        let summary = scanner
            .run(&mut client, &cancel, |_| {
                hits += 1;
                cancel.cancel();
            })
            .await
            .unwrap();

        assert!(started.elapsed() < DEFAULT_PAUSE);
        assert_eq!(hits, 1);
        assert_eq!(summary, ScanSummary { iterations: 2, hits: 1 });
    }

    #[tokio::test]
    async fn run_cancelled_before_start_sends_nothing() {
        let mock = MockTransport::new();
        let mut client = client_with(mock);

        let scanner = Scanner::new(band_70cm()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = scanner
            .run(&mut client, &cancel, |_| panic!("no hits expected"))
            .await
            .unwrap();
        assert_eq!(summary, ScanSummary::default());
    }

    #[tokio::test]
    async fn run_propagates_connection_loss() {
        let mut mock = MockTransport::new();
        expect_iteration(&mut mock, 430_000_000, 430_001_000, "-90.0");
        mock.expect(b"f\n", b"430001000\n");
        mock.expect_hangup(b"F 430002000\n");
        let mut client = client_with(mock);

        let scanner = Scanner::new(band_70cm()).unwrap();
        let cancel = CancellationToken::new();
        let err = scanner.run(&mut client, &cancel, |_| {}).await.unwrap_err();
        assert!(matches!(err, Error::Operation { op: "set_frequency", .. }));
        assert!(matches!(err.root_cause(), Error::ConnectionLost));
        assert!(!cancel.is_cancelled());
    }
}
