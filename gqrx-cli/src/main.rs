// gqrx-cli -- command-line remote control and band scanner for a gqrx
// receiver with remote control enabled (Tools > Remote control).
//
// Usage:
//   gqrx-cli freq get
//   gqrx-cli --host 192.168.1.20 freq set 145.5M
//   gqrx-cli squelch set -60
//   gqrx-cli scan                       (70cm, 1 kHz steps, -40 dBFS)
//   gqrx-cli scan --band 2m --threshold -50 --pause 2
//   gqrx-cli scan --low 446M --high 446.2M --step 12.5k
//
// Logging goes to stderr and honours RUST_LOG; --log-level is the fallback.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gqrx::scanner::{DEFAULT_PAUSE, DEFAULT_STEP_HZ, DEFAULT_THRESHOLD_DB};
use gqrx::{
    format_freq_mhz, parse_freq_hz, Band, ClientConfig, GqrxClient, Receiver, ScanConfig, Scanner,
    DEFAULT_HOST, DEFAULT_PORT,
};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// gqrx-cli -- remote control and band scanning for gqrx.
#[derive(Parser, Debug)]
#[command(name = "gqrx-cli", version, about)]
struct Cli {
    /// Host running gqrx.
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// gqrx remote-control port.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Give up on a reply after this many milliseconds (default: wait forever).
    #[arg(long)]
    read_timeout_ms: Option<u64>,

    /// Log level used when RUST_LOG is not set (error, warn, info, debug, trace).
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sweep a band and print every signal above the threshold.
    /// Runs until Ctrl-C.
    Scan(ScanArgs),

    /// Tuned frequency.
    Freq {
        #[command(subcommand)]
        action: FreqAction,
    },

    /// Audio gain.
    Gain {
        #[command(subcommand)]
        action: LevelAction,
    },

    /// Demodulator mode.
    Mode {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Squelch threshold in dBFS.
    Squelch {
        #[command(subcommand)]
        action: LevelAction,
    },

    /// Audio recorder status.
    Record {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Read the signal strength in dBFS.
    Strength,

    /// Signal acquisition of signal (start of a pass).
    Aos,

    /// Signal loss of signal (end of a pass).
    Los,
}

#[derive(clap::Args, Debug)]
struct ScanArgs {
    /// Band preset: 2m, 1.25m, 70cm (default: 70cm).
    #[arg(long, conflicts_with_all = ["low", "high"])]
    band: Option<Band>,

    /// Bottom of a custom range (e.g. 446M, 446000000).
    #[arg(long, requires = "high", value_parser = parse_freq_hz)]
    low: Option<u64>,

    /// Top of a custom range.
    #[arg(long, requires = "low", value_parser = parse_freq_hz)]
    high: Option<u64>,

    /// Frequency step (e.g. 1k, 12.5k, 25000).
    #[arg(long, default_value_t = DEFAULT_STEP_HZ, value_parser = parse_freq_hz)]
    step: u64,

    /// Report readings strictly above this level, in dBFS.
    #[arg(long, default_value_t = DEFAULT_THRESHOLD_DB, allow_negative_numbers = true)]
    threshold: f64,

    /// Seconds to stay on a frequency after a hit.
    #[arg(long, default_value_t = DEFAULT_PAUSE.as_secs_f64(), allow_negative_numbers = true)]
    pause: f64,
}

#[derive(Subcommand, Debug)]
enum FreqAction {
    /// Read the tuned frequency.
    Get,
    /// Tune to a frequency (e.g. 145500000, 145.5M, 430e6).
    Set {
        #[arg(value_parser = parse_freq_hz)]
        freq_hz: u64,
    },
}

#[derive(Subcommand, Debug)]
enum LevelAction {
    /// Read the current level.
    Get,
    /// Set the level.
    Set {
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
}

#[derive(Subcommand, Debug)]
enum TokenAction {
    /// Read the current value.
    Get,
    /// Set the value (a single word, e.g. WFM_ST or 1).
    Set { value: String },
}

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

fn init_logging(fallback_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn client_config(cli: &Cli) -> ClientConfig {
    ClientConfig {
        host: cli.host.clone(),
        port: cli.port,
        read_timeout: cli.read_timeout_ms.map(Duration::from_millis),
        ..ClientConfig::default()
    }
}

fn scan_config(args: &ScanArgs) -> Result<ScanConfig> {
    let base = match (args.band, args.low, args.high) {
        (_, Some(low), Some(high)) => ScanConfig::new(low, high),
        (Some(band), _, _) => ScanConfig::for_band(band),
        _ => ScanConfig::default(),
    };
    let pause = Duration::try_from_secs_f64(args.pause).with_context(|| {
        format!(
            "--pause must be a non-negative number of seconds, got {}",
            args.pause
        )
    })?;
    Ok(base
        .step_hz(args.step)
        .threshold_db(args.threshold)
        .pause(pause))
}

/// Turn a refused setter into an error naming the operation.
fn require_accepted(accepted: bool, op: &str) -> Result<()> {
    if !accepted {
        bail!("{op} refused by receiver (RPRT 1)");
    }
    println!("OK");
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_scan(client: &mut GqrxClient, args: &ScanArgs) -> Result<()> {
    let config = scan_config(args)?;
    let scanner = Scanner::new(config).context("invalid scan parameters")?;
    let cfg = scanner.config();
    eprintln!(
        "Scanning {} - {} in {} Hz steps, threshold {} dBFS (Ctrl-C to stop)",
        format_freq_mhz(cfg.low_hz),
        format_freq_mhz(cfg.high_hz),
        cfg.step_hz,
        cfg.threshold_db
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping scan");
            on_signal.cancel();
        }
    });

    let summary = scanner
        .run(client, &cancel, |obs| println!("{obs}"))
        .await
        .context("scan failed")?;

    eprintln!(
        "Scan stopped after {} steps, {} hits",
        summary.iterations, summary.hits
    );
    Ok(())
}

async fn cmd_freq(client: &mut GqrxClient, action: &FreqAction) -> Result<()> {
    match action {
        FreqAction::Get => {
            let hz = client
                .get_frequency()
                .await
                .context("get_frequency failed")?;
            println!("{hz} ({})", format_freq_mhz(hz));
            Ok(())
        }
        FreqAction::Set { freq_hz } => {
            let accepted = client
                .set_frequency(*freq_hz)
                .await
                .context("set_frequency failed")?;
            require_accepted(accepted, "set_frequency")
        }
    }
}

async fn cmd_gain(client: &mut GqrxClient, action: &LevelAction) -> Result<()> {
    match action {
        LevelAction::Get => {
            let gain = client.get_gain().await.context("get_gain failed")?;
            println!("{gain}");
            Ok(())
        }
        LevelAction::Set { value } => {
            let accepted = client.set_gain(*value).await.context("set_gain failed")?;
            require_accepted(accepted, "set_gain")
        }
    }
}

async fn cmd_squelch(client: &mut GqrxClient, action: &LevelAction) -> Result<()> {
    match action {
        LevelAction::Get => {
            let dbfs = client.get_squelch().await.context("get_squelch failed")?;
            println!("{dbfs}");
            Ok(())
        }
        LevelAction::Set { value } => {
            let accepted = client
                .set_squelch(*value)
                .await
                .context("set_squelch failed")?;
            require_accepted(accepted, "set_squelch")
        }
    }
}

async fn cmd_mode(client: &mut GqrxClient, action: &TokenAction) -> Result<()> {
    match action {
        TokenAction::Get => {
            let mode = client
                .get_demod_mode()
                .await
                .context("get_demod_mode failed")?;
            println!("{mode}");
            Ok(())
        }
        TokenAction::Set { value } => {
            let accepted = client
                .set_demod_mode(value)
                .await
                .context("set_demod_mode failed")?;
            require_accepted(accepted, "set_demod_mode")
        }
    }
}

async fn cmd_record(client: &mut GqrxClient, action: &TokenAction) -> Result<()> {
    match action {
        TokenAction::Get => {
            let status = client
                .get_record_status()
                .await
                .context("get_record_status failed")?;
            println!("{status}");
            Ok(())
        }
        TokenAction::Set { value } => {
            let accepted = client
                .set_record_status(value)
                .await
                .context("set_record_status failed")?;
            require_accepted(accepted, "set_record_status")
        }
    }
}

async fn run_command(client: &mut GqrxClient, command: &Command) -> Result<()> {
    match command {
        Command::Scan(args) => cmd_scan(client, args).await,
        Command::Freq { action } => cmd_freq(client, action).await,
        Command::Gain { action } => cmd_gain(client, action).await,
        Command::Mode { action } => cmd_mode(client, action).await,
        Command::Squelch { action } => cmd_squelch(client, action).await,
        Command::Record { action } => cmd_record(client, action).await,
        Command::Strength => {
            let dbfs = client
                .get_signal_strength()
                .await
                .context("get_signal_strength failed")?;
            println!("{dbfs}");
            Ok(())
        }
        Command::Aos => {
            let accepted = client
                .acquire_signal()
                .await
                .context("acquire_signal failed")?;
            require_accepted(accepted, "acquire_signal")
        }
        Command::Los => {
            let accepted = client
                .loss_of_signal()
                .await
                .context("loss_of_signal failed")?;
            require_accepted(accepted, "loss_of_signal")
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = client_config(&cli);
    let mut client = GqrxClient::connect(&config)
        .await
        .with_context(|| format!("failed to connect to gqrx at {}", config.addr()))?;

    let result = run_command(&mut client, &cli.command).await;
    client.close().await.ok();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("gqrx-cli").chain(args.iter().copied())).unwrap()
    }

    fn scan_args(cli: Cli) -> ScanArgs {
        match cli.command {
            Command::Scan(args) => args,
            other => panic!("expected scan, got {other:?}"),
        }
    }

    #[test]
    fn connection_defaults() {
        let cli = parse(&["strength"]);
        let config = client_config(&cli);
        assert_eq!(config.addr(), "localhost:7356");
        assert_eq!(config.read_timeout, None);
    }

    #[test]
    fn read_timeout_flag() {
        let cli = parse(&["--host", "sdr", "--read-timeout-ms", "250", "aos"]);
        let config = client_config(&cli);
        assert_eq!(config.addr(), "sdr:7356");
        assert_eq!(config.read_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn scan_defaults_to_70cm() {
        let config = scan_config(&scan_args(parse(&["scan"]))).unwrap();
        assert_eq!(config, ScanConfig::default());
        assert_eq!((config.low_hz, config.high_hz), (420_000_000, 450_000_000));
    }

    #[test]
    fn scan_band_and_tuning() {
        let args = scan_args(parse(&[
            "scan",
            "--band",
            "2m",
            "--step",
            "12.5k",
            "--threshold",
            "-55",
            "--pause",
            "0.5",
        ]));
        let config = scan_config(&args).unwrap();
        assert_eq!((config.low_hz, config.high_hz), (144_000_000, 148_000_000));
        assert_eq!(config.step_hz, 12_500);
        assert_eq!(config.threshold_db, -55.0);
        assert_eq!(config.pause, Duration::from_millis(500));
    }

    #[test]
    fn scan_custom_range() {
        let args = scan_args(parse(&["scan", "--low", "446M", "--high", "446.2M"]));
        let config = scan_config(&args).unwrap();
        assert_eq!((config.low_hz, config.high_hz), (446_000_000, 446_200_000));
    }

    #[test]
    fn scan_range_needs_both_edges() {
        let result = Cli::try_parse_from(["gqrx-cli", "scan", "--low", "446M"]);
        assert!(result.is_err());
    }

    #[test]
    fn scan_band_conflicts_with_range() {
        let result = Cli::try_parse_from([
            "gqrx-cli", "scan", "--band", "2m", "--low", "1M", "--high", "2M",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn scan_rejects_negative_pause() {
        let args = scan_args(parse(&["scan", "--pause", "-1"]));
        assert!(scan_config(&args).is_err());
    }

    #[test]
    fn scan_rejects_huge_pause() {
        let args = scan_args(parse(&["scan", "--pause", "1e30"]));
        let err = scan_config(&args).unwrap_err();
        assert!(err.to_string().contains("--pause"), "{err:#}");
    }

    #[test]
    fn scan_failure_names_the_step() {
        let err = anyhow::Error::from(gqrx::Error::ConnectionLost.during("get_signal_strength"))
            .context("scan failed");
        assert_eq!(
            format!("{err:#}"),
            "scan failed: get_signal_strength failed: connection lost"
        );
    }

    #[test]
    fn negative_level_values() {
        let cli = parse(&["squelch", "set", "-60.5"]);
        match cli.command {
            Command::Squelch {
                action: LevelAction::Set { value },
            } => assert_eq!(value, -60.5),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn freq_set_accepts_suffixes() {
        let cli = parse(&["freq", "set", "145.5M"]);
        match cli.command {
            Command::Freq {
                action: FreqAction::Set { freq_hz },
            } => assert_eq!(freq_hz, 145_500_000),
            other => panic!("unexpected {other:?}"),
        }
    }
}
