//! A simulated gqrx receiver on a loopback socket.
//!
//! [`SimulatedReceiver`] listens on a random localhost port and answers the
//! remote-control command set from an in-memory [`SimulatedState`]. Unlike
//! [`MockTcpServer`](crate::MockTcpServer) it is not scripted: commands may
//! arrive in any order and any number, which makes it the right fixture for
//! the scanner and for end-to-end client tests.
//!
//! Signal strength is a function of the tuned frequency: carriers placed
//! with [`SimulatedReceiver::add_carrier`] report their level when tuned
//! exactly, every other frequency reports the noise floor.
//!
//! # Example
//!
//! ```
//! use gqrx_test_harness::SimulatedReceiver;
//!
//! # async fn example() -> gqrx_core::Result<()> {
//! let sim = SimulatedReceiver::start().await?;
//! sim.add_carrier(430_025_000, -22.0);
//! let addr = sim.addr().to_string();
//! // ... connect a client to `addr` ...
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use gqrx_core::error::{Error, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Noise floor reported away from any carrier, in dBFS.
pub const DEFAULT_NOISE_FLOOR_DB: f64 = -70.0;

/// Highest frequency the simulated hardware accepts, in hertz.
pub const DEFAULT_MAX_FREQ_HZ: u64 = 6_000_000_000;

/// Observable state of a [`SimulatedReceiver`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedState {
    pub freq_hz: u64,
    pub gain: f64,
    pub mode: String,
    pub squelch: f64,
    pub recording: bool,
    /// Set by `AOS`, cleared by `LOS`.
    pub signal_acquired: bool,
    pub noise_floor_db: f64,
    /// `(frequency, level)` pairs reported when tuned exactly.
    pub carriers: Vec<(u64, f64)>,
    /// `F` requests above this are refused with `RPRT 1`.
    pub max_freq_hz: u64,
    /// Every command line received, in order, across all connections.
    pub commands: Vec<String>,
    /// Drop the connection instead of answering once this many commands
    /// have been received in total.
    pub hang_up_after: Option<usize>,
}

impl Default for SimulatedState {
    fn default() -> Self {
        SimulatedState {
            freq_hz: 100_000_000,
            gain: 0.0,
            mode: "WFM_ST".to_string(),
            squelch: -150.0,
            recording: false,
            signal_acquired: false,
            noise_floor_db: DEFAULT_NOISE_FLOOR_DB,
            carriers: Vec::new(),
            max_freq_hz: DEFAULT_MAX_FREQ_HZ,
            commands: Vec::new(),
            hang_up_after: None,
        }
    }
}

impl SimulatedState {
    /// Signal level at the currently tuned frequency.
    pub fn strength(&self) -> f64 {
        self.carriers
            .iter()
            .find(|(freq, _)| *freq == self.freq_hz)
            .map(|(_, level)| *level)
            .unwrap_or(self.noise_floor_db)
    }

    /// Frequencies tuned with `F`, in order.
    pub fn tuned_frequencies(&self) -> Vec<u64> {
        self.commands
            .iter()
            .filter_map(|cmd| cmd.strip_prefix("F "))
            .filter_map(|arg| arg.parse().ok())
            .collect()
    }
}

/// What to do after handling one command line.
enum Outcome {
    Reply(String),
    /// Reply, then close the connection.
    ReplyAndClose(String),
    /// Close without replying.
    HangUp,
}

/// A stateful fake receiver serving the remote-control protocol.
///
/// Accepts any number of connections, one task each; all share the same
/// state. The server task is aborted when the `SimulatedReceiver` is dropped.
pub struct SimulatedReceiver {
    addr: String,
    state: Arc<Mutex<SimulatedState>>,
    server_handle: JoinHandle<()>,
}

impl SimulatedReceiver {
    /// Start a simulated receiver with default state.
    pub async fn start() -> Result<Self> {
        Self::start_with(SimulatedState::default()).await
    }

    /// Start a simulated receiver from the given state.
    pub async fn start_with(initial: SimulatedState) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| Error::Transport(format!("failed to bind simulated receiver: {e}")))?;
        let addr = listener.local_addr().map_err(Error::Io)?.to_string();
        let state = Arc::new(Mutex::new(initial));

        let server_state = Arc::clone(&state);
        let server_handle = tokio::spawn(async move {
            while let Ok((stream, peer)) = listener.accept().await {
                debug!(%peer, "simulated receiver: client connected");
                tokio::spawn(serve_connection(stream, Arc::clone(&server_state)));
            }
        });

        Ok(SimulatedReceiver {
            addr,
            state,
            server_handle,
        })
    }

    /// The `host:port` the receiver listens on.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SimulatedState {
        lock(&self.state).clone()
    }

    /// Modify the state in place.
    pub fn update(&self, f: impl FnOnce(&mut SimulatedState)) {
        f(&mut lock(&self.state));
    }

    /// Place a carrier that reports `level_db` when tuned exactly.
    pub fn add_carrier(&self, freq_hz: u64, level_db: f64) {
        self.update(|s| s.carriers.push((freq_hz, level_db)));
    }

    /// Drop the connection once `count` commands have been received in total.
    pub fn hang_up_after(&self, count: usize) {
        self.update(|s| s.hang_up_after = Some(count));
    }
}

impl Drop for SimulatedReceiver {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

fn lock(state: &Mutex<SimulatedState>) -> MutexGuard<'_, SimulatedState> {
    // A panicking test thread must not take the fixture down with it.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn serve_connection(stream: TcpStream, state: Arc<Mutex<SimulatedState>>) {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let outcome = handle_command(&mut lock(&state), line.trim_end());
        let (reply, close) = match outcome {
            Outcome::Reply(reply) => (reply, false),
            Outcome::ReplyAndClose(reply) => (reply, true),
            Outcome::HangUp => {
                debug!("simulated receiver: hanging up");
                return;
            }
        };
        trace!(reply = %reply, "simulated receiver: reply");
        if write_half
            .write_all(format!("{reply}\n").as_bytes())
            .await
            .is_err()
        {
            return;
        }
        if close {
            return;
        }
    }
}

fn status(ok: bool) -> String {
    let code = if ok { 0 } else { 1 };
    format!("RPRT {code}")
}

fn handle_command(state: &mut SimulatedState, line: &str) -> Outcome {
    trace!(command = line, "simulated receiver: command");
    state.commands.push(line.to_string());
    if state
        .hang_up_after
        .is_some_and(|limit| state.commands.len() > limit)
    {
        return Outcome::HangUp;
    }

    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or("");
    let args: Vec<&str> = words.collect();

    let reply = match (verb, args.as_slice()) {
        ("f", []) => state.freq_hz.to_string(),
        ("F", [hz]) => match hz.parse::<u64>() {
            Ok(hz) if hz <= state.max_freq_hz => {
                state.freq_hz = hz;
                status(true)
            }
            _ => status(false),
        },
        ("l", ["AF"]) => state.gain.to_string(),
        ("l", ["SQL"]) => state.squelch.to_string(),
        ("l", ["STRENGTH"]) => format!("{:.1}", state.strength()),
        ("L", ["AF", value]) => match value.parse::<f64>() {
            Ok(gain) if gain.is_finite() => {
                state.gain = gain;
                status(true)
            }
            _ => status(false),
        },
        ("L", ["SQL", value]) => match value.parse::<f64>() {
            Ok(level) if level.is_finite() => {
                state.squelch = level;
                status(true)
            }
            _ => status(false),
        },
        ("m", []) => state.mode.clone(),
        ("M", [mode]) => {
            state.mode = (*mode).to_string();
            status(true)
        }
        ("u", ["RECORD"]) => u8::from(state.recording).to_string(),
        ("U", ["RECORD", flag]) => match *flag {
            "1" => {
                state.recording = true;
                status(true)
            }
            "0" => {
                state.recording = false;
                status(true)
            }
            _ => status(false),
        },
        ("AOS", []) => {
            state.signal_acquired = true;
            status(true)
        }
        ("LOS", []) => {
            state.signal_acquired = false;
            status(true)
        }
        ("c", []) => return Outcome::ReplyAndClose(status(true)),
        _ => status(false),
    };
    Outcome::Reply(reply)
}
