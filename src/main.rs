//! # Telemetry Bridge
//!
//! Broadcast flight telemetry over UDP for force-feedback processing.
//!
//! Outside a simulator host this binary drives the bridge from a synthetic
//! simulator, or monitors the broadcast port and decodes what arrives.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Parse arguments and load configuration
//!    - Set up logging (console, plus a daily log file if configured)
//!
//! 2. **Run**
//!    - Start the bridge: outbound socket, inbound listener thread
//!    - Sample and broadcast at `sampling.rate_hz` until Ctrl+C
//!    - Stop the bridge and log totals
//!
//! 3. **Monitor**
//!    - Bind the broadcast port and decode each telemetry line
//!    - Log a summary per line, or print one JSON object per line with `--json`
//!
//! # Examples
//!
//! ```bash
//! telem-bridge --config config/default.toml run
//! telem-bridge monitor --json
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tokio::net::UdpSocket;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use telem_bridge::bridge::{CycleOutcome, TelemetryBridge};
use telem_bridge::config::{Config, LoggingConfig};
use telem_bridge::net::MAX_DATAGRAM_SIZE;
use telem_bridge::sim::SyntheticSim;
use telem_bridge::telemetry::snapshot::keys;
use telem_bridge::telemetry::Snapshot;
use telem_bridge::wire::{decode_datagram, TelemetryValue};

/// Number of cycles between status log messages
const LOG_INTERVAL_CYCLES: u64 = 1000;

/// Log file name prefix inside `logging.log_dir`
const LOG_FILE_PREFIX: &str = "telem-bridge.log";

#[derive(Parser)]
#[command(name = "telem-bridge")]
#[command(about = "Broadcast flight telemetry over UDP for force-feedback processing")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Drive the bridge from a synthetic simulator until Ctrl+C
    Run,

    /// Listen on the broadcast port and decode received telemetry
    Monitor {
        /// Port to listen on (defaults to network.broadcast_port)
        #[arg(long)]
        port: Option<u16>,

        /// Print one JSON object per received line
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    let _guard = init_logging(&config.logging)?;
    info!("Telemetry Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Run => run(&config).await,
        Command::Monitor { port, json } => {
            monitor(port.unwrap_or(config.network.broadcast_port), json).await
        }
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` overrides the configured level. The returned guard flushes the
/// log file and must be held until exit.
fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (file_layer, guard) = if config.log_dir.is_empty() {
        (None, None)
    } else {
        let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_thread_names(true))
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

async fn run(config: &Config) -> Result<()> {
    let mut sim = SyntheticSim::cessna();
    let mut bridge = TelemetryBridge::start(config, &sim)?;

    let period = Duration::from_secs_f64(1.0 / f64::from(config.sampling.rate_hz));
    let mut cycle_interval = interval(period);
    cycle_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Starting telemetry loop at {}Hz", config.sampling.rate_hz);
    info!("Press Ctrl+C to exit");

    let mut last_log_cycles: u64 = 0;

    loop {
        tokio::select! {
            _ = cycle_interval.tick() => {
                sim.advance(period.as_secs_f32());

                if bridge.tick(&sim) == CycleOutcome::Stopped {
                    break;
                }

                let stats = bridge.stats();
                if stats.cycles - last_log_cycles >= LOG_INTERVAL_CYCLES {
                    info!("Ran {} cycles ({} sent, {} failed)",
                        stats.cycles, stats.sent, stats.send_failures);
                    last_log_cycles = stats.cycles;
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    // Joins the listener thread
    let listener_stats = tokio::task::block_in_place(|| bridge.stop());
    if let Some(stats) = listener_stats {
        info!("Inbound datagrams received: {} ({} bytes, {} errors)",
            stats.datagrams, stats.bytes, stats.errors);
    }
    info!("Total cycles: {}", bridge.stats().cycles);

    Ok(())
}

async fn monitor(port: u16, json: bool) -> Result<()> {
    let bind_addr = SocketAddr::from(([0, 0, 0, 0], port));
    let socket = UdpSocket::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    info!("Monitoring telemetry on {}", bind_addr);
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    let mut frames: u64 = 0;

    loop {
        tokio::select! {
            received = next_frame(&socket, &mut buf) => {
                let (from, decoded) = received?;
                match decoded {
                    Ok(snapshot) => {
                        frames += 1;
                        if json {
                            println!("{}", frame_json(&snapshot, Utc::now())?);
                        } else {
                            info!("{}", summarize(&snapshot));
                        }
                    }
                    Err(e) => warn!("Undecodable datagram from {}: {}", from, e),
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!("Total frames decoded: {}", frames);
                break;
            }
        }
    }

    Ok(())
}

/// Receive and decode one datagram
async fn next_frame(
    socket: &UdpSocket,
    buf: &mut [u8],
) -> std::io::Result<(SocketAddr, telem_bridge::error::Result<Snapshot>)> {
    let (len, from) = socket.recv_from(buf).await?;
    debug!("Received {} bytes from {}", len, from);
    Ok((from, decode_datagram(&buf[..len])))
}

/// One-line human summary of a frame
fn summarize(snapshot: &Snapshot) -> String {
    let field = |key: &str| snapshot.get(key).unwrap_or("-").to_string();
    format!(
        "{} T={} G={} TAS={} AoA={} paused={} ({} fields)",
        field(keys::AIRCRAFT_NAME),
        field(keys::TIME),
        field(keys::G_NORMAL),
        field(keys::TRUE_AIRSPEED),
        field(keys::ANGLE_OF_ATTACK),
        field(keys::SIM_PAUSED),
        snapshot.len()
    )
}

/// Frame as a JSON object of typed values plus a receive timestamp
fn frame_json(snapshot: &Snapshot, received_at: DateTime<Utc>) -> serde_json::Result<String> {
    let mut frame = Map::new();
    frame.insert("received_at".to_string(), Value::String(received_at.to_rfc3339()));

    for (key, value) in snapshot.iter() {
        frame.insert(key.to_string(), serde_json::to_value(TelemetryValue::parse(value))?);
    }

    serde_json::to_string(&Value::Object(frame))
}
