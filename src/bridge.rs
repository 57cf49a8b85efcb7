//! # Telemetry Bridge
//!
//! Owns everything that lives between plugin start and stop: the outbound
//! transport, the inbound listener thread, the shutdown token and the
//! sampling cycle.
//!
//! ## Control Flow
//!
//! 1. **Start**: open the outbound socket, bind the inbound socket, spawn the
//!    listener. Any failure drops what was already opened and returns an error.
//! 2. **Tick**: build → encode → send, strictly in order, once per host call.
//!    A failed send is logged and the next tick runs normally.
//! 3. **Stop**: cancel the token, join the listener, close both sockets.
//!    Idempotent.
//!
//! ## Usage
//!
//! ```no_run
//! use telem_bridge::bridge::TelemetryBridge;
//! use telem_bridge::config::Config;
//! use telem_bridge::sim::SyntheticSim;
//!
//! let sim = SyntheticSim::cessna();
//! let mut bridge = TelemetryBridge::start(&Config::default(), &sim)?;
//! bridge.tick(&sim);
//! bridge.stop();
//! # Ok::<(), telem_bridge::error::BridgeError>(())
//! ```

use std::net::{SocketAddr, UdpSocket};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{BridgeError, Result};
use crate::net::{BroadcastTransport, DatagramSink, ListenerHandle, ListenerStats, LoggingHandler, MessageHandler};
use crate::sim::SimAccessor;
use crate::telemetry::SnapshotBuilder;
use crate::wire::encode;

/// Result of one sampling cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Line sent, with its length in bytes
    Sent(usize),
    /// Line built but the send failed
    SendFailed,
    /// Bridge already stopped; nothing sampled
    Stopped,
}

/// Sampling cycle counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub cycles: u64,
    pub sent: u64,
    pub send_failures: u64,
}

/// Process-scoped bridge state between start and stop
pub struct TelemetryBridge<S: DatagramSink = UdpSocket> {
    builder: SnapshotBuilder,
    transport: Option<BroadcastTransport<S>>,
    listener: Option<ListenerHandle>,
    shutdown: CancellationToken,
    stats: CycleStats,
}

impl<S: DatagramSink> std::fmt::Debug for TelemetryBridge<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryBridge")
            .field("transport", &self.transport)
            .field("listener", &self.listener)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl TelemetryBridge<UdpSocket> {
    /// Start the bridge with the default inbound handler
    ///
    /// # Errors
    ///
    /// Returns error if either socket cannot be created or bound, or the
    /// listener thread cannot start
    pub fn start<A: SimAccessor + ?Sized>(config: &Config, sim: &A) -> Result<Self> {
        Self::start_with_handler(config, sim, LoggingHandler)
    }

    /// Start the bridge, handing inbound datagrams to `handler`
    ///
    /// # Errors
    ///
    /// Same as [`TelemetryBridge::start`]
    pub fn start_with_handler<A, H>(config: &Config, sim: &A, handler: H) -> Result<Self>
    where
        A: SimAccessor + ?Sized,
        H: MessageHandler + 'static,
    {
        let target = config.network.broadcast_target()?;
        let listen = config.network.listen_endpoint()?;

        let transport = BroadcastTransport::open(target)?;
        let inbound = UdpSocket::bind(listen)
            .map_err(|e| BridgeError::Socket(format!("Failed to bind {}: {}", listen, e)))?;

        Self::with_transport(config, sim, transport, inbound, handler)
    }
}

impl<S: DatagramSink> TelemetryBridge<S> {
    /// Start the bridge over a caller-supplied transport and inbound socket
    ///
    /// # Errors
    ///
    /// Returns error if the listener thread cannot start; `transport` and
    /// `inbound` are dropped in that case
    pub fn with_transport<A, H>(
        config: &Config,
        sim: &A,
        transport: BroadcastTransport<S>,
        inbound: UdpSocket,
        handler: H,
    ) -> Result<Self>
    where
        A: SimAccessor + ?Sized,
        H: MessageHandler + 'static,
    {
        let builder = SnapshotBuilder::resolve(sim, &config.sampling);
        let shutdown = CancellationToken::new();

        let listener = ListenerHandle::spawn(
            inbound,
            config.network.recv_buffer_size,
            config.network.poll_interval(),
            handler,
            shutdown.clone(),
        )?;

        info!(
            "Telemetry bridge started: sending to {}, listening on {}",
            transport.target(),
            listener.local_addr()
        );

        Ok(Self {
            builder,
            transport: Some(transport),
            listener: Some(listener),
            shutdown,
            stats: CycleStats::default(),
        })
    }

    /// Run one sampling cycle: build, encode, send
    ///
    /// Never fails: a send error is logged and reported as
    /// [`CycleOutcome::SendFailed`].
    pub fn tick<A: SimAccessor + ?Sized>(&mut self, sim: &A) -> CycleOutcome {
        let Some(transport) = self.transport.as_mut() else {
            return CycleOutcome::Stopped;
        };

        self.stats.cycles += 1;
        let snapshot = self.builder.build(sim);
        let line = encode(&snapshot);

        match transport.send(&line) {
            Ok(()) => {
                self.stats.sent += 1;
                CycleOutcome::Sent(line.len())
            }
            Err(e) => {
                self.stats.send_failures += 1;
                if self.stats.send_failures == 1 {
                    warn!("Telemetry send failed (further failures logged at debug): {}", e);
                } else {
                    debug!("Telemetry send failed: {}", e);
                }
                CycleOutcome::SendFailed
            }
        }
    }

    /// Stop the listener and close both sockets
    ///
    /// Safe to call any number of times; only the first call does work and
    /// returns the listener's counters.
    pub fn stop(&mut self) -> Option<ListenerStats> {
        self.shutdown.cancel();

        let listener_stats = self.listener.take().and_then(|mut listener| listener.shutdown());
        let transport = self.transport.take()?;

        info!(
            "Telemetry bridge stopped after {} cycles ({} sent, {} failed)",
            self.stats.cycles,
            transport.datagrams_sent(),
            transport.send_failures()
        );
        listener_stats
    }

    pub fn is_running(&self) -> bool {
        self.transport.is_some()
    }

    /// Inbound listener address while running
    pub fn listen_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(ListenerHandle::local_addr)
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    /// Token cancelled when the bridge stops
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

impl<S: DatagramSink> Drop for TelemetryBridge<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::transport::MockDatagramSink;
    use crate::sim::{datarefs, SyntheticSim};
    use crate::telemetry::snapshot::keys;
    use crate::wire::decode_datagram;
    use std::io;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    /// Config whose sockets all live on loopback ephemeral ports
    fn loopback_config(target: SocketAddr) -> Config {
        let mut config = Config::default();
        config.network.broadcast_addr = target.ip().to_string();
        config.network.broadcast_port = target.port();
        config.network.listen_addr = "127.0.0.1".to_string();
        config.network.listen_port = 0;
        config
    }

    fn receiver() -> (UdpSocket, SocketAddr) {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let addr = socket.local_addr().unwrap();
        (socket, addr)
    }

    #[derive(Clone, Default)]
    struct CountingHandler {
        count: Arc<AtomicU64>,
    }

    impl MessageHandler for CountingHandler {
        fn handle(&mut self, _payload: &[u8], _from: SocketAddr) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_tick_broadcasts_decodable_line() {
        let (rx, target) = receiver();
        let sim = SyntheticSim::cessna();
        let mut bridge = TelemetryBridge::start(&loopback_config(target), &sim).unwrap();

        assert!(matches!(bridge.tick(&sim), CycleOutcome::Sent(_)));

        let mut buf = [0u8; 4096];
        let (len, _) = rx.recv_from(&mut buf).unwrap();
        let snapshot = decode_datagram(&buf[..len]).unwrap();
        assert_eq!(snapshot.len(), keys::ALL.len());
        assert_eq!(snapshot.get(keys::SOURCE), Some("XPLANE"));
        assert_eq!(snapshot.get(keys::AIRCRAFT_NAME), Some("Cessna_172SP"));

        bridge.stop();
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (_rx, target) = receiver();
        let sim = SyntheticSim::cessna();
        let mut bridge = TelemetryBridge::start(&loopback_config(target), &sim).unwrap();
        assert!(bridge.is_running());

        assert!(bridge.stop().is_some());
        assert!(bridge.stop().is_none());
        assert!(!bridge.is_running());
        assert!(bridge.listen_addr().is_none());
        assert!(bridge.shutdown_token().is_cancelled());
    }

    #[test]
    fn test_tick_after_stop() {
        let (_rx, target) = receiver();
        let sim = SyntheticSim::cessna();
        let mut bridge = TelemetryBridge::start(&loopback_config(target), &sim).unwrap();
        bridge.stop();

        assert_eq!(bridge.tick(&sim), CycleOutcome::Stopped);
        assert_eq!(bridge.stats().cycles, 0);
    }

    #[test]
    fn test_stop_releases_inbound_port() {
        let (_rx, target) = receiver();
        let sim = SyntheticSim::cessna();
        let mut bridge = TelemetryBridge::start(&loopback_config(target), &sim).unwrap();
        let listen = bridge.listen_addr().unwrap();

        bridge.stop();
        assert!(UdpSocket::bind(listen).is_ok());
    }

    #[test]
    fn test_start_fails_when_inbound_port_taken() {
        let (_rx, target) = receiver();
        let taken = UdpSocket::bind("127.0.0.1:0").unwrap();

        let mut config = loopback_config(target);
        config.network.listen_port = taken.local_addr().unwrap().port();

        let result = TelemetryBridge::start(&config, &SyntheticSim::cessna());
        match result {
            Err(BridgeError::Socket(msg)) => assert!(msg.contains("Failed to bind")),
            other => panic!("Expected Socket error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_start_failure_inside_runtime_returns_error() {
        let (_rx, target) = receiver();
        let taken = UdpSocket::bind("127.0.0.1:0").unwrap();

        let mut config = loopback_config(target);
        config.network.listen_port = taken.local_addr().unwrap().port();

        assert!(TelemetryBridge::start(&config, &SyntheticSim::cessna()).is_err());
    }

    #[tokio::test]
    async fn test_start_and_stop_inside_runtime() {
        let (_rx, target) = receiver();
        let sim = SyntheticSim::cessna();
        let mut bridge = TelemetryBridge::start(&loopback_config(target), &sim).unwrap();

        assert!(matches!(bridge.tick(&sim), CycleOutcome::Sent(_)));
        assert!(bridge.stop().is_some());
    }

    #[test]
    fn test_start_fails_on_bad_address() {
        let mut config = Config::default();
        config.network.listen_addr = "nope".to_string();
        assert!(TelemetryBridge::start(&config, &SyntheticSim::cessna()).is_err());
    }

    #[test]
    fn test_send_failure_does_not_skip_next_cycle() {
        let mut sink = MockDatagramSink::new();
        let mut seq = mockall::Sequence::new();
        sink.expect_send_to()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(io::Error::new(io::ErrorKind::Other, "forced failure")));
        sink.expect_send_to()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|payload, _| Ok(payload.len()));

        let config = Config::default();
        let sim = SyntheticSim::cessna();
        let transport = BroadcastTransport::with_sink(sink, config.network.broadcast_target().unwrap());
        let inbound = UdpSocket::bind("127.0.0.1:0").unwrap();
        let mut bridge = TelemetryBridge::with_transport(&config, &sim, transport, inbound, LoggingHandler).unwrap();

        assert_eq!(bridge.tick(&sim), CycleOutcome::SendFailed);
        assert!(matches!(bridge.tick(&sim), CycleOutcome::Sent(_)));
        assert!(matches!(bridge.tick(&sim), CycleOutcome::Sent(_)));

        let stats = bridge.stats();
        assert_eq!(stats.cycles, 3);
        assert_eq!(stats.sent, 2);
        assert_eq!(stats.send_failures, 1);
    }

    #[test]
    fn test_every_cycle_sends_full_key_set() {
        let mut sink = MockDatagramSink::new();
        sink.expect_send_to()
            .times(5)
            .withf(|payload, _| {
                decode_datagram(payload).map(|s| s.len() == keys::ALL.len()).unwrap_or(false)
            })
            .returning(|payload, _| Ok(payload.len()));

        let config = Config::default();
        let mut sim = SyntheticSim::cessna();
        let transport = BroadcastTransport::with_sink(sink, config.network.broadcast_target().unwrap());
        let inbound = UdpSocket::bind("127.0.0.1:0").unwrap();
        let mut bridge = TelemetryBridge::with_transport(&config, &sim, transport, inbound, LoggingHandler).unwrap();

        for _ in 0..5 {
            sim.advance(0.016);
            assert!(matches!(bridge.tick(&sim), CycleOutcome::Sent(_)));
        }
    }

    #[test]
    fn test_cycles_and_inbound_run_independently() {
        const CYCLES: usize = 200;
        const INBOUND: usize = 100;

        let (rx, target) = receiver();
        let handler = CountingHandler::default();
        let mut sim = SyntheticSim::cessna();
        let mut bridge =
            TelemetryBridge::start_with_handler(&loopback_config(target), &sim, handler.clone()).unwrap();
        let listen = bridge.listen_addr().unwrap();

        let sender = thread::spawn(move || {
            let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
            for i in 0..INBOUND {
                socket.send_to(format!("cmd={};", i).as_bytes(), listen).unwrap();
                thread::sleep(Duration::from_micros(200));
            }
        });

        let collector = thread::spawn(move || {
            let mut lines = Vec::new();
            let mut buf = [0u8; 4096];
            while lines.len() < CYCLES {
                match rx.recv_from(&mut buf) {
                    Ok((len, _)) => lines.push(buf[..len].to_vec()),
                    Err(_) => break,
                }
            }
            lines
        });

        for i in 0..CYCLES {
            sim.set_elapsed_time(i as f32);
            assert!(matches!(bridge.tick(&sim), CycleOutcome::Sent(_)));
            // Pace the loopback so the collector never overflows its socket buffer
            thread::sleep(Duration::from_micros(200));
        }

        sender.join().unwrap();
        let lines = collector.join().unwrap();
        assert_eq!(lines.len(), CYCLES);
        for (i, line) in lines.iter().enumerate() {
            let snapshot = decode_datagram(line).unwrap();
            assert_eq!(snapshot.len(), keys::ALL.len());
            assert_eq!(snapshot.get(keys::TIME), Some(format!("{}.000", i).as_str()));
        }

        let deadline = Instant::now() + Duration::from_secs(2);
        while handler.count.load(Ordering::SeqCst) < INBOUND as u64 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(handler.count.load(Ordering::SeqCst), INBOUND as u64);

        let stats = bridge.stop().unwrap();
        assert_eq!(stats.datagrams, INBOUND as u64);
        assert_eq!(bridge.stats().sent, CYCLES as u64);
    }

    #[test]
    fn test_missing_data_refs_still_send_full_key_set() {
        let (rx, target) = receiver();
        let mut sim = SyntheticSim::new();
        sim.set_float(datarefs::G_NORMAL, 1.5);
        let mut bridge = TelemetryBridge::start(&loopback_config(target), &sim).unwrap();

        bridge.tick(&sim);

        let mut buf = [0u8; 4096];
        let (len, _) = rx.recv_from(&mut buf).unwrap();
        let snapshot = decode_datagram(&buf[..len]).unwrap();
        assert_eq!(snapshot.len(), keys::ALL.len());
        assert_eq!(snapshot.get(keys::G_NORMAL), Some("1.500"));
        assert_eq!(snapshot.get(keys::TRUE_AIRSPEED), Some("0.000"));
    }

    #[test]
    fn test_drop_stops_listener() {
        let (_rx, target) = receiver();
        let sim = SyntheticSim::cessna();
        let bridge = TelemetryBridge::start(&loopback_config(target), &sim).unwrap();
        let token = bridge.shutdown_token();
        let listen = bridge.listen_addr().unwrap();

        drop(bridge);
        assert!(token.is_cancelled());
        assert!(UdpSocket::bind(listen).is_ok());
    }
}
