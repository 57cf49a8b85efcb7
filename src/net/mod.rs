//! # Network Module
//!
//! UDP plumbing for the bridge.
//!
//! This module handles:
//! - Broadcasting one encoded telemetry line per sampling cycle
//! - Listening for inbound control datagrams on a separate thread
//! - Cooperative shutdown of the listener

pub mod listener;
pub mod transport;

pub use listener::{DatagramSource, InboundListener, ListenerHandle, ListenerStats, LoggingHandler, MessageHandler};
pub use transport::{BroadcastTransport, DatagramSink};

/// Largest payload a single IPv4 UDP datagram can carry
pub const MAX_DATAGRAM_SIZE: usize = 65_507;
