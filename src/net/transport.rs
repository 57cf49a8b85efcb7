//! # Broadcast Transport
//!
//! Sends each encoded telemetry line as one UDP datagram to the fixed
//! broadcast endpoint. Fire-and-forget: the socket is non-blocking, failures
//! are returned to the caller and never retried.

use std::io;
use std::net::{SocketAddr, UdpSocket};

use tracing::{debug, info, trace};

use super::MAX_DATAGRAM_SIZE;
use crate::error::{BridgeError, Result};

/// Outbound datagram socket operations
#[cfg_attr(test, mockall::automock)]
pub trait DatagramSink: Send {
    /// Send one datagram, returning the number of bytes written
    fn send_to(&self, payload: &[u8], target: SocketAddr) -> io::Result<usize>;
}

impl DatagramSink for UdpSocket {
    fn send_to(&self, payload: &[u8], target: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, payload, target)
    }
}

/// Broadcast endpoint and the socket that feeds it
pub struct BroadcastTransport<S: DatagramSink = UdpSocket> {
    sink: S,
    target: SocketAddr,
    datagrams_sent: u64,
    send_failures: u64,
}

impl<S: DatagramSink> std::fmt::Debug for BroadcastTransport<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastTransport")
            .field("target", &self.target)
            .field("datagrams_sent", &self.datagrams_sent)
            .field("send_failures", &self.send_failures)
            .finish_non_exhaustive()
    }
}

impl BroadcastTransport<UdpSocket> {
    /// Open an outbound socket for `target`
    ///
    /// Binds an ephemeral local port, enables broadcast and switches the
    /// socket to non-blocking so a send can never stall the sampling cycle.
    ///
    /// # Errors
    ///
    /// Returns error if the socket cannot be created or configured
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use telem_bridge::net::BroadcastTransport;
    ///
    /// let mut transport = BroadcastTransport::open("127.255.255.255:34390".parse()?)?;
    /// transport.send("src=XPLANE;")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(target: SocketAddr) -> Result<Self> {
        let bind_addr = if target.is_ipv6() {
            SocketAddr::from(([0u16; 8], 0))
        } else {
            SocketAddr::from(([0u8; 4], 0))
        };

        let socket = UdpSocket::bind(bind_addr)
            .map_err(|e| BridgeError::Socket(format!("Failed to create outbound socket: {}", e)))?;

        socket
            .set_broadcast(true)
            .map_err(|e| BridgeError::Socket(format!("Failed to enable broadcast: {}", e)))?;

        socket
            .set_nonblocking(true)
            .map_err(|e| BridgeError::Socket(format!("Failed to set non-blocking: {}", e)))?;

        info!("Broadcasting telemetry to {}", target);
        Ok(Self::with_sink(socket, target))
    }
}

impl<S: DatagramSink> BroadcastTransport<S> {
    /// Wrap an existing sink
    pub fn with_sink(sink: S, target: SocketAddr) -> Self {
        Self {
            sink,
            target,
            datagrams_sent: 0,
            send_failures: 0,
        }
    }

    /// Send one encoded line as a single datagram
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The line is larger than one UDP payload
    /// - The socket rejects the send (including `WouldBlock`)
    /// - Fewer bytes than the whole line were written
    pub fn send(&mut self, line: &str) -> Result<()> {
        let payload = line.as_bytes();

        if payload.len() > MAX_DATAGRAM_SIZE {
            self.send_failures += 1;
            return Err(BridgeError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_DATAGRAM_SIZE,
            });
        }

        match self.sink.send_to(payload, self.target) {
            Ok(written) if written == payload.len() => {
                self.datagrams_sent += 1;
                trace!("Sent telemetry datagram ({} bytes)", written);
                Ok(())
            }
            Ok(written) => {
                self.send_failures += 1;
                Err(BridgeError::Socket(format!(
                    "Short send to {}: {} of {} bytes",
                    self.target,
                    written,
                    payload.len()
                )))
            }
            Err(e) => {
                self.send_failures += 1;
                debug!("Send to {} failed: {}", self.target, e);
                Err(BridgeError::Socket(format!("Failed to send to {}: {}", self.target, e)))
            }
        }
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn datagrams_sent(&self) -> u64 {
        self.datagrams_sent
    }

    pub fn send_failures(&self) -> u64 {
        self.send_failures
    }
}
