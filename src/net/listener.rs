//! # Inbound Listener
//!
//! Receives control datagrams on the inbound port, concurrently with the
//! sampling cycle, until the shutdown token is cancelled.
//!
//! The listener runs on its own thread with a single-threaded tokio runtime.
//! Each receive waits at most one poll interval before the shutdown token is
//! checked again, so an idle listener costs nothing and a stop request is
//! observed within one interval.

use std::future::poll_fn;
use std::io;
use std::net::{SocketAddr, UdpSocket as StdUdpSocket};
use std::sync::mpsc;
use std::task::{Context, Poll};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::io::ReadBuf;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::error::{BridgeError, Result};

/// Consumes inbound datagram payloads
pub trait MessageHandler: Send {
    /// Handle one payload, already bounded to the receive buffer
    fn handle(&mut self, payload: &[u8], from: SocketAddr);
}

/// Default handler: logs the payload and takes no action
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl MessageHandler for LoggingHandler {
    fn handle(&mut self, payload: &[u8], from: SocketAddr) {
        debug!("Inbound message from {}: {}", from, String::from_utf8_lossy(payload));
    }
}

/// Inbound datagram socket operations
pub trait DatagramSource: Send {
    /// Poll for one datagram, filling `buf` and returning the sender
    fn poll_recv_from(&self, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<SocketAddr>>;

    fn local_addr(&self) -> io::Result<SocketAddr>;
}

impl DatagramSource for UdpSocket {
    fn poll_recv_from(&self, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<SocketAddr>> {
        UdpSocket::poll_recv_from(self, cx, buf)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        UdpSocket::local_addr(self)
    }
}

/// Counters reported when a listener exits
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListenerStats {
    /// Non-empty datagrams handed to the handler
    pub datagrams: u64,
    /// Payload bytes handed to the handler
    pub bytes: u64,
    /// Receive errors (the loop continued after each)
    pub errors: u64,
}

/// Receive loop over a bound socket
pub struct InboundListener<H: MessageHandler, S: DatagramSource = UdpSocket> {
    socket: S,
    buffer: Vec<u8>,
    poll_interval: Duration,
    handler: H,
    shutdown: CancellationToken,
}

impl<H: MessageHandler, S: DatagramSource> InboundListener<H, S> {
    /// Create a listener
    ///
    /// # Arguments
    ///
    /// * `socket` - Bound inbound socket
    /// * `buffer_size` - Receive buffer capacity; longer datagrams are truncated
    /// * `poll_interval` - Longest single wait before re-checking `shutdown`
    /// * `handler` - Receives every non-empty payload
    /// * `shutdown` - Cancelling this token ends the loop
    pub fn new(
        socket: S,
        buffer_size: usize,
        poll_interval: Duration,
        handler: H,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            socket,
            buffer: vec![0u8; buffer_size],
            poll_interval,
            handler,
            shutdown,
        }
    }

    /// Run until the shutdown token is cancelled
    ///
    /// Receive errors are counted; empty datagrams are skipped. Nothing
    /// inbound ends the loop.
    pub async fn run(mut self) -> ListenerStats {
        let mut stats = ListenerStats::default();

        match self.socket.local_addr() {
            Ok(addr) => info!("Inbound listener started on {}", addr),
            Err(_) => info!("Inbound listener started"),
        }

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            let socket = &self.socket;
            let buffer = &mut self.buffer;
            let receive = poll_fn(|cx| {
                let mut buf = ReadBuf::new(buffer.as_mut_slice());
                socket
                    .poll_recv_from(cx, &mut buf)
                    .map_ok(|from| (buf.filled().len(), from))
            });

            let received = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                result = tokio::time::timeout(self.poll_interval, receive) => result,
            };

            match received {
                // Poll interval elapsed with nothing to read
                Err(_) => continue,
                Ok(Ok((0, _))) => continue,
                Ok(Ok((len, from))) => {
                    let len = len.min(self.buffer.len());
                    stats.datagrams += 1;
                    stats.bytes += len as u64;
                    trace!("Received {} bytes from {}", len, from);
                    self.handler.handle(&self.buffer[..len], from);
                }
                Ok(Err(e)) => {
                    stats.errors += 1;
                    debug!("Inbound receive failed: {}", e);
                    // Errors can repeat immediately; wait out the interval instead of spinning
                    tokio::select! {
                        _ = self.shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.poll_interval) => {}
                    }
                }
            }
        }

        info!(
            "Inbound listener stopped ({} datagrams, {} bytes, {} errors)",
            stats.datagrams, stats.bytes, stats.errors
        );
        stats
    }
}

/// A listener running on its own thread
///
/// Dropping the handle stops the listener and waits for its thread.
pub struct ListenerHandle {
    shutdown: CancellationToken,
    thread: Option<JoinHandle<ListenerStats>>,
    local_addr: SocketAddr,
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("local_addr", &self.local_addr)
            .field("running", &self.thread.is_some())
            .finish_non_exhaustive()
    }
}

impl ListenerHandle {
    /// Start a listener thread over an already-bound socket
    ///
    /// The runtime is built and the socket registered on the listener thread
    /// itself; this call waits until that has succeeded or failed.
    ///
    /// # Errors
    ///
    /// Returns error if the runtime, socket registration, or thread cannot be
    /// created. Nothing is left running on error.
    pub fn spawn<H: MessageHandler + 'static>(
        socket: StdUdpSocket,
        buffer_size: usize,
        poll_interval: Duration,
        handler: H,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        let local_addr = socket.local_addr()?;

        socket
            .set_nonblocking(true)
            .map_err(|e| BridgeError::Socket(format!("Failed to set non-blocking: {}", e)))?;

        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let listener_shutdown = shutdown.clone();
        let thread = thread::Builder::new()
            .name("telem-rx".to_string())
            .spawn(move || {
                let listener = match register(socket) {
                    Ok((runtime, socket)) => {
                        let listener =
                            InboundListener::new(socket, buffer_size, poll_interval, handler, listener_shutdown);
                        Some((runtime, listener))
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        None
                    }
                };

                match listener {
                    Some((runtime, listener)) => {
                        let _ = ready_tx.send(Ok(()));
                        runtime.block_on(listener.run())
                    }
                    None => ListenerStats::default(),
                }
            })?;

        let startup = ready_rx.recv().unwrap_or_else(|_| {
            Err(BridgeError::Socket("Inbound listener thread exited during startup".to_string()))
        });

        if let Err(e) = startup {
            if thread.join().is_err() {
                error!("Inbound listener thread panicked during startup");
            }
            return Err(e);
        }

        Ok(Self {
            shutdown,
            thread: Some(thread),
            local_addr,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// True once the listener thread has exited
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Cancel the listener and wait for its thread
    ///
    /// Returns the listener's counters the first time; `None` on later calls
    /// or if the thread panicked. The inbound socket is closed when this returns.
    pub fn shutdown(&mut self) -> Option<ListenerStats> {
        self.shutdown.cancel();

        let thread = self.thread.take()?;
        match thread.join() {
            Ok(stats) => Some(stats),
            Err(_) => {
                error!("Inbound listener thread panicked");
                None
            }
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Build the listener runtime and register `socket` with its reactor
///
/// Runs on the listener thread, so the runtime is never dropped on the caller.
fn register(socket: StdUdpSocket) -> Result<(tokio::runtime::Runtime, UdpSocket)> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()?;

    let socket = {
        let _guard = runtime.enter();
        UdpSocket::from_std(socket)
            .map_err(|e| BridgeError::Socket(format!("Failed to register inbound socket: {}", e)))?
    };

    Ok((runtime, socket))
}
