//! Connection manager: the listening endpoint and the single peer connection.
//!
//! Every operation here is non-blocking and returns within the calling tick.
//! "Nothing happened yet" outcomes (no pending peer, no bytes available) are
//! ordinary values, not errors.
//!
//! ## Lifecycle
//!
//! ```text
//! bind ──► listening ──try_accept──► connected ──Empty read──► listening
//!              ▲                         │                        │
//!              └──────── disconnect ─────┘     death_threshold ───┴──► terminated
//! ```
//!
//! Orderly peer closes are counted as "deaths". The count survives reconnects;
//! once it reaches the configured threshold the endpoint is closed permanently
//! and further accepts are refused.

mod endpoint;

use std::io::{ErrorKind, Read};
use std::net::{SocketAddr, TcpListener, TcpStream};
use tracing::{debug, info, trace, warn};

use crate::{Result, SessionConfig};

/// Outcome of a non-blocking read from the peer.
#[derive(Debug)]
pub enum ReadOutcome {
    /// Bytes were read
    Data(Vec<u8>),
    /// The peer closed the connection in an orderly way
    Empty,
    /// No data available right now
    WouldBlock,
    /// The read failed; the connection has been torn down
    Error(std::io::Error),
}

/// Whether a teardown call actually closed something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    Closed,
    AlreadyClosed,
}

impl Teardown {
    fn merge(self, other: Teardown) -> Teardown {
        if self == Teardown::Closed || other == Teardown::Closed {
            Teardown::Closed
        } else {
            Teardown::AlreadyClosed
        }
    }
}

/// The one active peer
#[derive(Debug)]
struct PeerConnection {
    stream: TcpStream,
    addr: SocketAddr,
}

/// Owns the listening endpoint and at most one peer connection.
#[derive(Debug)]
pub struct ConnectionManager {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    peer: Option<PeerConnection>,
    /// Read target reused across ticks; grows to the largest `max_bytes` seen
    scratch: Vec<u8>,
    failed_accepts: u32,
    /// Accept errors other than `WouldBlock` since the last successful accept
    accept_errors: u32,
    deaths: u32,
    death_threshold: u32,
    accept_log_interval: u32,
    terminated: bool,
}

impl ConnectionManager {
    /// Bind a non-blocking listening endpoint with address reuse enabled.
    ///
    /// # Errors
    ///
    /// [`TelemetryError::Bind`](crate::TelemetryError::Bind) when the address is
    /// invalid or already in use. This is fatal for startup.
    pub fn bind(address: &str, port: u16) -> Result<Self> {
        let config = SessionConfig::default().with_address(address).with_port(port);
        Self::from_config(&config)
    }

    /// Bind using the address, port, and thresholds of `config`.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        let addr = config.socket_addr()?;
        let listener = endpoint::bind_listener(addr)?;
        let local_addr = listener.local_addr().unwrap_or(addr);

        info!(address = %local_addr, "Telemetry endpoint listening");

        Ok(Self {
            listener: Some(listener),
            local_addr,
            peer: None,
            scratch: Vec::new(),
            failed_accepts: 0,
            accept_errors: 0,
            deaths: 0,
            death_threshold: config.death_threshold.max(1),
            accept_log_interval: config.accept_log_interval.max(1),
            terminated: false,
        })
    }

    /// Accept a pending peer if there is one.
    ///
    /// Returns the peer address on success. Returns `None` when nobody is
    /// waiting, when a peer is already connected (the current session is kept),
    /// or when the manager has been terminated.
    pub fn try_accept(&mut self) -> Option<SocketAddr> {
        if self.peer.is_some() {
            debug!("Accept ignored, connection slot occupied");
            return None;
        }
        let listener = self.listener.as_ref()?;

        match listener.accept() {
            Ok((stream, addr)) => {
                if let Err(e) = stream.set_nonblocking(true) {
                    warn!(peer = %addr, "Failed to make peer socket non-blocking: {}", e);
                    return None;
                }
                if let Err(e) = stream.set_nodelay(true) {
                    debug!(peer = %addr, "Failed to set TCP_NODELAY: {}", e);
                }

                info!(
                    peer = %addr,
                    after_attempts = self.failed_accepts,
                    "Telemetry source connected"
                );
                self.failed_accepts = 0;
                self.accept_errors = 0;
                self.peer = Some(PeerConnection { stream, addr });
                Some(addr)
            }
            Err(e) => {
                self.failed_accepts = self.failed_accepts.saturating_add(1);
                if e.kind() != ErrorKind::WouldBlock {
                    if self.note_accept_error() {
                        warn!(errors = self.accept_errors, "Accept failed: {}", e);
                    }
                } else if self.failed_accepts % self.accept_log_interval == 0 {
                    debug!(
                        attempts = self.failed_accepts,
                        "Waiting for telemetry source to connect"
                    );
                }
                None
            }
        }
    }

    /// Read up to `max_bytes` from the peer without blocking.
    ///
    /// An empty read tears the connection down and counts one death; reaching
    /// the death threshold terminates the manager. Any other read error tears
    /// the connection down without counting.
    pub fn try_read(&mut self, max_bytes: usize) -> ReadOutcome {
        let Some(peer) = self.peer.as_mut() else {
            return ReadOutcome::Error(std::io::Error::new(
                ErrorKind::NotConnected,
                "no telemetry source connected",
            ));
        };

        let want = max_bytes.max(1);
        if self.scratch.len() < want {
            self.scratch.resize(want, 0);
        }
        match peer.stream.read(&mut self.scratch[..want]) {
            Ok(0) => {
                let addr = peer.addr;
                self.disconnect();
                self.deaths = self.deaths.saturating_add(1);
                info!(
                    peer = %addr,
                    deaths = self.deaths,
                    "Telemetry source closed the connection"
                );

                if self.deaths >= self.death_threshold {
                    info!(deaths = self.deaths, "Death threshold reached, shutting endpoint down");
                    self.terminate();
                }
                ReadOutcome::Empty
            }
            Ok(n) => {
                trace!("Read {} bytes", n);
                ReadOutcome::Data(self.scratch[..n].to_vec())
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                ReadOutcome::WouldBlock
            }
            Err(e) => {
                warn!(peer = %peer.addr, "Read failed, dropping connection: {}", e);
                self.disconnect();
                ReadOutcome::Error(e)
            }
        }
    }

    /// Count an accept error; true for the first of a run and every
    /// `accept_log_interval`-th after it.
    fn note_accept_error(&mut self) -> bool {
        self.accept_errors = self.accept_errors.saturating_add(1);
        (self.accept_errors - 1) % self.accept_log_interval == 0
    }

    /// Close the peer connection, keeping the endpoint listening.
    pub fn disconnect(&mut self) -> Teardown {
        match self.peer.take() {
            Some(peer) => {
                if let Err(e) = peer.stream.shutdown(std::net::Shutdown::Both) {
                    // Already shut down by the peer; dropping the stream closes it
                    trace!("Peer shutdown returned: {}", e);
                }
                debug!(peer = %peer.addr, "Connection closed");
                Teardown::Closed
            }
            None => {
                debug!("Disconnect ignored, no connection open");
                Teardown::AlreadyClosed
            }
        }
    }

    /// Close the listening endpoint. New peers can no longer connect.
    pub fn close_endpoint(&mut self) -> Teardown {
        match self.listener.take() {
            Some(_) => {
                debug!(address = %self.local_addr, "Endpoint closed");
                Teardown::Closed
            }
            None => {
                debug!("Endpoint close ignored, already closed");
                Teardown::AlreadyClosed
            }
        }
    }

    /// Close both the connection and the endpoint. Idempotent.
    pub fn close(&mut self) -> Teardown {
        let connection = self.disconnect();
        let endpoint = self.close_endpoint();
        connection.merge(endpoint)
    }

    fn terminate(&mut self) {
        self.close();
        self.terminated = true;
    }

    pub fn is_endpoint_alive(&self) -> bool {
        self.listener.is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.peer.is_some()
    }

    /// Whether the death threshold shut the manager down for good.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Orderly peer closes seen so far.
    pub fn death_count(&self) -> u32 {
        self.deaths
    }

    pub fn death_threshold(&self) -> u32 {
        self.death_threshold
    }

    /// Consecutive accept attempts that found no pending peer.
    pub fn failed_accepts(&self) -> u32 {
        self.failed_accepts
    }

    /// Address the endpoint is bound to (with the real port when bound to port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer.as_ref().map(|peer| peer.addr)
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.close();
    }
}
