//! Pose sender: the simulator side of the link
//!
//! Connects to a listening endpoint and writes encoded records, appending the
//! delimiter after each body in sentinel mode. Writes are blocking; the sender
//! is meant for simulators, test rigs, and the `flightline-send` tool.

use std::io::Write;
use std::net::{Shutdown, SocketAddr, TcpStream};
use tracing::{debug, info, trace};

use crate::codec::RecordCodec;
use crate::framing::FramingMode;
use crate::types::{PoseSample, RecordLayout};
use crate::{Result, TelemetryError};

/// Blocking client that streams pose records to an endpoint.
#[derive(Debug)]
pub struct PoseSender {
    stream: Option<TcpStream>,
    peer: SocketAddr,
    codec: RecordCodec,
    framing: FramingMode,
    sent: u64,
}

impl PoseSender {
    /// Connect to `addr`.
    ///
    /// # Errors
    ///
    /// [`TelemetryError::Connection`] when nothing is listening at `addr`.
    pub fn connect(addr: SocketAddr, layout: RecordLayout, framing: FramingMode) -> Result<Self> {
        let stream = TcpStream::connect(addr).map_err(|e| {
            let reason = format!("connect to {addr}");
            TelemetryError::connection_failed_with_source(reason, Box::new(e))
        })?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY: {}", e);
        }

        info!(peer = %addr, layout = ?layout, framing = ?framing, "Pose sender connected");
        Ok(Self {
            stream: Some(stream),
            peer: addr,
            codec: RecordCodec::new(layout),
            framing,
            sent: 0,
        })
    }

    /// Encode and send one sample.
    pub fn send(&mut self, sample: &PoseSample) -> Result<()> {
        let record = self.codec.encode(sample);
        self.send_raw(record.as_bytes())
    }

    /// Send one record body as-is, followed by the delimiter in sentinel mode.
    ///
    /// The body is not checked against the layout size, so malformed traffic can
    /// be produced on purpose.
    pub fn send_raw(&mut self, body: &[u8]) -> Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| TelemetryError::connection_failed("sender already closed"))?;

        let mut frame = Vec::with_capacity(self.framing.wire_size(body.len()));
        frame.extend_from_slice(body);
        if let FramingMode::Sentinel { delimiter } = self.framing {
            frame.push(delimiter);
        }

        stream.write_all(&frame).map_err(|e| {
            let reason = format!("write to {}", self.peer);
            TelemetryError::connection_failed_with_source(reason, Box::new(e))
        })?;
        self.sent += 1;
        trace!("Sent record {} ({} bytes)", self.sent, frame.len());
        Ok(())
    }

    /// Records sent so far
    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn layout(&self) -> RecordLayout {
        self.codec.layout()
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Flush and close the connection. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        stream.flush()?;
        if let Err(e) = stream.shutdown(Shutdown::Both) {
            trace!("Sender shutdown returned: {}", e);
        }
        debug!(peer = %self.peer, sent = self.sent, "Pose sender closed");
        Ok(())
    }
}

impl Drop for PoseSender {
    fn drop(&mut self) {
        self.close().ok();
    }
}
