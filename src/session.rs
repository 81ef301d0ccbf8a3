//! Poll step orchestrator
//!
//! [`TelemetrySession`] owns every piece of mutable ingest state (connection
//! manager, receive buffer, frame decoder, episode, replay cursor) and advances
//! it by one step per external tick. Nothing here blocks or spawns; a host timer
//! (or the tokio [`Driver`](crate::driver::Driver)) calls [`TelemetrySession::poll`]
//! at a fixed cadence.
//!
//! ## Per-tick order
//!
//! 1. Cancellation observed: tear everything down.
//! 2. No peer: try one non-blocking accept.
//! 3. Replaying: step the replay; a replayed sample ends the tick.
//! 4. Still no peer: nothing to read.
//! 5. One non-blocking read; decode and dispatch every complete record.
//! 6. Death threshold reached: tear everything down.

use std::net::SocketAddr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::codec::RecordCodec;
use crate::connection::{ConnectionManager, ReadOutcome, Teardown};
use crate::consumer::PoseConsumer;
use crate::episode::EpisodeRecorder;
use crate::framing::{FrameDecoder, FramingStats, ReceiveBuffer};
use crate::replay::{ReplayController, ReplayState};
use crate::{Result, SessionConfig};

/// What one call to [`TelemetrySession::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Cancellation was observed; the session is shut down
    Cancelled,
    /// The session is shut down (death threshold or explicit shutdown)
    Terminated,
    /// No peer connected and nothing replayed
    Idle,
    /// One replayed sample was dispatched
    Replayed,
    /// Connected, but no bytes were available
    Waiting,
    /// Bytes were read; `records` samples were dispatched (possibly zero)
    Received { records: usize },
    /// The peer closed the connection
    PeerClosed,
    /// The read failed and the connection was dropped
    ReadFailed,
}

impl PollOutcome {
    /// Whether further polls can do anything.
    pub fn is_final(self) -> bool {
        matches!(self, PollOutcome::Cancelled | PollOutcome::Terminated)
    }
}

/// Single-owner ingest state advanced one tick at a time.
pub struct TelemetrySession<C> {
    manager: ConnectionManager,
    buffer: ReceiveBuffer,
    decoder: FrameDecoder,
    codec: RecordCodec,
    episode: EpisodeRecorder,
    replay: ReplayController,
    consumer: C,
    read_buffer_size: usize,
    tick_interval: Duration,
    cancel: CancellationToken,
    shut_down: bool,
}

impl<C: PoseConsumer> TelemetrySession<C> {
    /// Bind the endpoint described by `config` and build a session around it.
    pub fn bind(config: &SessionConfig, consumer: C) -> Result<Self> {
        config.validate()?;
        let manager = ConnectionManager::from_config(config)?;
        Ok(Self::with_manager(manager, config, consumer))
    }

    /// Build a session around an already-bound manager.
    pub fn with_manager(manager: ConnectionManager, config: &SessionConfig, consumer: C) -> Self {
        let record_size = config.record_size();
        Self {
            manager,
            buffer: ReceiveBuffer::with_capacity(config.read_buffer_size + record_size),
            decoder: FrameDecoder::new(config.framing, record_size),
            codec: RecordCodec::new(config.layout),
            episode: EpisodeRecorder::new(),
            replay: ReplayController::new(),
            consumer,
            read_buffer_size: config.read_buffer_size.max(1),
            tick_interval: config.tick_interval(),
            cancel: CancellationToken::new(),
            shut_down: false,
        }
    }

    /// Advance the session by one tick.
    ///
    /// Only internal invariant violations surface as errors; every transport
    /// condition is reported through [`PollOutcome`].
    pub fn poll(&mut self) -> Result<PollOutcome> {
        if self.cancel.is_cancelled() {
            if !self.shut_down {
                info!("Cancellation observed, shutting telemetry session down");
                self.shutdown();
            }
            return Ok(PollOutcome::Cancelled);
        }
        if self.shut_down || self.manager.is_terminated() {
            self.shutdown();
            return Ok(PollOutcome::Terminated);
        }

        if !self.manager.is_connected() {
            self.try_accept();
        }

        if self.replay.is_replaying() {
            let live = self.manager.is_connected();
            if let Some(sample) = self.replay.step(&self.episode, &self.codec, live)? {
                trace!("Replayed record {}", self.replay.cursor());
                self.consumer.on_pose(&sample);
                return Ok(PollOutcome::Replayed);
            }
            // Replay ended or was preempted; fall through to live data this tick
        }

        if !self.manager.is_connected() {
            return Ok(PollOutcome::Idle);
        }

        let outcome = match self.manager.try_read(self.read_buffer_size) {
            ReadOutcome::Data(bytes) => {
                let records = self.ingest(&bytes)?;
                PollOutcome::Received { records }
            }
            ReadOutcome::WouldBlock => PollOutcome::Waiting,
            ReadOutcome::Empty => {
                self.buffer.clear();
                PollOutcome::PeerClosed
            }
            ReadOutcome::Error(e) => {
                warn!("Telemetry read failed: {}", e);
                self.buffer.clear();
                PollOutcome::ReadFailed
            }
        };

        if self.manager.is_terminated() {
            info!(
                deaths = self.manager.death_count(),
                "Telemetry source gone for good, ending session"
            );
            self.shutdown();
            return Ok(PollOutcome::Terminated);
        }

        Ok(outcome)
    }

    /// Accept a pending peer; a new peer starts a fresh episode.
    ///
    /// Returns the peer address when a connection was accepted.
    pub fn try_accept(&mut self) -> Option<SocketAddr> {
        let peer = self.manager.try_accept()?;
        if !self.episode.is_empty() {
            debug!(records = self.episode.len(), "Discarding previous episode");
        }
        self.episode.reset();
        self.buffer.clear();
        self.replay.reset();
        Some(peer)
    }

    /// Append `bytes`, then decode and dispatch every complete record in order.
    fn ingest(&mut self, bytes: &[u8]) -> Result<usize> {
        self.buffer.extend(bytes);
        let records = self.decoder.extract_ready(&mut self.buffer);
        let count = records.len();

        for record in records {
            self.episode.record(record.clone());
            let sample = self.codec.decode(&record)?;
            self.consumer.on_pose(&sample);
        }

        trace!(records = count, buffered = self.buffer.len(), "Ingested {} bytes", bytes.len());
        Ok(count)
    }

    /// Flip replay of the current episode on or off.
    pub fn toggle_replay(&mut self) -> ReplayState {
        let state = self.replay.toggle();
        info!(state = ?state, records = self.episode.len(), "Replay toggled");
        state
    }

    /// Close the connection and the endpoint. Idempotent.
    pub fn shutdown(&mut self) -> Teardown {
        self.shut_down = true;
        self.replay.reset();
        self.buffer.clear();
        self.manager.close()
    }

    /// Token that, once cancelled, makes the next poll shut the session down.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cadence the host is expected to poll at.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn episode(&self) -> &EpisodeRecorder {
        &self.episode
    }

    pub fn replay(&self) -> &ReplayController {
        &self.replay
    }

    /// Bytes buffered but not yet resolved into records.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn framing_stats(&self) -> FramingStats {
        self.decoder.stats()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.manager.local_addr()
    }

    pub fn consumer(&self) -> &C {
        &self.consumer
    }

    pub fn consumer_mut(&mut self) -> &mut C {
        &mut self.consumer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::PoseLog;
    use crate::framing::FramingMode;
    use crate::test_utils::{
        LOOPBACK_TIMEOUT, encode_stream, loopback_config, synthetic_ascent, wait_until,
    };
    use crate::types::RecordLayout;
    use std::io::Write;
    use std::net::TcpStream;

    fn session(layout: RecordLayout, framing: FramingMode) -> TelemetrySession<PoseLog> {
        TelemetrySession::bind(&loopback_config(layout, framing), PoseLog::new())
            .expect("bind loopback session")
    }

    /// Poll until the session has a peer.
    fn connect(session: &mut TelemetrySession<PoseLog>) -> TcpStream {
        let client = TcpStream::connect(session.local_addr()).expect("connect");
        assert!(wait_until(LOOPBACK_TIMEOUT, || {
            session.poll().unwrap();
            session.manager().is_connected()
        }));
        client
    }

    /// Poll until the consumer holds `count` samples.
    fn poll_for(session: &mut TelemetrySession<PoseLog>, count: usize) {
        assert!(
            wait_until(LOOPBACK_TIMEOUT, || {
                session.poll().unwrap();
                session.consumer().len() >= count
            }),
            "only {} of {} samples arrived",
            session.consumer().len(),
            count
        );
    }

    /// Poll until the peer close is observed.
    fn poll_until_closed(session: &mut TelemetrySession<PoseLog>) -> PollOutcome {
        let mut last = PollOutcome::Idle;
        wait_until(LOOPBACK_TIMEOUT, || {
            last = session.poll().unwrap();
            matches!(last, PollOutcome::PeerClosed | PollOutcome::Terminated)
        });
        last
    }

    #[test]
    fn idle_without_peer() {
        let mut session = session(RecordLayout::Packed32, FramingMode::FixedWidth);
        assert_eq!(session.poll().unwrap(), PollOutcome::Idle);
        assert_eq!(session.manager().failed_accepts(), 1);
    }

    #[test]
    fn live_records_reach_consumer_and_episode_in_order() {
        let mut session = session(RecordLayout::Packed32, FramingMode::FixedWidth);
        let mut client = connect(&mut session);
        let samples = synthetic_ascent(25);

        client
            .write_all(&encode_stream(RecordLayout::Packed32, FramingMode::FixedWidth, &samples))
            .unwrap();
        poll_for(&mut session, samples.len());

        let codec = RecordCodec::new(RecordLayout::Packed32);
        let expected: Vec<_> =
            samples.iter().map(|s| codec.decode(&codec.encode(s)).unwrap()).collect();
        assert_eq!(session.consumer().samples(), expected.as_slice());
        assert_eq!(session.episode().len(), samples.len());
        assert_eq!(session.buffered(), 0);
    }

    #[test]
    fn partial_record_waits_for_the_rest() {
        let mut session = session(RecordLayout::Tagged64, FramingMode::FixedWidth);
        let mut client = connect(&mut session);
        let stream = vec![0x01u8; 58];

        client.write_all(&stream[..30]).unwrap();
        assert!(wait_until(LOOPBACK_TIMEOUT, || {
            session.poll().unwrap();
            session.buffered() == 30
        }));
        assert!(session.consumer().is_empty());

        client.write_all(&stream[30..]).unwrap();
        poll_for(&mut session, 1);
        assert_eq!(session.buffered(), 0);
        assert_eq!(session.episode().get(0).unwrap().as_bytes(), stream.as_slice());
    }

    #[test]
    fn sentinel_session_skips_garbage() {
        let layout = RecordLayout::Interleaved64;
        let mut session = session(layout, FramingMode::sentinel());
        let mut client = connect(&mut session);
        let samples = synthetic_ascent(2);

        let mut stream = encode_stream(layout, FramingMode::sentinel(), &samples[..1]);
        stream.extend_from_slice(&[0x10; 10]);
        stream.push(b'*');
        stream.extend(encode_stream(layout, FramingMode::sentinel(), &samples[1..]));
        client.write_all(&stream).unwrap();

        poll_for(&mut session, 2);
        assert_eq!(session.consumer().len(), 2);
        assert_eq!(session.framing_stats().discarded_segments, 1);
    }

    #[test]
    fn sentinel_session_from_yaml_receives_records() {
        let yaml = "port: 0\nlayout: interleaved64\nframing:\n  sentinel: {}\n";
        let config = crate::SessionConfig::from_yaml_str(yaml).unwrap();
        let mut session = TelemetrySession::bind(&config, PoseLog::new()).unwrap();
        let mut client = connect(&mut session);
        let samples = synthetic_ascent(5);

        let layout = RecordLayout::Interleaved64;
        client.write_all(&encode_stream(layout, FramingMode::sentinel(), &samples)).unwrap();
        poll_for(&mut session, samples.len());

        let stats = session.framing_stats();
        assert_eq!(stats.records, 5);
        assert_eq!(stats.delimiter_bytes, 5);
        assert_eq!(stats.discarded_segments, 0);
        assert_eq!(session.episode().len(), 5);
    }

    #[test]
    fn reconnect_starts_a_fresh_episode() {
        let mut session = session(RecordLayout::Packed32, FramingMode::FixedWidth);
        let samples = synthetic_ascent(4);
        let bytes = encode_stream(RecordLayout::Packed32, FramingMode::FixedWidth, &samples);

        let mut first = connect(&mut session);
        first.write_all(&bytes).unwrap();
        poll_for(&mut session, 4);
        assert_eq!(session.episode().len(), 4);

        drop(first);
        assert_eq!(poll_until_closed(&mut session), PollOutcome::PeerClosed);
        assert_eq!(session.episode().len(), 4, "episode survives until the next accept");

        let _second = connect(&mut session);
        assert_eq!(session.episode().len(), 0);
        assert_eq!(session.manager().death_count(), 1);
    }

    #[test]
    fn replay_after_disconnect_then_falls_through() {
        let mut session = session(RecordLayout::Tagged64, FramingMode::FixedWidth);
        let samples = synthetic_ascent(3);
        let mut client = connect(&mut session);
        client
            .write_all(&encode_stream(RecordLayout::Tagged64, FramingMode::FixedWidth, &samples))
            .unwrap();
        poll_for(&mut session, 3);
        drop(client);
        poll_until_closed(&mut session);

        let live = session.consumer_mut().drain();
        assert_eq!(session.toggle_replay(), ReplayState::Replaying);
        for _ in 0..3 {
            assert_eq!(session.poll().unwrap(), PollOutcome::Replayed);
        }
        // Fourth tick: replay self-terminates and the tick falls through to live handling
        assert_eq!(session.poll().unwrap(), PollOutcome::Idle);
        assert_eq!(session.replay().state(), ReplayState::Idle);
        assert_eq!(session.consumer().samples(), live.as_slice());
    }

    #[test]
    fn live_peer_preempts_replay() {
        let mut session = session(RecordLayout::Packed32, FramingMode::FixedWidth);
        let _client = connect(&mut session);

        session.toggle_replay();
        let outcome = session.poll().unwrap();
        assert!(matches!(outcome, PollOutcome::Waiting | PollOutcome::Received { .. }));
        assert_eq!(session.replay().state(), ReplayState::Idle);
    }

    #[test]
    fn death_threshold_ends_the_session() {
        let config = loopback_config(RecordLayout::Packed32, FramingMode::FixedWidth)
            .with_death_threshold(2);
        let mut session = TelemetrySession::bind(&config, PoseLog::new()).unwrap();

        let first = connect(&mut session);
        drop(first);
        assert_eq!(poll_until_closed(&mut session), PollOutcome::PeerClosed);

        let second = connect(&mut session);
        drop(second);
        assert_eq!(poll_until_closed(&mut session), PollOutcome::Terminated);

        assert!(session.is_shut_down());
        assert!(!session.manager().is_endpoint_alive());
        assert_eq!(session.poll().unwrap(), PollOutcome::Terminated);
    }

    #[test]
    fn cancellation_closes_everything_on_the_next_tick() {
        let mut session = session(RecordLayout::Packed32, FramingMode::FixedWidth);
        let _client = connect(&mut session);
        let cancel = session.cancel_token();

        cancel.cancel();
        assert_eq!(session.poll().unwrap(), PollOutcome::Cancelled);
        assert!(!session.manager().is_connected());
        assert!(!session.manager().is_endpoint_alive());
        assert!(session.poll().unwrap().is_final());
    }

    #[test]
    fn shutdown_is_idempotent() {
        let mut session = session(RecordLayout::Packed32, FramingMode::FixedWidth);
        assert_eq!(session.shutdown(), Teardown::Closed);
        assert_eq!(session.shutdown(), Teardown::AlreadyClosed);
        assert_eq!(session.poll().unwrap(), PollOutcome::Terminated);
    }
}
