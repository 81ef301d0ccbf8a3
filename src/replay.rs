//! Replay controller for the recorded episode
//!
//! Plays the current episode back into the pose consumer, one record per tick.
//! Live traffic always wins: a step taken while a peer is connected drops the
//! controller back to [`ReplayState::Idle`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::RecordCodec;
use crate::episode::EpisodeRecorder;
use crate::types::PoseSample;
use crate::Result;

/// Replay state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum ReplayState {
    #[default]
    Idle,
    Replaying,
}

/// Replay cursor plus state.
#[derive(Debug, Default, Clone)]
pub struct ReplayController {
    state: ReplayState,
    cursor: usize,
}

impl ReplayController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ReplayState {
        self.state
    }

    pub fn is_replaying(&self) -> bool {
        self.state == ReplayState::Replaying
    }

    /// Index of the next record to replay.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Flip between idle and replaying; starting a replay rewinds to the first record.
    pub fn toggle(&mut self) -> ReplayState {
        self.state = match self.state {
            ReplayState::Idle => {
                self.cursor = 0;
                ReplayState::Replaying
            }
            ReplayState::Replaying => ReplayState::Idle,
        };
        debug!("Replay toggled to {:?}", self.state);
        self.state
    }

    /// Back to idle at the start of the episode.
    pub fn reset(&mut self) {
        self.state = ReplayState::Idle;
        self.cursor = 0;
    }

    /// Advance the replay by one record.
    ///
    /// Returns `Ok(None)` when idle, when preempted by a live connection, or when
    /// the episode is exhausted (the last two also return the controller to idle).
    pub fn step(
        &mut self,
        episode: &EpisodeRecorder,
        codec: &RecordCodec,
        live: bool,
    ) -> Result<Option<PoseSample>> {
        if self.state != ReplayState::Replaying {
            return Ok(None);
        }

        if live {
            debug!("Live connection open, replay preempted at record {}", self.cursor);
            self.state = ReplayState::Idle;
            return Ok(None);
        }

        if self.cursor >= episode.len() {
            debug!("Replay finished after {} records", episode.len());
            self.cursor = episode.len();
            self.state = ReplayState::Idle;
            return Ok(None);
        }

        let sample = codec.decode(episode.get(self.cursor)?)?;
        self.cursor += 1;
        Ok(Some(sample))
    }
}
