//! Episode recorder: the ordered log of raw records from one connection

use crate::types::Record;
use crate::{Result, TelemetryError};

/// Ordered in-memory log of every record received since the last (re)connection.
///
/// Growth is unbounded within one connection; an episode is one flight.
#[derive(Debug, Default, Clone)]
pub struct EpisodeRecorder {
    records: Vec<Record>,
}

impl EpisodeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the end of the episode.
    pub fn record(&mut self, raw: Record) {
        self.records.push(raw);
    }

    /// Forget the current episode.
    pub fn reset(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `index`; out of range is a caller bug reported as [`TelemetryError::Index`].
    pub fn get(&self, index: usize) -> Result<&Record> {
        self.records.get(index).ok_or(TelemetryError::Index { index, len: self.records.len() })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }
}
