//! Stream framing: locating record boundaries in the receive buffer.
//!
//! The protocol evolved between two framing strategies, and both ends agree on
//! one out of band through [`FramingMode`]:
//!
//! - **Fixed-width**: a record is exactly `record_size` bytes, back to back.
//! - **Sentinel-delimited**: each record body is followed by one delimiter byte
//!   (`*` by default). Segments of the wrong length between delimiters are
//!   dropped, which lets the stream resynchronize after garbage.
//!
//! Extraction never blocks and never fails. Trailing partial data stays buffered
//! until more bytes arrive, and calling [`FrameDecoder::extract_ready`] again
//! without new bytes yields nothing.
//!
//! ```rust
//! use flightline::framing::{FrameDecoder, FramingMode, ReceiveBuffer};
//!
//! let mut decoder = FrameDecoder::new(FramingMode::FixedWidth, 4);
//! let mut buffer = ReceiveBuffer::new();
//!
//! buffer.extend(b"abcdef");
//! assert_eq!(decoder.extract_ready(&mut buffer).len(), 1);
//! buffer.extend(b"gh");
//! assert_eq!(decoder.extract_ready(&mut buffer)[0].as_bytes(), b"efgh");
//! assert!(buffer.is_empty());
//! ```

mod buffer;
mod fixed;
mod sentinel;

pub use buffer::ReceiveBuffer;

use serde::{Deserialize, Serialize};

use crate::types::Record;

/// Default record delimiter for sentinel framing
pub const DEFAULT_DELIMITER: u8 = b'*';

/// How record boundaries are found in the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum FramingMode {
    /// Boundaries every `record_size` bytes
    #[default]
    FixedWidth,

    /// Each body of `record_size` bytes is followed by `delimiter`
    Sentinel {
        #[serde(default = "default_delimiter")]
        delimiter: u8,
    },
}

fn default_delimiter() -> u8 {
    DEFAULT_DELIMITER
}

impl FramingMode {
    /// Sentinel framing with the default `*` delimiter.
    pub const fn sentinel() -> Self {
        FramingMode::Sentinel { delimiter: DEFAULT_DELIMITER }
    }

    /// Bytes one record occupies on the wire, including any delimiter.
    pub const fn wire_size(self, record_size: usize) -> usize {
        match self {
            FramingMode::FixedWidth => record_size,
            FramingMode::Sentinel { .. } => record_size + 1,
        }
    }
}

/// Running counters kept by a [`FrameDecoder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FramingStats {
    /// Records emitted
    pub records: u64,
    /// Wrong-length sentinel segments dropped
    pub discarded_segments: u64,
    /// Bytes inside dropped segments, delimiters excluded
    pub discarded_bytes: u64,
    /// Delimiter bytes consumed
    pub delimiter_bytes: u64,
}

/// Extracts complete records from a [`ReceiveBuffer`].
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    mode: FramingMode,
    record_size: usize,
    stats: FramingStats,
}

impl FrameDecoder {
    /// Create a decoder for records of `record_size` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `record_size` is zero.
    pub fn new(mode: FramingMode, record_size: usize) -> Self {
        assert!(record_size > 0, "record size must be non-zero");
        Self { mode, record_size, stats: FramingStats::default() }
    }

    pub fn mode(&self) -> FramingMode {
        self.mode
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    pub fn stats(&self) -> FramingStats {
        self.stats
    }

    /// Slice every complete record out of `buffer`, oldest first.
    ///
    /// Consumed bytes are compacted away once at the end of the pass.
    pub fn extract_ready(&mut self, buffer: &mut ReceiveBuffer) -> Vec<Record> {
        let records = match self.mode {
            FramingMode::FixedWidth => fixed::extract(buffer, self.record_size, &mut self.stats),
            FramingMode::Sentinel { delimiter } => {
                sentinel::extract(buffer, self.record_size, delimiter, &mut self.stats)
            }
        };
        buffer.compact();
        records
    }
}
