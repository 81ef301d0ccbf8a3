//! Fixed-width framing

use super::{FramingStats, ReceiveBuffer};
use crate::types::Record;

/// Slice records of exactly `record_size` bytes off the front of the buffer.
pub(super) fn extract(
    buffer: &mut ReceiveBuffer,
    record_size: usize,
    stats: &mut FramingStats,
) -> Vec<Record> {
    let ready = buffer.len() / record_size;
    let mut records = Vec::with_capacity(ready);

    for _ in 0..ready {
        records.push(Record::copy_from_slice(&buffer.unread()[..record_size]));
        buffer.consume(record_size);
    }

    stats.records += records.len() as u64;
    records
}
