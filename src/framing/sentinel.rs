//! Sentinel-delimited framing
//!
//! Each record body is followed by a single delimiter byte. The delimiter is first
//! looked for at the fixed body offset, so delimiter-valued bytes inside a binary
//! payload are not mistaken for boundaries. When that position holds something
//! else, the stream is out of sync: everything up to the next delimiter is a
//! candidate of the wrong length and gets dropped.
//!
//! Every decision below only looks at bytes that are already buffered and never
//! at the buffer end, which keeps the output independent of how the transport
//! chunked the stream.

use tracing::debug;

use super::{FramingStats, ReceiveBuffer};
use crate::types::Record;

pub(super) fn extract(
    buffer: &mut ReceiveBuffer,
    body_len: usize,
    delimiter: u8,
    stats: &mut FramingStats,
) -> Vec<Record> {
    let mut records = Vec::new();

    loop {
        let unread = buffer.unread();
        // Need the body plus the byte at the delimiter offset to decide anything
        if unread.len() <= body_len {
            break;
        }

        if unread[body_len] == delimiter {
            records.push(Record::copy_from_slice(&unread[..body_len]));
            buffer.consume(body_len + 1);
            stats.records += 1;
            stats.delimiter_bytes += 1;
            continue;
        }

        match unread.iter().position(|&b| b == delimiter) {
            Some(end) => {
                debug!("Discarding {}-byte segment (expected {}-byte body)", end, body_len);
                buffer.consume(end + 1);
                stats.discarded_segments += 1;
                stats.discarded_bytes += end as u64;
                stats.delimiter_bytes += 1;
            }
            // Oversized candidate still open; wait for its delimiter
            None => break,
        }
    }

    records
}
