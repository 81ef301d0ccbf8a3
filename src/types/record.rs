//! Raw record type

use std::ops::Deref;
use std::sync::Arc;

/// One raw, exact-size telemetry record in network byte order.
///
/// This is the unit that flows from the frame decoder into the episode log and the
/// codec. Bytes are shared via `Arc`, so cloning a record never copies the payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record(Arc<[u8]>);

impl Record {
    /// Copy a byte slice into a new record.
    pub fn copy_from_slice(bytes: &[u8]) -> Self {
        Self(Arc::from(bytes))
    }

    /// Raw bytes of the record.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Record {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }
}

impl Deref for Record {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Record {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
