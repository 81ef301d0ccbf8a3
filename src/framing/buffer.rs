//! Receive buffer with a consumed-offset cursor

/// Growable byte arena holding bytes read from the connection but not yet
/// resolved into records.
///
/// Consumption only advances an offset; the consumed prefix is dropped by
/// [`ReceiveBuffer::compact`] once per extraction pass, so slicing several records
/// out of one read never shifts the remaining bytes more than once.
#[derive(Debug, Default, Clone)]
pub struct ReceiveBuffer {
    data: Vec<u8>,
    consumed: usize,
}

impl ReceiveBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { data: Vec::with_capacity(capacity), consumed: 0 }
    }

    /// Append freshly read bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Unconsumed bytes, oldest first.
    pub fn unread(&self) -> &[u8] {
        &self.data[self.consumed..]
    }

    /// Number of unconsumed bytes.
    pub fn len(&self) -> usize {
        self.data.len() - self.consumed
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mark the first `count` unread bytes as consumed.
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds the unread length; the decoders only consume
    /// bytes they have already inspected.
    pub fn consume(&mut self, count: usize) {
        assert!(count <= self.len(), "consume({count}) past end of {} unread bytes", self.len());
        self.consumed += count;
    }

    /// Drop the consumed prefix.
    pub fn compact(&mut self) {
        if self.consumed == 0 {
            return;
        }
        if self.consumed == self.data.len() {
            self.data.clear();
        } else {
            self.data.drain(..self.consumed);
        }
        self.consumed = 0;
    }

    /// Discard everything, e.g. when a new peer connects.
    pub fn clear(&mut self) {
        self.data.clear();
        self.consumed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_then_compact_keeps_tail() {
        let mut buffer = ReceiveBuffer::new();
        buffer.extend(b"abcdef");
        buffer.consume(4);
        assert_eq!(buffer.unread(), b"ef");

        buffer.compact();
        assert_eq!(buffer.unread(), b"ef");
        assert_eq!(buffer.len(), 2);

        buffer.extend(b"gh");
        assert_eq!(buffer.unread(), b"efgh");
    }

    #[test]
    fn compact_after_full_consumption_empties() {
        let mut buffer = ReceiveBuffer::with_capacity(8);
        buffer.extend(b"1234");
        buffer.consume(4);
        buffer.compact();
        assert!(buffer.is_empty());
    }

    #[test]
    #[should_panic(expected = "past end")]
    fn consuming_past_end_panics() {
        let mut buffer = ReceiveBuffer::new();
        buffer.extend(b"ab");
        buffer.consume(3);
    }
}
