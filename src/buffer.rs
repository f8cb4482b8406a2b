//! The hold buffer: a bounded FIFO that keeps console output back while delivery is deferred.
//!
//! While a passphrase prompt owns the consoles, or while any sink is blocked, relay output lands
//! here instead and is drained in order once the consoles are free again. The buffer never
//! grows; input that does not fit is silently dropped.

use alloc::{boxed::Box, vec};

/// A linear byte FIFO over a fixed allocation, with live data at `[head, tail)`.
#[derive(Debug)]
pub struct HoldBuffer {
    buf: Box<[u8]>,
    head: usize,
    tail: usize,
}
impl HoldBuffer {
    /// Creates a buffer holding at most `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity].into_boxed_slice(),
            head: 0,
            tail: 0,
        }
    }

    /// The fixed capacity of the buffer.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// How many bytes are waiting to be delivered.
    #[must_use]
    pub fn available(&self) -> usize {
        self.tail - self.head
    }

    /// Whether nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// How many more bytes an append could take right now.
    #[must_use]
    pub fn room(&self) -> usize {
        self.buf.len() - self.tail
    }

    /// Appends the given bytes, keeping arrival order. A chunk larger than the remaining room is
    /// dropped whole; returns whether the bytes were taken.
    pub fn append(&mut self, bytes: &[u8]) -> bool {
        if bytes.len() > self.room() {
            return false;
        }
        self.buf[self.tail..self.tail + bytes.len()].copy_from_slice(bytes);
        self.tail += bytes.len();
        true
    }

    /// The oldest undelivered bytes, at most `limit` of them.
    #[must_use]
    pub fn peek(&self, limit: usize) -> &[u8] {
        &self.buf[self.head..self.tail.min(self.head + limit)]
    }

    /// Marks `n` bytes as delivered to every sink. An emptied buffer resets to its base; a
    /// partially drained one shifts the remainder to the base so the next append has maximum
    /// room.
    pub fn consume(&mut self, n: usize) {
        self.head = (self.head + n).min(self.tail);

        if self.head >= self.tail {
            self.head = 0;
            self.tail = 0;
            return;
        }

        if self.head > 0 {
            let available = self.available();
            self.buf.copy_within(self.head..self.tail, 0);
            self.head = 0;
            self.tail = available;
        }
    }

    /// Drops everything held.
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_case]
    fn starts_empty() {
        let hold = HoldBuffer::new(16);
        assert!(hold.is_empty());
        assert_eq!(hold.available(), 0);
        assert_eq!(hold.room(), 16);
    }

    #[test_case]
    fn fifo_order() {
        let mut hold = HoldBuffer::new(16);
        assert!(hold.append(b"abc"));
        assert!(hold.append(b"def"));
        assert_eq!(hold.peek(16), b"abcdef");
        assert_eq!(hold.peek(2), b"ab");
    }

    #[test_case]
    fn exact_fill_then_one_more_drops() {
        let mut hold = HoldBuffer::new(8);
        assert!(hold.append(b"12345678"));
        assert_eq!(hold.available(), 8);

        // Full to the brim: one more byte is silently dropped.
        assert!(!hold.append(b"9"));
        assert_eq!(hold.available(), 8);
        assert_eq!(hold.peek(8), b"12345678");
    }

    #[test_case]
    fn oversized_chunk_dropped_whole() {
        let mut hold = HoldBuffer::new(4);
        assert!(hold.append(b"ab"));
        assert!(!hold.append(b"cde"));
        assert_eq!(hold.peek(4), b"ab");
    }

    #[test_case]
    fn full_drain_resets_to_base() {
        let mut hold = HoldBuffer::new(8);
        hold.append(b"abcd");
        hold.consume(4);
        assert!(hold.is_empty());
        assert_eq!(hold.room(), 8);
    }

    #[test_case]
    fn partial_drain_compacts() {
        let mut hold = HoldBuffer::new(8);
        hold.append(b"abcdef");
        hold.consume(4);

        assert_eq!(hold.available(), 2);
        assert_eq!(hold.peek(8), b"ef");
        // Compaction freed the head room.
        assert_eq!(hold.room(), 6);

        hold.append(b"ghijkl");
        assert_eq!(hold.peek(16), b"efghijkl");
    }

    #[test_case]
    fn consume_never_overshoots() {
        let mut hold = HoldBuffer::new(8);
        hold.append(b"ab");
        hold.consume(100);
        assert!(hold.is_empty());
    }
}
