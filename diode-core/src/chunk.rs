//! `ChunkBuffer`: an ordered, bounded FIFO of byte buffers that sits between
//! `InputReader` and `SenderCore`.
//!
//! Single producer, single consumer, with backpressure applied by the
//! producer watching a watermark rather than the queue enforcing a hard
//! cap. Built over a `Mutex<VecDeque<_>>` rather than a fixed-size ring,
//! since chunk entries are variable-length `Vec<u8>` buffers.

use std::collections::VecDeque;
use std::sync::Mutex;

/// One entry in the buffer: either a chunk of data, or the sentinel marking
/// "no more data will arrive".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkEntry {
    Data(Vec<u8>),
    Eof,
}

pub struct ChunkBuffer {
    inner: Mutex<VecDeque<ChunkEntry>>,
}

impl Default for ChunkBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    /// Append `data` to the buffer, filling the rightmost chunk up to `cap`
    /// bytes before spilling the remainder into a new chunk. Assumes
    /// `data.len() <= cap` (the reader never reads more than one chunk's
    /// worth at a time).
    pub fn append(&self, data: &[u8], cap: usize) {
        debug_assert!(data.len() <= cap);
        if data.is_empty() {
            return;
        }
        let mut chunks = self.inner.lock().unwrap();
        match chunks.back_mut() {
            Some(ChunkEntry::Data(right)) if right.len() < cap => {
                let remaining_space = cap - right.len();
                let take = remaining_space.min(data.len());
                right.extend_from_slice(&data[..take]);
                if take < data.len() {
                    chunks.push_back(ChunkEntry::Data(data[take..].to_vec()));
                }
            }
            _ => {
                chunks.push_back(ChunkEntry::Data(data.to_vec()));
            }
        }
    }

    /// Push the end-of-input sentinel. Idempotent is not guaranteed nor
    /// needed: `InputReader` calls this exactly once, after its final read.
    pub fn push_eof(&self) {
        self.inner.lock().unwrap().push_back(ChunkEntry::Eof);
    }

    /// Pop the front entry, if any.
    pub fn pop(&self) -> Option<ChunkEntry> {
        self.inner.lock().unwrap().pop_front()
    }

    /// Number of entries currently queued (used for watermark backpressure).
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
