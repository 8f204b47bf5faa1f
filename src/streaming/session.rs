//! Per-stream session bookkeeping
//!
//! A session exists for the lifetime of one streaming task and dies with
//! it; counters never leak across sessions.

use std::time::Instant;

/// Counters for one streaming session
pub struct StreamSession {
    started: Instant,
    /// Chunk sequence numbers are 1-based and strictly increasing within
    /// a session; they never reset mid-stream
    next_seq: u64,
    chunks: u64,
    bytes: u64,
}

impl StreamSession {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            next_seq: 1,
            chunks: 0,
            bytes: 0,
        }
    }

    /// Sequence number for the chunk about to be sent
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Record a fully sent chunk
    pub fn record_chunk(&mut self, bytes: usize) {
        self.next_seq += 1;
        self.chunks += 1;
        self.bytes += bytes as u64;
    }

    pub fn chunks(&self) -> u64 {
        self.chunks
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Average payload rate since the session started, in kB/s
    pub fn rate_kbps(&self) -> f64 {
        let secs = self.started.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.bytes as f64 / 1000.0 / secs
        } else {
            0.0
        }
    }

}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}
