//! Synthetic microphone
//!
//! Produces 16-bit mono PCM at the configured sample rate, paced against
//! wall-clock time so streaming behaves like a real capture pipeline: a
//! reader that falls behind the small internal ring loses the oldest
//! samples, exactly like hardware DMA overrun.

use crate::devices::Microphone;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use rand::Rng;
use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::Instant;

/// Simulated capture ring size in bytes (~128ms at 16kHz/16-bit)
const RING_CAPACITY: u64 = 4096;

/// Synthetic tone frequency (A4)
const TONE_HZ: f32 = 440.0;

/// Mock microphone producing a rate-limited sine-plus-noise signal
#[derive(Clone)]
pub struct MockMicrophone {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    sample_rate: u32,
    started: Option<Instant>,
    /// Bytes handed out (or dropped) since start
    consumed: u64,
    phase: f32,
}

impl MockMicrophone {
    /// Create a mock microphone; only 16-bit samples are supported
    pub fn new(sample_rate: u32, bits_per_sample: u16) -> Result<Self> {
        if bits_per_sample != 16 {
            return Err(Error::InvalidParameter(format!(
                "mock microphone supports 16-bit samples, got {}",
                bits_per_sample
            )));
        }
        if sample_rate == 0 {
            return Err(Error::InvalidParameter("sample rate must be > 0".to_string()));
        }
        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                sample_rate,
                started: None,
                consumed: 0,
                phase: 0.0,
            })),
        })
    }
}

impl Inner {
    fn bytes_per_second(&self) -> u64 {
        self.sample_rate as u64 * 2
    }

    /// Bytes produced by the "hardware" since start
    fn elapsed_bytes(&self, now: Instant) -> u64 {
        let Some(started) = self.started else {
            return 0;
        };
        let micros = now.duration_since(started).as_micros() as u64;
        // Keep sample alignment
        (micros * self.bytes_per_second() / 1_000_000) & !1
    }
}

impl Microphone for MockMicrophone {
    fn start(&mut self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.started = Some(Instant::now());
        inner.consumed = 0;
        inner.phase = 0.0;
        log::debug!("Mock microphone started at {} Hz", inner.sample_rate);
        Ok(())
    }

    fn stop(&mut self) {
        let mut inner = self.inner.lock();
        if inner.started.take().is_some() {
            log::debug!("Mock microphone stopped");
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut inner = self.inner.lock();
        if inner.started.is_none() {
            return Err(Error::NotInitialized);
        }

        let elapsed = inner.elapsed_bytes(Instant::now());

        // Ring overrun: a slow reader loses the oldest samples
        if elapsed - inner.consumed > RING_CAPACITY {
            let dropped = elapsed - inner.consumed - RING_CAPACITY;
            inner.consumed = elapsed - RING_CAPACITY;
            log::trace!("Mock microphone ring overrun, {} bytes dropped", dropped);
        }

        let available = (elapsed - inner.consumed) as usize;
        let count = available.min(buf.len()) & !1;
        if count == 0 {
            return Ok(0);
        }

        let phase_step = TAU * TONE_HZ / inner.sample_rate as f32;
        let mut rng = rand::thread_rng();
        for sample_out in buf[..count].chunks_exact_mut(2) {
            let tone = (inner.phase.sin() * 8_000.0) as i16;
            let noise: i16 = rng.gen_range(-200..=200);
            let sample = tone.saturating_add(noise);
            sample_out.copy_from_slice(&sample.to_le_bytes());
            inner.phase = (inner.phase + phase_step) % TAU;
        }

        inner.consumed += count as u64;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_read_before_start_rejected() {
        let mut mic = MockMicrophone::new(16_000, 16).unwrap();
        let mut buf = [0u8; 32];
        assert!(mic.read(&mut buf).is_err());
    }

    #[test]
    fn test_rejects_unsupported_width() {
        assert!(MockMicrophone::new(16_000, 8).is_err());
    }

    #[test]
    fn test_read_is_rate_limited() {
        let mut mic = MockMicrophone::new(16_000, 16).unwrap();
        mic.start().unwrap();

        thread::sleep(Duration::from_millis(20));
        let mut buf = vec![0u8; 64 * 1024];
        let n = mic.read(&mut buf).unwrap();

        // 20ms at 32000 B/s is 640 bytes; allow generous scheduling slack
        // but the ring cap bounds it regardless
        assert!(n > 0, "some samples must be available after 20ms");
        assert!(n as u64 <= RING_CAPACITY);
        assert_eq!(n % 2, 0, "reads are whole samples");
    }

    #[test]
    fn test_samples_accumulate_over_time() {
        let mut mic = MockMicrophone::new(16_000, 16).unwrap();
        mic.start().unwrap();

        let mut total = 0usize;
        let mut buf = vec![0u8; 8192];
        for _ in 0..5 {
            thread::sleep(Duration::from_millis(10));
            total += mic.read(&mut buf).unwrap();
        }
        // ~50ms of audio at 32000 B/s, minus pacing jitter
        assert!(total >= 1000, "expected at least 1000 bytes, got {}", total);
    }
}
