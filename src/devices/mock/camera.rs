//! Synthetic still camera

use crate::devices::{Camera, Frame};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use rand::Rng;
use std::sync::Arc;

/// Mock camera producing JPEG-shaped synthetic frames
#[derive(Clone)]
pub struct MockCamera {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    frame_bytes: usize,
    powered: bool,
    captures: u64,
    /// Number of upcoming captures that should fail (fault injection)
    fail_next: u32,
}

impl MockCamera {
    /// Create a mock camera emitting frames of `frame_bytes` bytes
    pub fn new(frame_bytes: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                frame_bytes,
                powered: false,
                captures: 0,
                fail_next: 0,
            })),
        }
    }

    /// Make the next `count` captures fail (exercises the retry path)
    pub fn fail_next_captures(&self, count: u32) {
        self.inner.lock().fail_next = count;
    }

    /// Total successful captures so far
    pub fn capture_count(&self) -> u64 {
        self.inner.lock().captures
    }
}

impl Camera for MockCamera {
    fn power_on(&mut self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.powered = true;
        log::debug!("Mock camera powered on ({} byte frames)", inner.frame_bytes);
        Ok(())
    }

    fn power_off(&mut self) {
        self.inner.lock().powered = false;
        log::debug!("Mock camera powered off");
    }

    fn capture(&mut self) -> Result<Frame> {
        let mut inner = self.inner.lock();
        if !inner.powered {
            return Err(Error::NotInitialized);
        }
        if inner.fail_next > 0 {
            inner.fail_next -= 1;
            return Err(Error::CaptureFailed("sensor busy (injected)".to_string()));
        }

        // JPEG SOI ... random payload ... EOI, so transfers look like a
        // compressed still to the receiving side
        let mut data = vec![0u8; inner.frame_bytes.max(4)];
        let len = data.len();
        rand::thread_rng().fill(&mut data[2..len - 2]);
        data[0] = 0xFF;
        data[1] = 0xD8;
        data[len - 2] = 0xFF;
        data[len - 1] = 0xD9;

        inner.captures += 1;
        Ok(Frame::new(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_requires_power() {
        let mut camera = MockCamera::new(64);
        assert!(camera.capture().is_err());
        camera.power_on().unwrap();
        let frame = camera.capture().unwrap();
        assert_eq!(frame.len(), 64);
    }

    #[test]
    fn test_frame_has_jpeg_markers() {
        let mut camera = MockCamera::new(128);
        camera.power_on().unwrap();
        let frame = camera.capture().unwrap();
        let bytes = frame.as_bytes();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_fault_injection() {
        let mut camera = MockCamera::new(64);
        camera.power_on().unwrap();
        camera.fail_next_captures(2);
        assert!(camera.capture().is_err());
        assert!(camera.capture().is_err());
        assert!(camera.capture().is_ok());
        assert_eq!(camera.capture_count(), 1);
    }
}
