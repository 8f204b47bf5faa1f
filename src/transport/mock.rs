//! Mock radio link for testing

use super::RadioLink;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Mock radio link that records every notified frame
///
/// Clone-able: all clones share the same frame log and connection flag, so
/// a test can hand one clone to the dispatcher and keep another to inspect
/// traffic or simulate a disconnect mid-stream.
#[derive(Clone)]
pub struct MockRadio {
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
    connected: Arc<AtomicBool>,
}

impl MockRadio {
    /// Create a new mock radio in the connected state
    pub fn new() -> Self {
        MockRadio {
            frames: Arc::new(Mutex::new(Vec::new())),
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Snapshot of all frames notified so far, in send order
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().clone()
    }

    /// Number of frames notified so far
    pub fn frame_count(&self) -> usize {
        self.frames.lock().len()
    }

    /// Discard recorded frames
    pub fn clear(&self) {
        self.frames.lock().clear();
    }

    /// Simulate peer attach/detach at the radio level
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }
}

impl RadioLink for MockRadio {
    fn notify(&mut self, payload: &[u8]) -> Result<()> {
        if !self.connected.load(Ordering::Relaxed) {
            return Err(Error::Disconnected);
        }
        self.frames.lock().push(payload.to_vec());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

impl Default for MockRadio {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_frames_in_order() {
        let radio = MockRadio::new();
        let mut link = radio.clone();
        link.notify(b"one").unwrap();
        link.notify(b"two").unwrap();
        assert_eq!(radio.frames(), vec![b"one".to_vec(), b"two".to_vec()]);
    }

    #[test]
    fn test_notify_fails_when_detached() {
        let radio = MockRadio::new();
        let mut link = radio.clone();
        radio.set_connected(false);
        assert!(!link.is_connected());
        assert!(matches!(link.notify(b"x"), Err(Error::Disconnected)));
        assert_eq!(radio.frame_count(), 0);
    }
}
