//! Streaming tasks sharing the single notify characteristic
//!
//! Exactly one of these runs at a time (enforced by the task slot):
//!
//! - [`capture`]: one-shot image capture and transfer
//! - [`audio`]: continuous microphone streaming in fixed-duration chunks
//! - [`vqa`]: composite workflow - audio stream first, then one image
//!
//! Each task receives a [`TaskContext`] built by the dispatcher at spawn
//! time; there is no device-wide mutable session state.

pub mod audio;
pub mod capture;
pub mod framing;
pub mod session;
pub mod vqa;

use crate::config::{AudioConfig, TimingConfig};
use crate::core::slot::TaskSlot;
use crate::devices::ResourceSet;
use crate::transport::{RadioLink, TransportConfig};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Everything a streaming task needs, handed over at spawn time
#[derive(Clone)]
pub struct TaskContext {
    pub link: Arc<Mutex<Box<dyn RadioLink>>>,
    pub transport: Arc<Mutex<TransportConfig>>,
    pub resources: Arc<Mutex<ResourceSet>>,
    pub slot: Arc<TaskSlot>,
    /// Connection-level peer flag maintained by the lifecycle manager
    pub attached: Arc<AtomicBool>,
    pub audio: AudioConfig,
    pub timing: TimingConfig,
}

impl TaskContext {
    /// Cooperative stop token; polled at chunk and packet boundaries
    pub fn stop_requested(&self) -> bool {
        self.slot.stop_requested()
    }

    /// Whether the peer is still there, as far as we can tell
    ///
    /// Disconnects are detected opportunistically at the next poll point,
    /// not instantaneously.
    pub fn peer_attached(&self) -> bool {
        self.attached.load(Ordering::Relaxed) && self.link.lock().is_connected()
    }

    /// Current negotiated packet payload size
    pub fn chunk_size(&self) -> usize {
        self.transport.lock().chunk_size()
    }
}
