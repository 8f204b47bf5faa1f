//! Single-occupancy task slot
//!
//! Only one background task (capture, audio stream, or VQA) may run at any
//! instant. The slot is the gate that enforces this: acquisition is an
//! atomic compare-exchange, so the dispatcher and a finishing task cannot
//! race into double occupancy, and release is scope-bound through
//! [`SlotGuard`] so every task exit path (success, error, detach) frees the
//! slot.
//!
//! Stop is advisory and cooperative: a flag the occupant polls at chunk and
//! packet boundaries. Worst-case stop latency is one chunk duration plus
//! one pacing delay.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Kind of background task occupying the slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Capture,
    Audio,
    Vqa,
}

impl TaskKind {
    /// Thread / log name for this task kind
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::Capture => "capture",
            TaskKind::Audio => "audio-stream",
            TaskKind::Vqa => "vqa",
        }
    }
}

/// The single-occupancy reservation shared by dispatcher and tasks
pub struct TaskSlot {
    active: AtomicBool,
    stop: AtomicBool,
    kind: Mutex<Option<TaskKind>>,
}

impl TaskSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            active: AtomicBool::new(false),
            stop: AtomicBool::new(false),
            kind: Mutex::new(None),
        })
    }

    /// Try to occupy the slot for `kind`
    ///
    /// Fails (returns `None`) if any task currently occupies the slot.
    /// Starting a task while the slot is occupied is rejected, never
    /// queued.
    pub fn try_acquire(self: &Arc<Self>, kind: TaskKind) -> Option<SlotGuard> {
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }
        self.stop.store(false, Ordering::Release);
        *self.kind.lock() = Some(kind);
        Some(SlotGuard {
            slot: Arc::clone(self),
        })
    }

    /// Which task kind occupies the slot right now, if any
    pub fn occupant(&self) -> Option<TaskKind> {
        if self.active.load(Ordering::Acquire) {
            *self.kind.lock()
        } else {
            None
        }
    }

    /// Request cooperative stop of the occupant if it matches `kind`
    ///
    /// Returns false when the slot is idle or occupied by a different
    /// task kind (the caller logs and otherwise no-ops).
    pub fn request_stop(&self, kind: TaskKind) -> bool {
        if self.occupant() == Some(kind) {
            self.stop.store(true, Ordering::Release);
            true
        } else {
            false
        }
    }

    /// Request cooperative stop of whatever occupies the slot (cleanup path)
    pub fn request_stop_any(&self) {
        if self.active.load(Ordering::Acquire) {
            self.stop.store(true, Ordering::Release);
        }
    }

    /// Whether the occupant has been asked to stop
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Clear a consumed stop request
    ///
    /// Used by the VQA task between phases: `VQA_STOP` ends the audio
    /// phase only, the image phase must still run.
    pub fn clear_stop(&self) {
        self.stop.store(false, Ordering::Release);
    }
}

/// RAII occupancy guard; dropping it vacates the slot
///
/// Moved into the spawned task thread so the slot is released on every
/// exit path, including panicking unwinds.
pub struct SlotGuard {
    slot: Arc<TaskSlot>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        *self.slot.kind.lock() = None;
        self.slot.stop.store(false, Ordering::Release);
        self.slot.active.store(false, Ordering::Release);
    }
}
