//! Command dispatcher and resource lifecycle manager
//!
//! Invoked synchronously on every inbound characteristic write. Each write
//! either mutates the transport configuration (MTU negotiation), controls
//! the single task slot, or is logged and ignored. Connect and disconnect
//! events drive the camera/microphone lifecycle:
//!
//! ```text
//! Disconnected --connect--> Initializing --ok--> Ready
//! Ready + IMAGE/AUDIO_START/VQA_START (slot free) --> Ready (task spawned)
//! any state --disconnect--> Cleanup (stop tasks, wait, deinit) --> Disconnected
//! ```
//!
//! The dispatcher never blocks on a running task: starts against an
//! occupied slot are rejected, not queued, and stop requests are advisory
//! flags the task polls.

use crate::config::Config;
use crate::core::command::Command;
use crate::core::slot::{SlotGuard, TaskKind, TaskSlot};
use crate::devices::ResourceSet;
use crate::error::Result;
use crate::streaming::{audio, capture, vqa, TaskContext};
use crate::transport::{RadioLink, TransportConfig};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Poll interval while waiting for a task to stop during cleanup
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Per-connection dispatcher owning the protocol state
///
/// One instance exists per attached peer (the device supports exactly one
/// controller at a time); dropping it after [`on_disconnect`] releases
/// everything.
///
/// [`on_disconnect`]: Dispatcher::on_disconnect
pub struct Dispatcher {
    link: Arc<Mutex<Box<dyn RadioLink>>>,
    transport: Arc<Mutex<TransportConfig>>,
    resources: Arc<Mutex<ResourceSet>>,
    slot: Arc<TaskSlot>,
    attached: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
    config: Config,
}

impl Dispatcher {
    /// Create a dispatcher for a newly attached peer
    pub fn new(link: Box<dyn RadioLink>, resources: ResourceSet, config: &Config) -> Self {
        Self {
            link: Arc::new(Mutex::new(link)),
            transport: Arc::new(Mutex::new(TransportConfig::new())),
            resources: Arc::new(Mutex::new(resources)),
            slot: TaskSlot::new(),
            attached: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
            config: config.clone(),
        }
    }

    /// Connect event: power up camera and microphone
    ///
    /// Resources are initialized exactly once per connection; failure here
    /// leaves the device disconnected (the caller drops the peer).
    pub fn on_connect(&self) -> Result<()> {
        log::info!("Peer connected, initializing resources");
        self.resources.lock().init()?;
        self.attached.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Disconnect event: cooperatively stop any running task, wait briefly
    /// for voluntary exit, detach stragglers, then power down hardware
    pub fn on_disconnect(&self) {
        log::info!("Peer disconnected, cleaning up");
        self.attached.store(false, Ordering::Relaxed);
        self.slot.request_stop_any();

        let deadline = Instant::now() + self.config.timing.stop_wait();
        while self.slot.occupant().is_some() && Instant::now() < deadline {
            thread::sleep(STOP_POLL_INTERVAL);
        }

        if let Some(kind) = self.slot.occupant() {
            // The thread keeps its slot guard; it will release the slot
            // whenever it finally notices the stop flag
            log::warn!(
                "{} task did not stop within {}ms, detaching it",
                kind.name(),
                self.config.timing.stop_wait_ms
            );
            drop(self.handle.lock().take());
        } else if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }

        self.resources.lock().deinit();
        log::info!("Cleanup complete");
    }

    /// Handle one inbound characteristic write
    pub fn handle_write(&self, raw: &[u8]) {
        let text = String::from_utf8_lossy(raw);
        let Some(cmd) = Command::parse(&text) else {
            log::warn!("Unrecognized command: {:?}", text.trim());
            return;
        };

        log::debug!("Command received: {:?}", cmd);
        match cmd {
            Command::NegotiateMtu(mtu) => {
                match self.transport.lock().negotiate_mtu(mtu) {
                    Ok(chunk) => log::info!("MTU {} negotiated, chunk size {}", mtu, chunk),
                    Err(e) => log::warn!("MTU negotiation rejected: {}", e),
                }
            }
            Command::Image => self.start_task(TaskKind::Capture),
            Command::AudioStart => self.start_task(TaskKind::Audio),
            Command::AudioStop => self.request_stop(TaskKind::Audio),
            Command::VqaStart => self.start_task(TaskKind::Vqa),
            Command::VqaStop => self.request_stop(TaskKind::Vqa),
        }
    }

    /// Spawn a background streaming task if resources are up and the slot
    /// is free; otherwise log and reject (never queue)
    fn start_task(&self, kind: TaskKind) {
        if !self.resources.lock().is_initialized() {
            log::warn!("Rejecting {}: resources not initialized", kind.name());
            return;
        }

        let Some(guard) = self.slot.try_acquire(kind) else {
            let occupant = self.slot.occupant().map(|k| k.name()).unwrap_or("?");
            log::warn!(
                "Rejecting {}: task slot occupied by {}",
                kind.name(),
                occupant
            );
            return;
        };

        let ctx = self.task_context();
        let entry: fn(TaskContext, SlotGuard) = match kind {
            TaskKind::Capture => capture::run,
            TaskKind::Audio => audio::run,
            TaskKind::Vqa => vqa::run,
        };

        let spawn_result = thread::Builder::new()
            .name(kind.name().to_string())
            .spawn(move || entry(ctx, guard));

        match spawn_result {
            Ok(handle) => {
                // A previous task's handle is finished by now; joining it
                // is cheap and keeps exactly one handle alive
                if let Some(old) = self.handle.lock().replace(handle) {
                    let _ = old.join();
                }
                log::info!("{} task spawned", kind.name());
            }
            Err(e) => {
                // Guard was dropped with the closure, slot is free again
                log::error!("Failed to spawn {} task: {}", kind.name(), e);
            }
        }
    }

    fn request_stop(&self, kind: TaskKind) {
        if self.slot.request_stop(kind) {
            log::info!("Stop requested for {} task", kind.name());
        } else {
            // Not an error for the caller; logged and ignored
            log::warn!("{} stop ignored: no matching task running", kind.name());
        }
    }

    fn task_context(&self) -> TaskContext {
        TaskContext {
            link: Arc::clone(&self.link),
            transport: Arc::clone(&self.transport),
            resources: Arc::clone(&self.resources),
            slot: Arc::clone(&self.slot),
            attached: Arc::clone(&self.attached),
            audio: self.config.audio.clone(),
            timing: self.config.timing.clone(),
        }
    }

    /// Task kind currently occupying the slot, if any
    pub fn active_task(&self) -> Option<TaskKind> {
        self.slot.occupant()
    }

    /// Current negotiated packet payload size
    pub fn chunk_size(&self) -> usize {
        self.transport.lock().chunk_size()
    }
}
