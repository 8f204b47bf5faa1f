//! Camera and microphone subsystems
//!
//! The streaming tasks never talk to hardware directly; they go through
//! the [`Camera`] and [`Microphone`] traits, bundled into a [`ResourceSet`]
//! whose lifecycle is owned by the dispatcher. Resources are initialized
//! exactly once per connection and torn down exactly once per
//! disconnection; no streaming task may start while the set is
//! uninitialized.

pub mod mock;

use crate::config::Config;
use crate::error::{Error, Result};
use mock::{MockCamera, MockMicrophone};

/// A captured still frame (compressed image payload)
///
/// Owns its buffer; dropping the frame releases it, so every task exit
/// path frees the capture memory deterministically.
pub struct Frame {
    data: Vec<u8>,
}

impl Frame {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Camera subsystem with an explicit power lifecycle
pub trait Camera: Send {
    /// Power up the sensor; called once per connection
    fn power_on(&mut self) -> Result<()>;

    /// Power down the sensor; must be safe to call when already off
    fn power_off(&mut self);

    /// Acquire a single frame
    ///
    /// Transient failure is expected (sensor busy, DMA underrun); the
    /// caller owns the retry policy.
    fn capture(&mut self) -> Result<Frame>;
}

/// Microphone subsystem delivering raw fixed-rate mono PCM
pub trait Microphone: Send {
    /// Start sampling; called once per connection
    fn start(&mut self) -> Result<()>;

    /// Stop sampling; must be safe to call when already stopped
    fn stop(&mut self);

    /// Read available samples into `buf`, returning the byte count
    ///
    /// Non-blocking: returns 0 when no samples are ready yet. Always
    /// returns whole samples.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// Camera + microphone bundle with a connection-scoped lifecycle
pub struct ResourceSet {
    camera: Box<dyn Camera>,
    microphone: Box<dyn Microphone>,
    initialized: bool,
}

impl ResourceSet {
    pub fn new(camera: Box<dyn Camera>, microphone: Box<dyn Microphone>) -> Self {
        Self {
            camera,
            microphone,
            initialized: false,
        }
    }

    /// Power up both subsystems (connect event)
    pub fn init(&mut self) -> Result<()> {
        if self.initialized {
            log::warn!("Resource init requested while already initialized");
            return Ok(());
        }

        self.camera.power_on()?;
        if let Err(e) = self.microphone.start() {
            // Leave nothing half-powered behind a failed init
            self.camera.power_off();
            return Err(e);
        }
        self.initialized = true;
        log::info!("Camera and microphone initialized");
        Ok(())
    }

    /// Power down both subsystems (disconnect / cleanup)
    pub fn deinit(&mut self) {
        if !self.initialized {
            return;
        }
        self.microphone.stop();
        self.camera.power_off();
        self.initialized = false;
        log::info!("Camera and microphone deinitialized");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn camera_mut(&mut self) -> Result<&mut dyn Camera> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        Ok(self.camera.as_mut())
    }

    pub fn microphone_mut(&mut self) -> Result<&mut dyn Microphone> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        Ok(self.microphone.as_mut())
    }
}

impl Drop for ResourceSet {
    fn drop(&mut self) {
        self.deinit();
    }
}

/// Build the resource set selected by the configuration
pub fn create_resources(config: &Config) -> Result<ResourceSet> {
    match config.device.device_type.as_str() {
        "mock" => {
            let camera = MockCamera::new(config.camera.mock_frame_bytes);
            let microphone =
                MockMicrophone::new(config.audio.sample_rate, config.audio.bits_per_sample)?;
            Ok(ResourceSet::new(Box::new(camera), Box::new(microphone)))
        }
        other => Err(Error::InitializationFailed(format!(
            "unknown device type: {}",
            other
        ))),
    }
}
