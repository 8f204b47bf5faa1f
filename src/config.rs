//! Configuration for the DrishtiIO daemon
//!
//! Loads configuration from a TOML file with the minimal parameters needed
//! for the radio protocol and the camera/microphone subsystems. Empirically
//! chosen constants (packet pacing, capture retry delay, chunk duration)
//! are deliberately exposed here as tunables rather than hard-coded.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub device: DeviceConfig,
    pub radio: RadioConfig,
    pub camera: CameraConfig,
    pub audio: AudioConfig,
    pub timing: TimingConfig,
    pub logging: LoggingConfig,
}

/// Device identity and driver selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Human-readable device name (used in logs and advertising)
    pub name: String,
    /// Device driver type ("mock" is the only hardware-free driver)
    #[serde(rename = "type")]
    pub device_type: String,
}

/// Radio link configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RadioConfig {
    /// TCP bind address for the development link that stands in for the
    /// GATT characteristic (commands in, notifications out)
    ///
    /// Examples:
    /// - `0.0.0.0:5560` - Bind to all interfaces on port 5560
    /// - `127.0.0.1:5560` - Localhost only
    pub bind_address: String,
}

/// Camera subsystem configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CameraConfig {
    /// Size of the synthetic still frame produced by the mock camera (bytes)
    pub mock_frame_bytes: usize,
}

/// Microphone / audio streaming configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioConfig {
    /// PCM sample rate in Hz (mono)
    pub sample_rate: u32,
    /// Sample width in bits (16 = signed little-endian)
    pub bits_per_sample: u16,
    /// Duration of one audio chunk in milliseconds
    pub chunk_ms: u64,
    /// Extra time allowed past the chunk duration before a partial
    /// chunk is sent anyway
    pub fill_slack_ms: u64,
}

impl AudioConfig {
    /// Raw PCM byte rate (mono)
    pub fn bytes_per_second(&self) -> usize {
        self.sample_rate as usize * self.bits_per_sample as usize / 8
    }

    /// Bytes in one full chunk, derived once at stream start
    pub fn chunk_bytes(&self) -> usize {
        self.bytes_per_second() * self.chunk_ms as usize / 1000
    }

    pub fn chunk_duration(&self) -> Duration {
        Duration::from_millis(self.chunk_ms)
    }

    pub fn fill_slack(&self) -> Duration {
        Duration::from_millis(self.fill_slack_ms)
    }
}

/// Protocol timing tunables
///
/// The pacing delay is mandatory: the notify path has no flow control and
/// unpaced bursts are dropped by the peer's stack.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimingConfig {
    /// Delay between consecutive outbound packets (milliseconds)
    pub packet_delay_ms: u64,
    /// Delay before the single camera capture retry (milliseconds)
    pub capture_retry_delay_ms: u64,
    /// How long disconnect cleanup waits for a task to exit voluntarily
    /// before detaching it (milliseconds)
    pub stop_wait_ms: u64,
}

impl TimingConfig {
    pub fn packet_delay(&self) -> Duration {
        Duration::from_millis(self.packet_delay_ms)
    }

    pub fn capture_retry_delay(&self) -> Duration {
        Duration::from_millis(self.capture_retry_delay_ms)
    }

    pub fn stop_wait(&self) -> Duration {
        Duration::from_millis(self.stop_wait_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Config {
    /// Load configuration from TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Default configuration using the mock camera and microphone
    ///
    /// Suitable for development and tests. Production deployments should
    /// use a proper TOML configuration file.
    pub fn mock_defaults() -> Self {
        Self {
            device: DeviceConfig {
                name: "drishti-01".to_string(),
                device_type: "mock".to_string(),
            },
            radio: RadioConfig {
                bind_address: "0.0.0.0:5560".to_string(),
            },
            camera: CameraConfig {
                mock_frame_bytes: 24_000,
            },
            audio: AudioConfig {
                sample_rate: 16_000,
                bits_per_sample: 16,
                chunk_ms: 500,
                fill_slack_ms: 50,
            },
            timing: TimingConfig {
                packet_delay_ms: 12,
                capture_retry_delay_ms: 100,
                stop_wait_ms: 400,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::mock_defaults()
    }
}
