//! DrishtiIO - firmware core for a battery-powered camera/microphone wearable
//!
//! Turns the device into a command-driven radio peripheral capable of
//! one-shot image capture, continuous microphone streaming, and a composite
//! "spoken question, then the scene" (VQA) workflow, multiplexed over a
//! single low-bandwidth chunked link with bounded memory.

pub mod app;
pub mod config;
pub mod core;
pub mod devices;
pub mod dispatcher;
pub mod error;
pub mod streaming;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
