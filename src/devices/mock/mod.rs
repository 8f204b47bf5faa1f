//! Mock camera and microphone for hardware-free development
//!
//! Simulates the wearable's sensors so the whole radio protocol can run
//! on a workstation:
//!
//! | Component | Simulation method |
//! |-----------|-------------------|
//! | Camera | JPEG-shaped synthetic frame (SOI/EOI around random payload) |
//! | Microphone | Rate-limited 440 Hz sine + noise, 16-bit mono PCM |
//!
//! Both mocks are clone-able over shared inner state, so tests can keep a
//! handle for fault injection (scripted capture failures) after moving a
//! boxed clone into the [`ResourceSet`](crate::devices::ResourceSet).

mod camera;
mod microphone;

pub use camera::MockCamera;
pub use microphone::MockMicrophone;
