//! TCP development link
//!
//! Stands in for the GATT characteristic when running the daemon on a
//! workstation: outbound notify frames are written to the client socket
//! with a 4-byte big-endian length prefix, inbound command writes arrive
//! as ASCII lines (handled by the accept loop in `app.rs`).
//!
//! ```text
//! ┌──────────────────┬──────────────────────────┐
//! │ Length (4 bytes) │ Frame payload (variable) │
//! │ Big-endian u32   │ header text or raw bytes │
//! └──────────────────┴──────────────────────────┘
//! ```
//!
//! The length prefix exists only because TCP is a byte stream; a real
//! notify is already packet-framed by the radio stack.

use super::RadioLink;
use crate::error::{Error, Result};
use std::io::Write;
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Radio link over a connected TCP client socket
pub struct TcpRadio {
    stream: TcpStream,
    connected: Arc<AtomicBool>,
}

impl TcpRadio {
    /// Wrap a connected client socket
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Shared connection flag; the accept loop clears it when the client
    /// socket reaches EOF so in-flight tasks observe the disconnect
    pub fn connected_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.connected)
    }
}

impl RadioLink for TcpRadio {
    fn notify(&mut self, payload: &[u8]) -> Result<()> {
        if !self.connected.load(Ordering::Relaxed) {
            return Err(Error::Disconnected);
        }

        let len = (payload.len() as u32).to_be_bytes();
        let result = self
            .stream
            .write_all(&len)
            .and_then(|_| self.stream.write_all(payload));

        if let Err(e) = result {
            // Socket write failure is the TCP rendition of peer loss
            self.connected.store(false, Ordering::Relaxed);
            log::debug!("Notify write failed, marking peer lost: {}", e);
            return Err(Error::Disconnected);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}
