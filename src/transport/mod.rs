//! Radio transport layer
//!
//! The device exposes a single service with a single characteristic that
//! supports write (inbound commands) and notify (outbound frames). This
//! module abstracts that characteristic behind the [`RadioLink`] trait and
//! owns the negotiated packet sizing in [`TransportConfig`].
//!
//! # Reliability
//!
//! Every notify is best-effort: the layer does not confirm delivery, and
//! there is no flow control. Callers must pace themselves between packets
//! (see `TimingConfig::packet_delay`) because unpaced notification bursts
//! overflow the peer's receive queue and are silently dropped. Reliability
//! above this layer comes from explicit START/END framing, not from
//! acknowledgment.

use crate::error::{Error, Result};

mod mock;
mod tcp;
pub use mock::MockRadio;
pub use tcp::TcpRadio;

/// Smallest MTU the protocol allows a peer to declare
pub const MTU_MIN: u16 = 23;
/// Largest MTU the protocol allows a peer to declare
pub const MTU_MAX: u16 = 517;
/// ATT header bytes subtracted from the MTU to get the usable payload
pub const ATT_OVERHEAD: u16 = 3;
/// Floor for the usable packet payload; progress must always be possible
/// even if negotiation reports an implausible value
pub const CHUNK_MIN: usize = 20;
/// Ceiling for the usable packet payload
pub const CHUNK_MAX: usize = 514;

/// Radio link trait for the write/notify characteristic
pub trait RadioLink: Send {
    /// Send one outbound frame through the notify mechanism (best-effort)
    fn notify(&mut self, payload: &[u8]) -> Result<()>;

    /// Whether the peer is still attached at the radio level
    fn is_connected(&self) -> bool;
}

/// Negotiated per-packet payload sizing
///
/// Mutated only by an explicit MTU negotiation command; read by every
/// chunking loop.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    chunk_size: usize,
}

impl TransportConfig {
    /// Create with the conservative default payload (20 bytes, the
    /// pre-negotiation BLE minimum)
    pub fn new() -> Self {
        Self {
            chunk_size: CHUNK_MIN,
        }
    }

    /// Current usable payload per packet
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Negotiate the packet payload size from a peer-declared MTU
    ///
    /// Accepts MTU values in [23, 517]; anything outside is rejected with
    /// no state change. The derived payload is `mtu - 3` clamped to
    /// [20, 514], so the result is monotonic in the MTU and never drops
    /// below the floor.
    pub fn negotiate_mtu(&mut self, mtu: u16) -> Result<usize> {
        if !(MTU_MIN..=MTU_MAX).contains(&mtu) {
            return Err(Error::InvalidParameter(format!(
                "MTU {} outside [{}, {}]",
                mtu, MTU_MIN, MTU_MAX
            )));
        }

        let derived = (mtu - ATT_OVERHEAD) as usize;
        self.chunk_size = derived.clamp(CHUNK_MIN, CHUNK_MAX);
        Ok(self.chunk_size)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new()
    }
}
