//! Chunk framing over the notify characteristic
//!
//! # Wire protocol
//!
//! A chunk is a textual header frame followed by binary packet frames
//! whose lengths sum to the length declared in the header:
//!
//! ```text
//! ┌────────────────────────────┬─────────────┬─────┬─────────────┐
//! │ Header (ASCII, one notify) │ Packet 1    │ ... │ Packet N    │
//! │ e.g. "AUD_CHUNK:7:16000"   │ ≤ chunkSize │     │ ≤ chunkSize │
//! └────────────────────────────┴─────────────┴─────┴─────────────┘
//! ```
//!
//! Headers by stream:
//!
//! | Stream | Frames |
//! |--------|--------|
//! | Image | `IMG_START:<bytes>` ... `IMG_END` |
//! | Audio | `AUD_STREAM_START:CONTINUOUS:<ms>`, `AUD_CHUNK:<seq>:<bytes>`, `AUD_STREAM_END` / `AUD_STREAM_ERROR` |
//! | VQA | `VQA_STREAM_START:CONTINUOUS:<ms>`, `VQA_AUD_CHUNK:<seq>:<bytes>`, `VQA_AUD_STREAM_END`, `VQA_IMG_START:<bytes>` ... `VQA_IMG_END`, `VQA_STREAM_END` / `VQA_STREAM_ERROR` |
//!
//! Compatibility depends on exact header text and byte counts matching the
//! declared lengths; there is no checksum at this layer.

use crate::error::{Error, Result};
use crate::streaming::TaskContext;
use std::thread;

/// Header tags for a chunked image transfer
pub struct ImageHeaders {
    pub start: &'static str,
    pub end: &'static str,
}

/// Header tags for a continuous audio stream
///
/// The audio algorithm is shared between the standalone stream and the
/// VQA audio phase; only the tags differ so the peer can tell the two
/// protocols apart on the shared characteristic.
pub struct StreamProfile {
    pub start: &'static str,
    pub chunk: &'static str,
    pub end: &'static str,
    pub error: &'static str,
}

/// One-shot image transfer tags
pub const IMG: ImageHeaders = ImageHeaders {
    start: "IMG_START",
    end: "IMG_END",
};

/// Image phase tags inside a VQA workflow
pub const VQA_IMG: ImageHeaders = ImageHeaders {
    start: "VQA_IMG_START",
    end: "VQA_IMG_END",
};

/// Standalone continuous audio tags
pub const AUDIO: StreamProfile = StreamProfile {
    start: "AUD_STREAM_START",
    chunk: "AUD_CHUNK",
    end: "AUD_STREAM_END",
    error: "AUD_STREAM_ERROR",
};

/// Audio phase tags inside a VQA workflow
pub const VQA_AUDIO: StreamProfile = StreamProfile {
    start: "VQA_STREAM_START",
    chunk: "VQA_AUD_CHUNK",
    end: "VQA_AUD_STREAM_END",
    error: "VQA_STREAM_ERROR",
};

/// Composite VQA end-of-workflow footer
pub const VQA_STREAM_END: &str = "VQA_STREAM_END";
/// Composite VQA error footer
pub const VQA_STREAM_ERROR: &str = "VQA_STREAM_ERROR";

/// Send one frame, checking peer presence first
pub fn notify(ctx: &TaskContext, payload: &[u8]) -> Result<()> {
    if !ctx.peer_attached() {
        return Err(Error::Disconnected);
    }
    ctx.link.lock().notify(payload)
}

/// Send an ASCII header frame
pub fn send_header(ctx: &TaskContext, text: &str) -> Result<()> {
    log::trace!("TX header: {}", text);
    notify(ctx, text.as_bytes())
}

/// Send a payload as `chunkSize`-bounded packets with pacing delays
///
/// Disconnects abort between packets; a cooperative stop request does not,
/// so a chunk whose header is out always completes and the peer can trust
/// declared lengths. Returns the number of payload bytes sent.
pub fn send_packets(ctx: &TaskContext, data: &[u8]) -> Result<usize> {
    let chunk_size = ctx.chunk_size();
    let delay = ctx.timing.packet_delay();
    let mut sent = 0usize;

    for packet in data.chunks(chunk_size) {
        notify(ctx, packet)?;
        sent += packet.len();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    Ok(sent)
}
