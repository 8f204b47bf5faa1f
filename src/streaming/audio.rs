//! Continuous audio streaming
//!
//! Streams microphone audio in fixed-duration chunks until stopped, the
//! peer disconnects, or an unrecoverable error occurs. Real-time
//! constraint: each chunk must be filled and drained before the next one
//! starts or samples are lost to the capture ring.
//!
//! The same loop drives both the standalone `AUDIO_START` stream and the
//! audio phase of a VQA workflow; the caller picks the frame tags via a
//! [`StreamProfile`].

use crate::core::slot::SlotGuard;
use crate::error::{Error, Result};
use crate::streaming::framing::{self, StreamProfile};
use crate::streaming::session::StreamSession;
use crate::streaming::TaskContext;
use std::thread;
use std::time::{Duration, Instant};

/// Sleep between microphone polls while a chunk buffer fills
const FILL_POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Chunks between rate log lines
const PROGRESS_CHUNK_INTERVAL: u64 = 10;

/// Totals for an orderly finished audio loop
pub struct AudioStats {
    pub chunks: u64,
    pub bytes: u64,
}

/// Task entry point for the `AUDIO_START` command
pub fn run(ctx: TaskContext, _guard: SlotGuard) {
    log::info!(
        "Audio stream task started ({} ms chunks, {} B/s)",
        ctx.audio.chunk_ms,
        ctx.audio.bytes_per_second()
    );

    match stream(&ctx, &framing::AUDIO) {
        Ok(stats) => {
            log::info!(
                "Audio stream ended: {} chunks, {} bytes",
                stats.chunks,
                stats.bytes
            );
        }
        Err(e) => {
            log::warn!("Audio stream aborted: {}", e);
            // Error footer is best-effort; the peer may already be gone
            let _ = framing::send_header(&ctx, framing::AUDIO.error);
        }
    }
}

/// Run the chunked audio loop with the given frame tags
///
/// Sends the stream-start header, then loops filling and sending chunks
/// until stop or disconnect; on orderly exit sends the profile's end
/// footer. Allocation failure and mid-transfer peer loss propagate as
/// errors and the caller owns the error footer.
pub fn stream(ctx: &TaskContext, profile: &StreamProfile) -> Result<AudioStats> {
    let chunk_bytes = ctx.audio.chunk_bytes();

    // One buffer per session, reused across chunks; fallible so an
    // allocation failure becomes an error footer instead of an abort
    let mut buf: Vec<u8> = Vec::new();
    buf.try_reserve_exact(chunk_bytes)
        .map_err(|_| Error::ChunkAlloc(chunk_bytes))?;
    buf.resize(chunk_bytes, 0);

    framing::send_header(
        ctx,
        &format!("{}:CONTINUOUS:{}", profile.start, ctx.audio.chunk_ms),
    )?;

    let mut session = StreamSession::new();

    loop {
        if ctx.stop_requested() || !ctx.peer_attached() {
            break;
        }

        let filled = fill_chunk(ctx, &mut buf)?;
        if filled == 0 {
            continue;
        }

        // A stop that arrived during the fill discards the partial chunk
        if ctx.stop_requested() {
            log::debug!("Stop requested, discarding {} buffered bytes", filled);
            break;
        }
        if !ctx.peer_attached() {
            break;
        }

        if filled < chunk_bytes {
            log::debug!(
                "Partial chunk: {}/{} bytes at deadline",
                filled,
                chunk_bytes
            );
        }

        let seq = session.next_seq();
        framing::send_header(ctx, &format!("{}:{}:{}", profile.chunk, seq, filled))?;
        framing::send_packets(ctx, &buf[..filled])?;
        session.record_chunk(filled);

        if session.chunks() % PROGRESS_CHUNK_INTERVAL == 0 {
            log::debug!(
                "Audio stream: {} chunks, {} bytes, {:.1} kB/s",
                session.chunks(),
                session.bytes(),
                session.rate_kbps()
            );
        }
    }

    // Orderly exit: stop request, or disconnect before/between chunks.
    // The footer is best-effort when the peer has already detached.
    if ctx.peer_attached() {
        framing::send_header(ctx, profile.end)?;
    } else {
        log::debug!("Peer detached, skipping {} footer", profile.end);
    }

    Ok(AudioStats {
        chunks: session.chunks(),
        bytes: session.bytes(),
    })
}

/// Fill `buf` with microphone samples until it is full or the chunk
/// deadline (duration + slack) passes, whichever comes first
///
/// Returns the number of bytes captured. The stop flag and peer presence
/// are polled between microphone reads so a stop request is honored
/// within one chunk duration.
fn fill_chunk(ctx: &TaskContext, buf: &mut [u8]) -> Result<usize> {
    let deadline = Instant::now() + ctx.audio.chunk_duration() + ctx.audio.fill_slack();
    let mut filled = 0usize;

    while filled < buf.len() {
        if ctx.stop_requested() || !ctx.peer_attached() {
            break;
        }

        let n = {
            let mut resources = ctx.resources.lock();
            resources.microphone_mut()?.read(&mut buf[filled..])?
        };
        filled += n;

        if filled >= buf.len() || Instant::now() >= deadline {
            break;
        }
        if n == 0 {
            thread::sleep(FILL_POLL_INTERVAL);
        }
    }

    Ok(filled)
}
