//! Composite VQA workflow: spoken question first, then the scene
//!
//! Strict phase order:
//!
//! 1. **Audio phase** - the chunked audio loop with VQA frame tags; ends
//!    on `VQA_STOP` or disconnect.
//! 2. **Image phase** - entered only if the audio phase ended without a
//!    transport error and the peer is still attached; capture with one
//!    retry, VQA image tags.
//! 3. **Finalization** - one composite `VQA_STREAM_END` (or
//!    `VQA_STREAM_ERROR`) footer covering both phases.
//!
//! The image phase never starts before the audio phase has sent its
//! end-of-audio marker; that ordering is the whole point of running this
//! as one task instead of two.

use crate::core::slot::SlotGuard;
use crate::streaming::framing::{self, VQA_STREAM_END, VQA_STREAM_ERROR};
use crate::streaming::{audio, capture, TaskContext};

/// Task entry point for the `VQA_START` command
pub fn run(ctx: TaskContext, _guard: SlotGuard) {
    log::info!("VQA task started (audio phase)");

    // Phase 1: audio. The loop sends VQA_AUD_STREAM_END on orderly exit.
    let (audio_chunks, audio_bytes) = match audio::stream(&ctx, &framing::VQA_AUDIO) {
        Ok(stats) => (stats.chunks, stats.bytes),
        Err(e) => {
            // Allocation failure or peer loss mid-transfer: the whole
            // workflow fails, image phase is short-circuited
            log::warn!("VQA audio phase failed: {}", e);
            let _ = framing::send_header(&ctx, VQA_STREAM_ERROR);
            return;
        }
    };

    log::info!(
        "VQA audio phase ended ({} chunks, {} bytes)",
        audio_chunks,
        audio_bytes
    );

    // VQA_STOP only ends the audio phase; the image phase must still run
    ctx.slot.clear_stop();

    if !ctx.peer_attached() {
        log::warn!("Peer detached after VQA audio phase, skipping image phase");
        return;
    }

    log::info!("VQA image phase starting");
    match capture::transfer_image(&ctx, &framing::VQA_IMG) {
        Ok(image_bytes) => {
            let _ = framing::send_header(&ctx, VQA_STREAM_END);
            log::info!(
                "VQA complete: {} audio bytes in {} chunks, {} image bytes",
                audio_bytes,
                audio_chunks,
                image_bytes
            );
        }
        Err(e) => {
            // Capture failure or disconnect mid-transfer still finalizes
            // with an error footer rather than ending silently
            log::warn!("VQA image phase failed: {}", e);
            let _ = framing::send_header(&ctx, VQA_STREAM_ERROR);
        }
    }
}
