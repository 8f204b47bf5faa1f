//! One-shot image capture and transfer
//!
//! Captures a single frame (with exactly one retry on transient failure),
//! streams it as `START:<bytes>` + paced packets + `END`, then
//! self-terminates. The frame buffer and the task slot are released on
//! every exit path.

use crate::core::slot::SlotGuard;
use crate::devices::Frame;
use crate::error::{Error, Result};
use crate::streaming::framing::{self, ImageHeaders};
use crate::streaming::TaskContext;
use std::thread;
use std::time::Instant;

/// Packets between progress log lines
const PROGRESS_INTERVAL: usize = 25;

/// Task entry point for the `IMAGE` command
pub fn run(ctx: TaskContext, _guard: SlotGuard) {
    log::info!("Capture task started");
    match transfer_image(&ctx, &framing::IMG) {
        Ok(bytes) => log::info!("Image transfer complete ({} bytes)", bytes),
        Err(Error::Disconnected) => log::warn!("Peer lost during image transfer"),
        Err(e) => log::error!("Capture task aborted: {}", e),
    }
    // _guard drops here, releasing the slot
}

/// Acquire one frame, retrying exactly once after a short delay
///
/// The retry count and delay are empirical; both live in config.
fn acquire_frame(ctx: &TaskContext) -> Result<Frame> {
    let first = try_capture(ctx);
    match first {
        Ok(frame) => Ok(frame),
        Err(e) => {
            log::warn!("Frame capture failed ({}), retrying once", e);
            thread::sleep(ctx.timing.capture_retry_delay());
            try_capture(ctx)
        }
    }
}

fn try_capture(ctx: &TaskContext) -> Result<Frame> {
    let mut resources = ctx.resources.lock();
    resources.camera_mut()?.capture()
}

/// Capture and stream one image with the given header tags
///
/// Shared by the standalone capture task and the VQA image phase.
/// Returns the number of payload bytes sent.
pub fn transfer_image(ctx: &TaskContext, headers: &ImageHeaders) -> Result<u64> {
    let frame = acquire_frame(ctx)?;
    let total = frame.len();
    log::debug!("Frame acquired: {} bytes", total);

    framing::send_header(ctx, &format!("{}:{}", headers.start, total))?;

    let chunk_size = ctx.chunk_size();
    let delay = ctx.timing.packet_delay();
    let started = Instant::now();
    let mut sent = 0usize;

    for (i, packet) in frame.as_bytes().chunks(chunk_size).enumerate() {
        framing::notify(ctx, packet)?;
        sent += packet.len();

        if (i + 1) % PROGRESS_INTERVAL == 0 {
            let rate = sent as f64 / 1000.0 / started.elapsed().as_secs_f64().max(1e-6);
            log::debug!(
                "Image transfer {}% ({}/{} bytes, {:.1} kB/s)",
                sent * 100 / total,
                sent,
                total,
                rate
            );
        }
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    framing::send_header(ctx, headers.end)?;
    log::debug!(
        "Image transfer finished: {} bytes in {:.2}s",
        sent,
        started.elapsed().as_secs_f64()
    );
    Ok(sent as u64)
}
