//! End-to-end protocol scenarios over the mock radio and mock devices
//!
//! Drives the dispatcher exactly the way the accept loop does (connect
//! event, raw command writes, disconnect event) and decodes the notified
//! frames with a small protocol walker that enforces the framing rules:
//! every chunk's data packets are bounded by the negotiated size and sum
//! to the declared length.

use drishti_io::config::Config;
use drishti_io::core::slot::TaskKind;
use drishti_io::devices::mock::{MockCamera, MockMicrophone};
use drishti_io::devices::ResourceSet;
use drishti_io::dispatcher::Dispatcher;
use drishti_io::transport::MockRadio;
use std::thread;
use std::time::{Duration, Instant};

/// Fast timings so the suite runs in a few seconds
fn fast_config() -> Config {
    let mut config = Config::mock_defaults();
    config.camera.mock_frame_bytes = 1000;
    config.audio.chunk_ms = 30;
    config.audio.fill_slack_ms = 10;
    config.timing.packet_delay_ms = 0;
    config.timing.capture_retry_delay_ms = 10;
    config.timing.stop_wait_ms = 500;
    config
}

struct Rig {
    dispatcher: Dispatcher,
    radio: MockRadio,
    camera: MockCamera,
}

fn rig_with(config: Config) -> Rig {
    let radio = MockRadio::new();
    let camera = MockCamera::new(config.camera.mock_frame_bytes);
    let microphone =
        MockMicrophone::new(config.audio.sample_rate, config.audio.bits_per_sample).unwrap();
    let resources = ResourceSet::new(Box::new(camera.clone()), Box::new(microphone));
    let dispatcher = Dispatcher::new(Box::new(radio.clone()), resources, &config);
    dispatcher.on_connect().unwrap();
    Rig {
        dispatcher,
        radio,
        camera,
    }
}

fn rig() -> Rig {
    rig_with(fast_config())
}

/// Block until the task slot is free (task exited on all paths)
fn wait_idle(dispatcher: &Dispatcher) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while dispatcher.active_task().is_some() {
        assert!(
            Instant::now() < deadline,
            "task did not release the slot in time"
        );
        thread::sleep(Duration::from_millis(5));
    }
}

/// Walk the notified frames, returning header texts in order
///
/// Panics if any data packet exceeds `chunk_size` or a chunk's packets do
/// not sum to the length its header declared.
fn decode_headers(frames: &[Vec<u8>], chunk_size: usize) -> Vec<String> {
    let mut headers = Vec::new();
    let mut pending = 0usize;

    for frame in frames {
        if pending > 0 {
            assert!(
                frame.len() <= chunk_size,
                "data packet of {} bytes exceeds chunk size {}",
                frame.len(),
                chunk_size
            );
            assert!(
                frame.len() <= pending,
                "data packets overflow the declared chunk length"
            );
            pending -= frame.len();
            continue;
        }

        let text = std::str::from_utf8(frame).expect("expected ASCII header frame");
        if let Some(rest) = text
            .strip_prefix("IMG_START:")
            .or_else(|| text.strip_prefix("VQA_IMG_START:"))
        {
            pending = rest.parse().expect("image start header length");
        } else if text.starts_with("AUD_CHUNK:") || text.starts_with("VQA_AUD_CHUNK:") {
            let len_field = text.rsplit(':').next().unwrap();
            pending = len_field.parse().expect("audio chunk header length");
        }
        headers.push(text.to_string());
    }

    assert_eq!(pending, 0, "stream ended mid-chunk");
    headers
}

fn chunk_seq(header: &str) -> u64 {
    header.split(':').nth(1).unwrap().parse().unwrap()
}

#[test]
fn image_capture_happy_path() {
    let rig = rig();
    rig.dispatcher.handle_write(b"MTU:103");
    assert_eq!(rig.dispatcher.chunk_size(), 100);

    rig.dispatcher.handle_write(b"IMAGE");
    wait_idle(&rig.dispatcher);

    let headers = decode_headers(&rig.radio.frames(), 100);
    assert_eq!(headers, vec!["IMG_START:1000".to_string(), "IMG_END".to_string()]);

    // 1000 bytes at 100 bytes per packet
    let data_frames = rig.radio.frame_count() - headers.len();
    assert_eq!(data_frames, 10);
    assert_eq!(rig.camera.capture_count(), 1);
}

#[test]
fn mtu_negotiation_via_command() {
    let rig = rig();
    assert_eq!(rig.dispatcher.chunk_size(), 20);

    rig.dispatcher.handle_write(b"mtu:185");
    assert_eq!(rig.dispatcher.chunk_size(), 182);

    // Out-of-range values are rejected with no state change
    rig.dispatcher.handle_write(b"MTU:9999");
    assert_eq!(rig.dispatcher.chunk_size(), 182);
    rig.dispatcher.handle_write(b"MTU:10");
    assert_eq!(rig.dispatcher.chunk_size(), 182);
}

#[test]
fn audio_stream_start_and_stop() {
    let rig = rig();
    rig.dispatcher.handle_write(b"AUDIO_START");

    // Let at least 3 chunk durations elapse
    thread::sleep(Duration::from_millis(130));
    rig.dispatcher.handle_write(b"AUDIO_STOP");
    wait_idle(&rig.dispatcher);

    let headers = decode_headers(&rig.radio.frames(), 20);
    assert_eq!(headers.first().unwrap(), "AUD_STREAM_START:CONTINUOUS:30");
    assert_eq!(headers.last().unwrap(), "AUD_STREAM_END");

    let chunk_headers: Vec<&String> = headers
        .iter()
        .filter(|h| h.starts_with("AUD_CHUNK:"))
        .collect();
    assert!(
        chunk_headers.len() >= 3,
        "expected at least 3 chunks, got {}",
        chunk_headers.len()
    );

    // Sequence numbers are 1-based and strictly increasing
    for (i, header) in chunk_headers.iter().enumerate() {
        assert_eq!(chunk_seq(header), i as u64 + 1);
    }

    assert!(!headers.iter().any(|h| h == "AUD_STREAM_ERROR"));
}

#[test]
fn audio_stop_without_stream_is_ignored() {
    let rig = rig();
    rig.dispatcher.handle_write(b"AUDIO_STOP");
    assert_eq!(rig.dispatcher.active_task(), None);
    assert_eq!(rig.radio.frame_count(), 0);
}

#[test]
fn disconnect_mid_audio_stream_aborts_cleanly() {
    let rig = rig();
    rig.dispatcher.handle_write(b"AUDIO_START");
    thread::sleep(Duration::from_millis(50));

    // Peer vanishes mid-stream; the next poll point notices
    rig.radio.set_connected(false);
    wait_idle(&rig.dispatcher);

    rig.dispatcher.on_disconnect();
    assert_eq!(rig.dispatcher.active_task(), None);

    // No footer can reach a detached peer; the stream just stops
    let headers = decode_headers(&rig.radio.frames(), 20);
    assert_eq!(headers.first().unwrap(), "AUD_STREAM_START:CONTINUOUS:30");
    assert!(!headers.iter().any(|h| h == "AUD_STREAM_END"));
}

#[test]
fn second_image_command_rejected_while_first_runs() {
    let mut config = fast_config();
    // Slow the transfer down so the second command lands mid-flight
    config.timing.packet_delay_ms = 2;
    let rig = rig_with(config);

    rig.dispatcher.handle_write(b"IMAGE");
    thread::sleep(Duration::from_millis(10));
    rig.dispatcher.handle_write(b"IMAGE");
    wait_idle(&rig.dispatcher);

    let headers = decode_headers(&rig.radio.frames(), 20);
    let starts = headers.iter().filter(|h| h.starts_with("IMG_START:")).count();
    let ends = headers.iter().filter(|h| *h == "IMG_END").count();
    assert_eq!(starts, 1, "only one transfer may run");
    assert_eq!(ends, 1);
    assert_eq!(rig.camera.capture_count(), 1);
}

#[test]
fn capture_retries_once_then_succeeds() {
    let rig = rig();
    rig.camera.fail_next_captures(1);

    rig.dispatcher.handle_write(b"IMAGE");
    wait_idle(&rig.dispatcher);

    let headers = decode_headers(&rig.radio.frames(), 20);
    assert!(headers.iter().any(|h| h.starts_with("IMG_START:")));
    assert!(headers.iter().any(|h| h == "IMG_END"));
}

#[test]
fn capture_aborts_after_failed_retry() {
    let rig = rig();
    rig.camera.fail_next_captures(2);

    rig.dispatcher.handle_write(b"IMAGE");
    wait_idle(&rig.dispatcher);

    // No frame was sent at all, and the slot is free for the next attempt
    assert_eq!(rig.radio.frame_count(), 0);
    rig.camera.fail_next_captures(0);
    rig.dispatcher.handle_write(b"IMAGE");
    wait_idle(&rig.dispatcher);
    assert!(rig.radio.frame_count() > 0);
}

#[test]
fn vqa_audio_phase_precedes_image_phase() {
    let rig = rig();
    rig.dispatcher.handle_write(b"VQA_START");
    assert_eq!(rig.dispatcher.active_task(), Some(TaskKind::Vqa));

    thread::sleep(Duration::from_millis(80));
    rig.dispatcher.handle_write(b"VQA_STOP");
    wait_idle(&rig.dispatcher);

    let headers = decode_headers(&rig.radio.frames(), 20);
    assert_eq!(headers.first().unwrap(), "VQA_STREAM_START:CONTINUOUS:30");
    assert_eq!(headers.last().unwrap(), "VQA_STREAM_END");

    let audio_end = headers.iter().position(|h| h == "VQA_AUD_STREAM_END");
    let img_start = headers
        .iter()
        .position(|h| h.starts_with("VQA_IMG_START:"));
    let img_end = headers.iter().position(|h| h == "VQA_IMG_END");

    let audio_end = audio_end.expect("audio phase must send its end marker");
    let img_start = img_start.expect("image phase must run after audio stop");
    assert!(
        audio_end < img_start,
        "image phase must never begin before the end-of-audio marker"
    );
    assert!(img_start < img_end.unwrap());

    // Audio chunks all use VQA tags and increasing sequence numbers
    let seqs: Vec<u64> = headers
        .iter()
        .filter(|h| h.starts_with("VQA_AUD_CHUNK:"))
        .map(|h| chunk_seq(h))
        .collect();
    assert!(seqs.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn vqa_capture_failure_finalizes_with_error() {
    let rig = rig();
    rig.camera.fail_next_captures(2);

    rig.dispatcher.handle_write(b"VQA_START");
    thread::sleep(Duration::from_millis(50));
    rig.dispatcher.handle_write(b"VQA_STOP");
    wait_idle(&rig.dispatcher);

    let headers = decode_headers(&rig.radio.frames(), 20);
    assert!(headers.iter().any(|h| h == "VQA_AUD_STREAM_END"));
    assert_eq!(headers.last().unwrap(), "VQA_STREAM_ERROR");
    assert!(!headers.iter().any(|h| h == "VQA_STREAM_END"));
}

#[test]
fn start_rejected_before_resources_initialized() {
    let config = fast_config();
    let radio = MockRadio::new();
    let camera = MockCamera::new(config.camera.mock_frame_bytes);
    let microphone =
        MockMicrophone::new(config.audio.sample_rate, config.audio.bits_per_sample).unwrap();
    let resources = ResourceSet::new(Box::new(camera), Box::new(microphone));
    let dispatcher = Dispatcher::new(Box::new(radio.clone()), resources, &config);

    // No on_connect: lifecycle has not initialized the hardware
    dispatcher.handle_write(b"IMAGE");
    dispatcher.handle_write(b"AUDIO_START");
    assert_eq!(dispatcher.active_task(), None);
    assert_eq!(radio.frame_count(), 0);
}

#[test]
fn unrecognized_commands_are_ignored() {
    let rig = rig();
    rig.dispatcher.handle_write(b"REBOOT");
    rig.dispatcher.handle_write(b"");
    rig.dispatcher.handle_write(&[0xFF, 0xFE, 0x01]);
    assert_eq!(rig.dispatcher.active_task(), None);
    assert_eq!(rig.radio.frame_count(), 0);
}

#[test]
fn disconnect_event_stops_running_task() {
    let rig = rig();
    rig.dispatcher.handle_write(b"AUDIO_START");
    thread::sleep(Duration::from_millis(40));

    // Radio-level disconnect event: cleanup stops the task cooperatively
    rig.radio.set_connected(false);
    rig.dispatcher.on_disconnect();
    assert_eq!(rig.dispatcher.active_task(), None);

    // Commands after cleanup are rejected (resources deinitialized)
    rig.dispatcher.handle_write(b"IMAGE");
    assert_eq!(rig.dispatcher.active_task(), None);
}
