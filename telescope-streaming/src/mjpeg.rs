use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, Stream};
use telescope_camera::encode::encode_jpeg_gray;
use telescope_camera::overlay::stamp_text_gray;
use telescope_camera::Camera;
use telescope_types::CaptureOptions;
use tracing::{error, info, warn};

use crate::arbiter::{ArbiterGuard, StreamArbiter};

const MAX_CONSECUTIVE_ERRORS: u32 = 10;
const HEALTH_LOG_EVERY: u64 = 100;
const FALLBACK_WIDTH: u32 = 640;
const FALLBACK_HEIGHT: u32 = 480;

pub struct MjpegConfig {
    pub max_fps: f64,
    pub quality: u8,
}

impl Default for MjpegConfig {
    fn default() -> Self {
        MjpegConfig { max_fps: 10.0, quality: 85 }
    }
}

struct StreamState {
    camera: Arc<Camera>,
    _guard: ArbiterGuard,
    options: CaptureOptions,
    config: MjpegConfig,
    sequence: u64,
    consecutive_errors: u32,
    done: bool,
    camera_key: String,
}

fn mjpeg_part(jpeg_bytes: &[u8]) -> Bytes {
    let mut out = Vec::with_capacity(jpeg_bytes.len() + 64);
    out.extend_from_slice(b"--frame\r\n");
    out.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
    out.extend_from_slice(jpeg_bytes);
    out.extend_from_slice(b"\r\n");
    Bytes::from(out)
}

fn error_frame(width: u32, height: u32, message: &str) -> anyhow::Result<Vec<u8>> {
    let mut pixels = vec![0u8; (width * height) as usize];
    stamp_text_gray(&mut pixels, width, height, message);
    encode_jpeg_gray(&pixels, width, height, 85)
}

/// Drives a camera's stream as a sequence of MJPEG multipart chunks. Stops
/// when the camera's `stop_stream` is invoked, the caller drops the stream,
/// or ten consecutive capture errors occur (after emitting a terminal error
/// frame).
pub fn mjpeg_stream(
    camera: Arc<Camera>,
    arbiter: &Arc<StreamArbiter>,
    camera_key: String,
    options: CaptureOptions,
    config: MjpegConfig,
) -> impl Stream<Item = std::io::Result<Bytes>> {
    let (bandwidth, guard) = arbiter.start();
    camera.set_control("BandwidthOverload", bandwidth).ok();

    let state = StreamState {
        camera,
        _guard: guard,
        options,
        config,
        sequence: 0,
        consecutive_errors: 0,
        done: false,
        camera_key,
    };

    stream::unfold(state, |mut state| async move {
        if state.done {
            return None;
        }

        if state.consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
            error!(camera_id = %state.camera_key, "mjpeg stream terminating after repeated capture errors");
            let frame = error_frame(FALLBACK_WIDTH, FALLBACK_HEIGHT, "STREAM FAILED").ok()?;
            state.done = true;
            state.camera.stop_stream();
            return Some((Ok(mjpeg_part(&frame)), state));
        }

        if !state.camera.is_streaming() && state.sequence > 0 {
            state.done = true;
            return None;
        }

        match state.camera.stream_next(&state.options, state.config.max_fps, state.sequence).await {
            Ok(frame) => {
                state.sequence += 1;
                state.consecutive_errors = 0;
                if state.sequence % HEALTH_LOG_EVERY == 0 {
                    info!(camera_id = %state.camera_key, sequence = state.sequence, "mjpeg stream healthy");
                }
                Some((Ok(mjpeg_part(&frame.image_bytes)), state))
            }
            Err(e) => {
                state.consecutive_errors += 1;
                warn!(
                    camera_id = %state.camera_key,
                    consecutive_errors = state.consecutive_errors,
                    error = %e,
                    "mjpeg capture failed, emitting error frame"
                );
                let (width, height) = state
                    .camera
                    .info()
                    .map(|i| (i.max_width, i.max_height))
                    .unwrap_or((FALLBACK_WIDTH, FALLBACK_HEIGHT));
                let frame = error_frame(width, height, &format!("ERROR: {}", e.kind())).ok()?;

                let backoff = (0.5 * 2f64.powi(state.consecutive_errors as i32 - 1)).min(5.0);
                tokio::time::sleep(Duration::from_secs_f64(backoff)).await;

                Some((Ok(mjpeg_part(&frame)), state))
            }
        }
    })
}
