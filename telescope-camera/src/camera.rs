use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::json;
use telescope_types::{
    CameraConfig, CameraInfo, CaptureOptions, CaptureResult, Clock, Error, ImageFormat,
    OverlayConfig, Result, StreamFrame, SystemClock,
};
use tracing::{info, warn};

use telescope_driver::camera::{CameraDriverModule, CameraInstance, ImageType};

use crate::encode::{encode_jpeg_gray, raw16_to_display_gray8};
use crate::policy::{CameraHooks, NullRecoveryStrategy, NullRenderer, OverlayRenderer, RecoveryStrategy};

struct ConnectedState {
    instance: Box<dyn CameraInstance>,
    info: CameraInfo,
}

struct VideoState {
    width: u32,
    height: u32,
    timeout_ms: u64,
}

/// Latest RAW16 frame buffered by the streaming pipeline, published here so
/// still capture can copy it instead of issuing a fresh exposure.
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u16>,
    pub timestamp_utc: chrono::DateTime<Utc>,
    pub exposure_us: u64,
    pub gain: i32,
}

/// Logical camera device: owns one driver instance plus the injected
/// policies (overlay renderer, recovery strategy, clock, hooks) that give it
/// testable, deterministic behavior independent of the underlying hardware.
pub struct Camera {
    driver: Arc<dyn CameraDriverModule>,
    config: CameraConfig,
    renderer: Arc<dyn OverlayRenderer>,
    clock: Arc<dyn Clock>,
    hooks: CameraHooks,
    recovery: Arc<dyn RecoveryStrategy>,

    state: Mutex<Option<ConnectedState>>,
    current_gain: Mutex<i32>,
    current_exposure_us: Mutex<u64>,
    overlay: Mutex<Option<OverlayConfig>>,
    streaming: Arc<AtomicBool>,
    frame_count: AtomicU64,
    video_state: Mutex<Option<VideoState>>,
    latest_frame: Mutex<Option<Arc<RawFrame>>>,
}

impl Camera {
    pub fn new(driver: Arc<dyn CameraDriverModule>, config: CameraConfig) -> Self {
        let current_gain = config.default_gain;
        let current_exposure_us = config.default_exposure_us;
        Camera {
            driver,
            config,
            renderer: Arc::new(NullRenderer),
            clock: Arc::new(SystemClock),
            hooks: CameraHooks::default(),
            recovery: Arc::new(NullRecoveryStrategy),
            state: Mutex::new(None),
            current_gain: Mutex::new(current_gain),
            current_exposure_us: Mutex::new(current_exposure_us),
            overlay: Mutex::new(None),
            streaming: Arc::new(AtomicBool::new(false)),
            frame_count: AtomicU64::new(0),
            video_state: Mutex::new(None),
            latest_frame: Mutex::new(None),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn OverlayRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_hooks(mut self, hooks: CameraHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_recovery(mut self, recovery: Arc<dyn RecoveryStrategy>) -> Self {
        self.recovery = recovery;
        self
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().is_some()
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }

    pub fn info(&self) -> Option<CameraInfo> {
        self.state.lock().as_ref().map(|s| s.info.clone())
    }

    pub fn overlay(&self) -> Option<OverlayConfig> {
        self.overlay.lock().clone()
    }

    /// Latest RAW16 frame buffered by the streaming pipeline, if a stream has
    /// delivered at least one frame since the camera last (re)connected.
    pub fn latest_raw_frame(&self) -> Option<Arc<RawFrame>> {
        self.latest_frame.lock().clone()
    }

    pub fn set_overlay(&self, overlay: Option<OverlayConfig>) {
        *self.overlay.lock() = overlay;
    }

    pub fn connect(&self) -> Result<CameraInfo> {
        let mut state = self.state.lock();
        if state.is_some() {
            return Err(Error::already_connected(self.config.camera_id.clone()));
        }
        let mut instance = self
            .driver
            .open(&self.config.camera_id)
            .map_err(|e| Error::driver(self.config.camera_id.clone(), e))?;

        let gain = *self.current_gain.lock();
        let exposure = *self.current_exposure_us.lock();
        instance
            .set_control("Gain", gain)
            .map_err(|e| Error::driver(self.config.camera_id.clone(), e))?;
        instance
            .set_control("Exposure", exposure as i32)
            .map_err(|e| Error::driver(self.config.camera_id.clone(), e))?;

        let info = instance.get_info();
        *state = Some(ConnectedState { instance, info: info.clone() });
        drop(state);

        info!(camera_id = %self.config.camera_id, "camera connected");
        if let Some(cb) = &self.hooks.on_connect {
            cb(&info);
        }
        Ok(info)
    }

    pub fn disconnect(&self) {
        let mut state = self.state.lock();
        if let Some(mut connected) = state.take() {
            if let Err(e) = connected.instance.close() {
                warn!(camera_id = %self.config.camera_id, error = %e, "error closing camera driver during disconnect");
            }
        }
        drop(state);
        self.video_state.lock().take();
        info!(camera_id = %self.config.camera_id, "camera disconnected");
        if let Some(cb) = &self.hooks.on_disconnect {
            cb();
        }
    }

    pub fn set_control(&self, name: &str, value: i32) -> Result<()> {
        let mut state = self.state.lock();
        let connected = state
            .as_mut()
            .ok_or_else(|| Error::not_connected(self.config.camera_id.clone()))?;
        connected
            .instance
            .set_control(name, value)
            .map_err(|e| Error::driver(self.config.camera_id.clone(), e))?;
        match name {
            "Gain" => *self.current_gain.lock() = value,
            "Exposure" => *self.current_exposure_us.lock() = value as u64,
            _ => {}
        }
        Ok(())
    }

    pub fn get_control(&self, name: &str) -> Result<i32> {
        let state = self.state.lock();
        let connected = state
            .as_ref()
            .ok_or_else(|| Error::not_connected(self.config.camera_id.clone()))?;
        let (value, _is_auto) = connected
            .instance
            .get_control(name)
            .map_err(|e| Error::driver(self.config.camera_id.clone(), e))?;
        Ok(value)
    }

    pub fn capture_raw(&self, exposure_us: Option<u64>, gain: Option<i32>) -> Result<CaptureResult> {
        self.capture(&CaptureOptions {
            exposure_us,
            gain,
            apply_overlay: false,
            format: Some(ImageFormat::Jpeg),
        })
    }

    pub fn capture(&self, options: &CaptureOptions) -> Result<CaptureResult> {
        match self.capture_inner(options) {
            Ok(result) => Ok(result),
            Err(original) => self.recover_and_retry(options, original),
        }
    }

    fn capture_inner(&self, options: &CaptureOptions) -> anyhow::Result<CaptureResult> {
        let effective_exposure = options.exposure_us.unwrap_or(*self.current_exposure_us.lock());
        let effective_gain = options.gain.unwrap_or(*self.current_gain.lock());

        let mut state = self.state.lock();
        let connected = state
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!(Error::not_connected(self.config.camera_id.clone())))?;

        if effective_exposure != *self.current_exposure_us.lock() {
            connected.instance.set_control("Exposure", effective_exposure as i32)?;
        }
        if effective_gain != *self.current_gain.lock() {
            connected.instance.set_control("Gain", effective_gain)?;
        }

        let bytes = connected.instance.capture(effective_exposure)?;
        let info = connected.info.clone();
        drop(state);

        *self.current_exposure_us.lock() = effective_exposure;
        *self.current_gain.lock() = effective_gain;

        let mut result = CaptureResult {
            image_bytes: bytes,
            timestamp_utc: Utc::now(),
            exposure_us: effective_exposure,
            gain: effective_gain,
            width: Some(info.max_width),
            height: Some(info.max_height),
            format: options.format.unwrap_or(ImageFormat::Jpeg),
            metadata: Default::default(),
            has_overlay: false,
        };

        if options.apply_overlay {
            if let Some(overlay) = self.overlay.lock().clone() {
                if overlay.enabled {
                    result.image_bytes = self.renderer.render(&result.image_bytes, &overlay, &info)?;
                    result.has_overlay = true;
                    result
                        .metadata
                        .insert("overlay_type".to_string(), json!(format!("{:?}", overlay.overlay_type)));
                }
            }
        }

        if let Some(cb) = &self.hooks.on_capture {
            cb(&result);
        }
        Ok(result)
    }

    /// Single-shot recovery: clear state, ask the recovery strategy, and on
    /// success reconnect and retry the capture exactly once more.
    fn recover_and_retry(&self, options: &CaptureOptions, original: anyhow::Error) -> Result<CaptureResult> {
        let error_kind = original
            .downcast_ref::<Error>()
            .map(|e| e.kind())
            .unwrap_or(telescope_types::ErrorKind::DriverError);

        self.disconnect();

        if !self.recovery.attempt_recovery(&self.config.camera_id) {
            if let Some(cb) = &self.hooks.on_error {
                cb(&original);
            }
            return Err(Error::disconnected(self.config.camera_id.clone(), original));
        }

        if let Err(reconnect_err) = self.connect() {
            let reconnect_err: anyhow::Error = reconnect_err.into();
            if let Some(cb) = &self.hooks.on_error {
                cb(&reconnect_err);
            }
            return Err(Error::disconnected(self.config.camera_id.clone(), reconnect_err));
        }

        let mut result = self
            .capture_inner(options)
            .map_err(|e| Error::disconnected(self.config.camera_id.clone(), e))?;
        result.metadata.insert("recovered".to_string(), json!(true));
        result
            .metadata
            .insert("recovered_from_error".to_string(), json!(error_kind.to_string()));
        Ok(result)
    }

    pub fn stop_stream(&self) {
        self.streaming.store(false, Ordering::SeqCst);
        if self.video_state.lock().take().is_some() {
            if let Some(connected) = self.state.lock().as_mut() {
                if let Err(e) = connected.instance.stop_video_capture() {
                    warn!(camera_id = %self.config.camera_id, error = %e, "error stopping video capture");
                }
            }
        }
    }

    /// (Re)starts RAW16 full-frame video capture on the open instance if it
    /// isn't already running, sizing the per-frame timeout from the
    /// effective exposure. No-op if video capture is already active.
    fn ensure_video_capture(&self, options: &CaptureOptions) -> anyhow::Result<()> {
        if self.video_state.lock().is_some() {
            return Ok(());
        }

        let effective_exposure = options.exposure_us.unwrap_or(*self.current_exposure_us.lock());
        let effective_gain = options.gain.unwrap_or(*self.current_gain.lock());

        let mut state = self.state.lock();
        let connected = state
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!(Error::not_connected(self.config.camera_id.clone())))?;

        connected.instance.set_control("Exposure", effective_exposure as i32)?;
        connected.instance.set_control("Gain", effective_gain)?;
        let info = connected.instance.get_info();
        connected
            .instance
            .set_roi(info.max_width, info.max_height, 1, ImageType::Raw16)?;
        connected.instance.stop_video_capture().ok();
        connected.instance.start_video_capture(ImageType::Raw16)?;
        drop(state);

        *self.current_exposure_us.lock() = effective_exposure;
        *self.current_gain.lock() = effective_gain;

        let timeout_ms = ((effective_exposure + 5_000_000) / 1000).max(3000);
        *self.video_state.lock() = Some(VideoState { width: info.max_width, height: info.max_height, timeout_ms });
        Ok(())
    }

    /// Pulls one RAW16 frame off the already-started video capture, reshapes
    /// it, and produces both the raw frame (for still-capture buffering) and
    /// its auto-stretched 8-bit JPEG (for the MJPEG stream).
    fn capture_video_once(&self) -> anyhow::Result<(RawFrame, Vec<u8>)> {
        let (width, height, timeout_ms) = {
            let video_state = self.video_state.lock();
            let video_state = video_state
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("video capture not initialized"))?;
            (video_state.width, video_state.height, video_state.timeout_ms)
        };

        let mut buffer = vec![0u8; width as usize * height as usize * 2];
        let mut state = self.state.lock();
        let connected = state
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!(Error::not_connected(self.config.camera_id.clone())))?;
        connected.instance.capture_video_frame(&mut buffer, timeout_ms)?;
        drop(state);

        let raw16: Vec<u16> = buffer.chunks_exact(2).map(|b| u16::from_le_bytes([b[0], b[1]])).collect();
        let display = raw16_to_display_gray8(&raw16);
        let jpeg = encode_jpeg_gray(&display, width, height, 85)?;

        let frame = RawFrame {
            width,
            height,
            data: raw16,
            timestamp_utc: Utc::now(),
            exposure_us: *self.current_exposure_us.lock(),
            gain: *self.current_gain.lock(),
        };
        Ok((frame, jpeg))
    }

    fn capture_video(&self, options: &CaptureOptions) -> Result<(RawFrame, Vec<u8>)> {
        if let Err(e) = self.ensure_video_capture(options) {
            return self.recover_video_and_retry(options, e);
        }
        match self.capture_video_once() {
            Ok(result) => Ok(result),
            Err(original) => self.recover_video_and_retry(options, original),
        }
    }

    /// Mirrors [`Camera::recover_and_retry`] for the video-capture path:
    /// drop the stalled video state, disconnect, ask the recovery strategy,
    /// reconnect, and restart video capture exactly once more.
    fn recover_video_and_retry(&self, options: &CaptureOptions, original: anyhow::Error) -> Result<(RawFrame, Vec<u8>)> {
        self.video_state.lock().take();
        self.disconnect();

        if !self.recovery.attempt_recovery(&self.config.camera_id) {
            if let Some(cb) = &self.hooks.on_error {
                cb(&original);
            }
            return Err(Error::disconnected(self.config.camera_id.clone(), original));
        }

        if let Err(reconnect_err) = self.connect() {
            let reconnect_err: anyhow::Error = reconnect_err.into();
            if let Some(cb) = &self.hooks.on_error {
                cb(&reconnect_err);
            }
            return Err(Error::disconnected(self.config.camera_id.clone(), reconnect_err));
        }

        self.ensure_video_capture(options)
            .and_then(|_| self.capture_video_once())
            .map_err(|e| Error::disconnected(self.config.camera_id.clone(), e))
    }

    /// Produces successive frames, rate-limited to `max_fps`, until
    /// `stop_stream` is called. Caller drives iteration (e.g. from an async
    /// task); each call blocks only for the capture + rate-limit sleep. Runs
    /// the RAW16 video-capture pipeline (force RAW16 full-frame mode, right-
    /// shift + auto-stretch to 8-bit, JPEG-encode) rather than a plain
    /// single-shot capture, and publishes each raw frame for still capture.
    pub async fn stream_next(&self, options: &CaptureOptions, max_fps: f64, sequence: u64) -> Result<StreamFrame> {
        self.streaming.store(true, Ordering::SeqCst);
        let start = self.clock.now();

        let (raw_frame, jpeg_bytes) = self.capture_video(options)?;
        let timestamp_utc = raw_frame.timestamp_utc;
        let exposure_us = raw_frame.exposure_us;
        let gain = raw_frame.gain;
        *self.latest_frame.lock() = Some(Arc::new(raw_frame));

        let frame = StreamFrame {
            image_bytes: jpeg_bytes,
            timestamp_utc,
            sequence,
            exposure_us,
            gain,
            has_overlay: false,
        };
        self.frame_count.store(sequence, Ordering::SeqCst);

        if let Some(cb) = &self.hooks.on_stream_frame {
            cb(&frame);
        }

        let elapsed = self.clock.now().saturating_duration_since(start);
        let target = Duration::from_secs_f64(1.0 / max_fps.max(0.001));
        if elapsed < target {
            self.clock.sleep(target - elapsed).await;
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use telescope_driver::camera::{TwinCameraConfig, TwinCameraDriver};

    fn make_camera() -> Camera {
        let driver = Arc::new(TwinCameraDriver::new(TwinCameraConfig::default()));
        let config = CameraConfig {
            camera_id: "twin0".into(),
            name: Some("Test".into()),
            default_gain: 10,
            default_exposure_us: 5_000,
        };
        Camera::new(driver, config)
    }

    #[test]
    fn capture_without_overlay_passes_bytes_through() {
        let camera = make_camera();
        camera.connect().unwrap();
        let result = camera.capture_raw(None, None).unwrap();
        assert!(!result.has_overlay);
    }

    #[test]
    fn connect_twice_fails() {
        let camera = make_camera();
        camera.connect().unwrap();
        let err = camera.connect().unwrap_err();
        assert_eq!(err.kind(), telescope_types::ErrorKind::AlreadyConnected);
    }
}
