use std::collections::HashMap;
use std::sync::Arc;

use telescope_types::{CaptureOptions, CaptureResult, Error, ImageFormat, Result};

use crate::camera::Camera;

/// Process-wide map from a short camera key (`"finder"`, `"main"`) to owned
/// Camera instances, plus coordinated multi-camera operations.
#[derive(Default)]
pub struct Registry {
    cameras: HashMap<String, Arc<Camera>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry { cameras: HashMap::new() }
    }

    pub fn insert(&mut self, key: impl Into<String>, camera: Arc<Camera>) {
        self.cameras.insert(key.into(), camera);
    }

    pub fn get(&self, key: &str) -> Result<Arc<Camera>> {
        self.cameras
            .get(key)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("camera '{key}'")))
    }

    pub fn keys(&self) -> Vec<String> {
        self.cameras.keys().cloned().collect()
    }

    pub fn shutdown(&self) {
        for camera in self.cameras.values() {
            camera.disconnect();
        }
    }
}

pub struct SyncCaptureRequest {
    pub primary: String,
    pub secondary: String,
    pub primary_exposure_us: u64,
    pub secondary_exposure_us: u64,
    pub primary_gain: Option<i32>,
    pub secondary_gain: Option<i32>,
}

pub struct SyncCaptureResponse {
    pub primary_frame: CaptureResult,
    pub secondary_frame: CaptureResult,
    pub timing_error_us: i64,
    pub timing_error_ms: f64,
}

/// Coordinates a synchronized two-camera capture across Cameras held in a
/// [`Registry`]. Does not own camera lifecycle; only reads by key.
pub struct CameraController {
    registry: Arc<Registry>,
}

impl CameraController {
    pub fn new(registry: Arc<Registry>) -> Self {
        CameraController { registry }
    }

    pub async fn sync_capture(&self, req: SyncCaptureRequest) -> Result<SyncCaptureResponse> {
        let primary = self.registry.get(&req.primary)?;
        let secondary = self.registry.get(&req.secondary)?;

        let primary_opts = CaptureOptions {
            exposure_us: Some(req.primary_exposure_us),
            gain: req.primary_gain,
            apply_overlay: false,
            format: Some(ImageFormat::Jpeg),
        };
        let secondary_opts = CaptureOptions {
            exposure_us: Some(req.secondary_exposure_us),
            gain: req.secondary_gain,
            apply_overlay: false,
            format: Some(ImageFormat::Jpeg),
        };

        let (primary_frame, secondary_frame) = tokio::try_join!(
            tokio::task::spawn_blocking({
                let primary = primary.clone();
                move || primary.capture(&primary_opts)
            }),
            tokio::task::spawn_blocking({
                let secondary = secondary.clone();
                move || secondary.capture(&secondary_opts)
            }),
        )
        .map_err(|e| Error::Internal(e.to_string()))?;

        let primary_frame = primary_frame?;
        let secondary_frame = secondary_frame?;

        let timing_error_us = (primary_frame.timestamp_utc - secondary_frame.timestamp_utc)
            .num_microseconds()
            .unwrap_or(0)
            .abs();

        Ok(SyncCaptureResponse {
            primary_frame,
            secondary_frame,
            timing_error_us,
            timing_error_ms: timing_error_us as f64 / 1000.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use telescope_driver::camera::{TwinCameraConfig, TwinCameraDriver};
    use telescope_types::CameraConfig;

    fn connected_camera(id: &str) -> Arc<Camera> {
        let driver = Arc::new(TwinCameraDriver::new(TwinCameraConfig { id: id.into(), ..Default::default() }));
        let camera = Arc::new(Camera::new(
            driver,
            CameraConfig { camera_id: id.into(), name: None, default_gain: 0, default_exposure_us: 1000 },
        ));
        camera.connect().unwrap();
        camera
    }

    #[tokio::test]
    async fn sync_capture_reports_timing_error_ms_consistent_with_us() {
        let mut registry = Registry::new();
        registry.insert("finder", connected_camera("finder"));
        registry.insert("main", connected_camera("main"));
        let controller = CameraController::new(Arc::new(registry));

        let resp = controller
            .sync_capture(SyncCaptureRequest {
                primary: "finder".into(),
                secondary: "main".into(),
                primary_exposure_us: 2_000_000,
                secondary_exposure_us: 100_000,
                primary_gain: None,
                secondary_gain: None,
            })
            .await
            .unwrap();

        assert_eq!(resp.timing_error_ms, resp.timing_error_us as f64 / 1000.0);
    }

    #[tokio::test]
    async fn sync_capture_unknown_camera_is_not_found() {
        let registry = Registry::new();
        let controller = CameraController::new(Arc::new(registry));
        let err = controller
            .sync_capture(SyncCaptureRequest {
                primary: "missing".into(),
                secondary: "also-missing".into(),
                primary_exposure_us: 1000,
                secondary_exposure_us: 1000,
                primary_gain: None,
                secondary_gain: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), telescope_types::ErrorKind::NotFound);
    }
}
