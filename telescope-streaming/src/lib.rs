pub mod arbiter;
pub mod mjpeg;

pub use arbiter::{StreamArbiter, BANDWIDTH_DUAL, BANDWIDTH_SINGLE};
pub use mjpeg::{mjpeg_stream, MjpegConfig};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::StreamExt;
    use telescope_camera::Camera;
    use telescope_driver::camera::{TwinCameraConfig, TwinCameraDriver};
    use telescope_types::{CameraConfig, CaptureOptions};

    use super::*;

    fn make_camera() -> Arc<Camera> {
        let driver = Arc::new(TwinCameraDriver::new(TwinCameraConfig::default()));
        let config = CameraConfig {
            camera_id: "twin0".into(),
            name: Some("Test".into()),
            default_gain: 10,
            default_exposure_us: 5_000,
        };
        let camera = Camera::new(driver, config);
        camera.connect().unwrap();
        Arc::new(camera)
    }

    #[tokio::test]
    async fn mjpeg_parts_carry_frame_boundary_and_stop_on_request() {
        let camera = make_camera();
        let arbiter = StreamArbiter::new();
        let stream = mjpeg_stream(
            camera.clone(),
            &arbiter,
            "twin0".into(),
            CaptureOptions::default(),
            MjpegConfig { max_fps: 1000.0, quality: 85 },
        );
        tokio::pin!(stream);

        let first = stream.next().await.unwrap().unwrap();
        assert!(first.starts_with(b"--frame\r\n"));
        assert!(first.windows(16).any(|w| w == b"image/jpeg\r\n\r\n"));

        camera.stop_stream();
        let rest: Vec<_> = stream.collect().await;
        assert!(rest.len() <= 1);
    }

    #[test]
    fn arbiter_reports_single_then_dual_bandwidth() {
        let arbiter = StreamArbiter::new();
        let (first, first_guard) = arbiter.start();
        assert_eq!(first, BANDWIDTH_SINGLE);
        let (second, _second_guard) = arbiter.start();
        assert_eq!(second, BANDWIDTH_DUAL);
        drop(first_guard);
    }
}
