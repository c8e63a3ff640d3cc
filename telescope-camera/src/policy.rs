use telescope_types::{CameraInfo, OverlayConfig};

/// Encodes raw sensor bytes to JPEG and draws text labels on top, the two
/// operations the streaming pipeline and error-frame generator need from an
/// image backend. Kept as a trait so tests can substitute a fast stub.
pub trait ImageEncoder: Send + Sync {
    fn encode_jpeg_gray(&self, pixels: &[u8], width: u32, height: u32, quality: u8) -> anyhow::Result<Vec<u8>>;
    fn put_text(&self, pixels: &mut [u8], width: u32, height: u32, text: &str);
}

pub struct DefaultImageEncoder;

impl ImageEncoder for DefaultImageEncoder {
    fn encode_jpeg_gray(&self, pixels: &[u8], width: u32, height: u32, quality: u8) -> anyhow::Result<Vec<u8>> {
        crate::encode::encode_jpeg_gray(pixels, width, height, quality)
    }

    fn put_text(&self, pixels: &mut [u8], width: u32, height: u32, text: &str) {
        crate::overlay::stamp_text_gray(pixels, width, height, text);
    }
}

/// Turns a captured image plus overlay configuration into a rendered image.
/// The default implementation draws crosshair/grid/circle overlays directly
/// onto the JPEG-decoded buffer; `NullRenderer` is a passthrough used when no
/// overlay is configured.
pub trait OverlayRenderer: Send + Sync {
    fn render(&self, image_bytes: &[u8], config: &OverlayConfig, info: &CameraInfo) -> anyhow::Result<Vec<u8>>;
}

pub struct NullRenderer;

impl OverlayRenderer for NullRenderer {
    fn render(&self, image_bytes: &[u8], _config: &OverlayConfig, _info: &CameraInfo) -> anyhow::Result<Vec<u8>> {
        Ok(image_bytes.to_vec())
    }
}

/// Attempts to revive a camera after a driver failure. Must not panic or
/// block indefinitely; returning `false` tells the caller recovery is not
/// possible right now.
pub trait RecoveryStrategy: Send + Sync {
    fn attempt_recovery(&self, camera_id: &str) -> bool;
}

pub struct NullRecoveryStrategy;

impl RecoveryStrategy for NullRecoveryStrategy {
    fn attempt_recovery(&self, _camera_id: &str) -> bool {
        false
    }
}

/// Optional event callbacks. Every hook has a no-op default so callers only
/// implement the ones they need. Errors raised from `on_disconnect` are
/// swallowed by the caller; all others propagate.
#[derive(Default)]
pub struct CameraHooks {
    pub on_connect: Option<Box<dyn Fn(&CameraInfo) + Send + Sync>>,
    pub on_disconnect: Option<Box<dyn Fn() + Send + Sync>>,
    pub on_capture: Option<Box<dyn Fn(&telescope_types::CaptureResult) + Send + Sync>>,
    pub on_stream_frame: Option<Box<dyn Fn(&telescope_types::StreamFrame) + Send + Sync>>,
    pub on_error: Option<Box<dyn Fn(&anyhow::Error) + Send + Sync>>,
}
