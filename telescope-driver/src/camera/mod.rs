mod twin;

pub use twin::{TwinCameraConfig, TwinCameraDriver};

use telescope_types::CameraInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Raw8,
    Raw16,
    Rgb24,
}

/// A single discoverable camera device reported by [`CameraDriverModule::discover`].
#[derive(Debug, Clone)]
pub struct CameraDescriptor {
    pub id: String,
    pub device_type: String,
    pub name: String,
}

/// Driver-level contract for a single open camera.
///
/// Mirrors ci2's `Camera` trait: a thin, synchronous surface that the
/// logical `Camera` (telescope-camera) calls from worker threads. Hardware
/// adapters and the digital twin both implement this trait identically from
/// the caller's perspective.
pub trait CameraInstance: Send {
    fn get_info(&self) -> CameraInfo;
    fn get_control(&self, name: &str) -> anyhow::Result<(i32, bool)>;
    fn set_control(&mut self, name: &str, value: i32) -> anyhow::Result<()>;
    fn capture(&mut self, exposure_us: u64) -> anyhow::Result<Vec<u8>>;
    fn start_video_capture(&mut self, image_type: ImageType) -> anyhow::Result<()>;
    fn capture_video_frame(&mut self, buf: &mut [u8], timeout_ms: u64) -> anyhow::Result<()>;
    fn stop_video_capture(&mut self) -> anyhow::Result<()>;
    fn set_roi(&mut self, width: u32, height: u32, bins: u32, image_type: ImageType) -> anyhow::Result<()>;
    fn close(&mut self) -> anyhow::Result<()>;
}

/// Factory/enumeration contract for a camera backend (one per vendor SDK, or
/// the digital twin).
pub trait CameraDriverModule: Send + Sync {
    fn discover(&self) -> anyhow::Result<Vec<CameraDescriptor>>;
    fn open(&self, id: &str) -> anyhow::Result<Box<dyn CameraInstance>>;
}
