pub mod camera;
pub mod controller;
pub mod encode;
pub mod font;
pub mod overlay;
pub mod policy;

pub use camera::{Camera, RawFrame};
pub use controller::{CameraController, Registry, SyncCaptureRequest, SyncCaptureResponse};
pub use overlay::DefaultOverlayRenderer;
pub use policy::{CameraHooks, DefaultImageEncoder, ImageEncoder, NullRecoveryStrategy, NullRenderer, OverlayRenderer, RecoveryStrategy};
