pub mod camera;
pub mod clock;
pub mod error;
pub mod motor;
pub mod sensor;
pub mod session;

pub use camera::*;
pub use clock::{Clock, SystemClock};
pub use error::{Error, ErrorKind, Result};
pub use motor::*;
pub use sensor::{CalibrationOffsets, SensorReading, Vec3};
pub use session::*;
