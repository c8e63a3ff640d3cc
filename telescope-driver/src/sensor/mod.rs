mod arduino;
mod ascii;
mod twin;

pub use arduino::ArduinoSensorDriver;
pub use ascii::parse_line;
pub use twin::{TwinSensorDriver, TWIN_SENSOR_ID};

use telescope_types::SensorReading;

#[derive(Debug, Clone)]
pub struct SensorStatus {
    pub connected: bool,
    pub calibrated: bool,
    pub is_open: bool,
    pub error: Option<String>,
}

/// A single discoverable sensor device reported by
/// [`SensorDriverModule::discover`].
#[derive(Debug, Clone)]
pub struct SensorDescriptor {
    pub id: String,
    pub device_type: String,
    pub name: String,
}

/// Static identification for an open sensor instance.
#[derive(Debug, Clone)]
pub struct SensorInfo {
    pub id: String,
    pub name: String,
}

/// Driver-level contract for a single open inertial/environmental sensor.
/// Calibration is applied by the caller (telescope-sensor); the driver
/// reports raw readings only.
///
/// Mirrors `CameraInstance`: a thin, synchronous surface opened by a
/// [`SensorDriverModule`].
pub trait SensorInstance: Send {
    fn get_info(&self) -> SensorInfo;
    fn get_status(&self) -> SensorStatus;
    fn read(&mut self) -> anyhow::Result<SensorReading>;

    /// Passive sample rate, if the driver already knows it (e.g. it was
    /// supplied unprompted by the firmware).
    fn sample_rate_hz(&self) -> Option<f64>;

    /// Actively asks the driver to determine its sample rate (e.g. send a
    /// STATUS query and parse the response) when `sample_rate_hz` alone
    /// isn't enough. Returns `None` if the query fails or times out.
    fn query_sample_rate(&mut self) -> Option<f64>;

    fn reset(&mut self) -> anyhow::Result<()>;
    fn close(&mut self) -> anyhow::Result<()>;
}

/// Factory/enumeration contract for a sensor backend (one per vendor
/// firmware protocol, or the digital twin).
pub trait SensorDriverModule: Send + Sync {
    fn discover(&self) -> anyhow::Result<Vec<SensorDescriptor>>;
    fn open(&self, id: &str) -> anyhow::Result<Box<dyn SensorInstance>>;
}
