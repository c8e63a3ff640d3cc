use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;
use telescope_types::{SensorReading, Vec3};

use super::{SensorDescriptor, SensorDriverModule, SensorInfo, SensorInstance, SensorStatus};

pub const TWIN_SENSOR_ID: &str = "twin-sensor";

/// Deterministic stand-in for the Arduino-based inertial sensor backend.
/// Opens into a single always-available instance that produces slowly
/// drifting synthetic orientation readings instead of reading a serial port.
pub struct TwinSensorDriver;

impl TwinSensorDriver {
    pub fn new() -> Self {
        TwinSensorDriver
    }
}

impl Default for TwinSensorDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorDriverModule for TwinSensorDriver {
    fn discover(&self) -> anyhow::Result<Vec<SensorDescriptor>> {
        Ok(vec![SensorDescriptor {
            id: TWIN_SENSOR_ID.into(),
            device_type: "digital_twin".into(),
            name: "Digital Twin Sensor".into(),
        }])
    }

    fn open(&self, id: &str) -> anyhow::Result<Box<dyn SensorInstance>> {
        if id != TWIN_SENSOR_ID {
            anyhow::bail!("no such sensor: {id}");
        }
        Ok(Box::new(TwinSensorInstance::new()))
    }
}

struct TwinSensorInstance {
    latest: Arc<Mutex<SensorReading>>,
    calibrated: bool,
    sample_rate_hz: f64,
}

impl TwinSensorInstance {
    fn new() -> Self {
        TwinSensorInstance {
            latest: Arc::new(Mutex::new(synthesize(45.0, 180.0))),
            calibrated: false,
            sample_rate_hz: 10.0,
        }
    }
}

fn synthesize(altitude_deg: f64, azimuth_deg: f64) -> SensorReading {
    let mut rng = rand::thread_rng();
    let jitter = || rng.gen_range(-0.05..0.05);
    SensorReading {
        accel: Vec3 { x: jitter(), y: jitter(), z: 1.0 + jitter() },
        mag: Vec3 {
            x: azimuth_deg.to_radians().cos(),
            y: azimuth_deg.to_radians().sin(),
            z: jitter(),
        },
        altitude_deg: altitude_deg + jitter(),
        azimuth_deg: (azimuth_deg + jitter()).rem_euclid(360.0),
        temperature_c: 18.0 + jitter(),
        humidity_pct: 40.0 + jitter(),
        timestamp_utc: chrono::Utc::now(),
        raw_values: String::new(),
    }
}

impl SensorInstance for TwinSensorInstance {
    fn get_info(&self) -> SensorInfo {
        SensorInfo { id: TWIN_SENSOR_ID.into(), name: "Digital Twin Sensor".into() }
    }

    fn get_status(&self) -> SensorStatus {
        SensorStatus { connected: true, calibrated: self.calibrated, is_open: true, error: None }
    }

    fn read(&mut self) -> anyhow::Result<SensorReading> {
        let previous = self.latest.lock().clone();
        let next = synthesize(previous.altitude_deg, previous.azimuth_deg);
        *self.latest.lock() = next.clone();
        Ok(next)
    }

    fn sample_rate_hz(&self) -> Option<f64> {
        Some(self.sample_rate_hz)
    }

    fn query_sample_rate(&mut self) -> Option<f64> {
        Some(self.sample_rate_hz)
    }

    fn reset(&mut self) -> anyhow::Result<()> {
        self.calibrated = false;
        *self.latest.lock() = synthesize(45.0, 180.0);
        Ok(())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}
