use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    pub accel: Vec3,
    pub mag: Vec3,
    pub altitude_deg: f64,
    pub azimuth_deg: f64,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub timestamp_utc: DateTime<Utc>,
    pub raw_values: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CalibrationOffsets {
    pub altitude_deg: f64,
    pub azimuth_deg: f64,
}
