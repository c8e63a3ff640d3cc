use std::sync::Arc;

use parking_lot::Mutex;
use telescope_driver::sensor::{SensorDriverModule, SensorInstance};
use telescope_types::{CalibrationOffsets, Error, Result, SensorReading, Vec3};
use tracing::warn;

const DEFAULT_SAMPLE_RATE_HZ: f64 = 10.0;

struct ConnectedState {
    driver: Box<dyn SensorInstance>,
    sample_rate_hz: f64,
}

/// Async wrapper over a synchronous sensor driver. Dispatches blocking
/// driver reads to a worker thread; averages multi-sample reads with a
/// circular mean for azimuth and an arithmetic mean for every other field.
pub struct Sensor {
    driver: Arc<dyn SensorDriverModule>,
    sensor_id: String,
    state: Arc<Mutex<Option<ConnectedState>>>,
    offsets: Arc<Mutex<CalibrationOffsets>>,
}

impl Sensor {
    /// Opens `sensor_id` on `driver` on `connect`, mirroring the
    /// discover/open factory split used by cameras.
    pub fn new(driver: Arc<dyn SensorDriverModule>, sensor_id: impl Into<String>) -> Self {
        Sensor {
            driver,
            sensor_id: sensor_id.into(),
            state: Arc::new(Mutex::new(None)),
            offsets: Arc::new(Mutex::new(CalibrationOffsets::default())),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().is_some()
    }

    pub async fn connect(&self) -> Result<()> {
        {
            let state = self.state.lock();
            if state.is_some() {
                return Err(Error::already_connected("sensor"));
            }
        }
        let driver = self.driver.clone();
        let sensor_id = self.sensor_id.clone();
        let (driver, sample_rate_hz) = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let mut instance = driver.open(&sensor_id)?;
            // sample_rate_hz() alone only works if the firmware emitted a
            // rate line unprompted; fall back to an active STATUS query.
            let sample_rate_hz = instance.sample_rate_hz().or_else(|| instance.query_sample_rate());
            Ok((instance, sample_rate_hz))
        })
        .await
        .map_err(|e| Error::Internal(e.to_string()))?
        .map_err(|e| Error::driver("sensor", e))?;

        let sample_rate_hz = sample_rate_hz.unwrap_or(DEFAULT_SAMPLE_RATE_HZ);
        *self.state.lock() = Some(ConnectedState { driver, sample_rate_hz });
        Ok(())
    }

    pub async fn disconnect(&self) {
        let taken = self.state.lock().take();
        if let Some(mut connected) = taken {
            if let Err(e) = connected.driver.close() {
                warn!(error = %e, "error closing sensor driver during disconnect");
            }
        }
    }

    fn take_driver_call<T: Send + 'static>(
        &self,
        f: impl FnOnce(&mut dyn SensorInstance) -> anyhow::Result<T> + Send + 'static,
    ) -> Result<T>
    where
        T: 'static,
    {
        let state = self.state.clone();
        let mut guard = state.lock();
        let connected = guard.as_mut().ok_or_else(|| Error::not_connected("sensor"))?;
        f(connected.driver.as_mut()).map_err(|e| Error::driver("sensor", e))
    }

    /// Takes `samples` sequential synchronous reads from the driver and
    /// averages them. `samples == 1` returns the raw reading as-is.
    pub async fn read(&self, samples: u32) -> Result<SensorReading> {
        if samples < 1 {
            return Err(Error::range("samples", "must be >= 1"));
        }
        let mut readings = Vec::with_capacity(samples as usize);
        for _ in 0..samples {
            let reading = self.read_one().await?;
            readings.push(reading);
        }
        Ok(average_readings(&readings, *self.offsets.lock()))
    }

    async fn read_one(&self) -> Result<SensorReading> {
        self.take_driver_call(|driver| driver.read())
    }

    pub async fn read_for(&self, duration_ms: u64) -> Result<SensorReading> {
        if duration_ms < 1 {
            return Err(Error::range("duration_ms", "must be >= 1"));
        }
        let sample_rate_hz = {
            let state = self.state.lock();
            let connected = state.as_ref().ok_or_else(|| Error::not_connected("sensor"))?;
            connected.sample_rate_hz
        };
        let samples = ((duration_ms as f64 / 1000.0) * sample_rate_hz).round().max(1.0) as u32;
        self.read(samples).await
    }

    pub async fn calibrate(&self, true_alt: f64, true_az: f64) -> Result<()> {
        if !(0.0..=90.0).contains(&true_alt) {
            return Err(Error::range("true_alt", "must be in [0, 90]"));
        }
        if !(0.0..360.0).contains(&true_az) {
            return Err(Error::range("true_az", "must be in [0, 360)"));
        }
        let raw = self.read_one().await?;
        let mut offsets = self.offsets.lock();
        offsets.altitude_deg = true_alt - raw.altitude_deg;
        offsets.azimuth_deg = normalize_deg(true_az - raw.azimuth_deg);
        Ok(())
    }

    pub fn reset_calibration(&self) {
        *self.offsets.lock() = CalibrationOffsets::default();
    }

    pub async fn get_status(&self) -> serde_json::Value {
        let status = {
            let state = self.state.lock();
            state.as_ref().map(|c| c.driver.get_status())
        };
        match status {
            Some(s) => serde_json::json!({
                "connected": s.connected,
                "calibrated": s.calibrated,
                "is_open": s.is_open,
                "error": s.error,
            }),
            None => serde_json::json!({ "connected": false, "calibrated": false, "is_open": false }),
        }
    }
}

fn normalize_deg(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

fn circular_mean_deg(values: &[f64]) -> f64 {
    let (sin_sum, cos_sum) = values.iter().fold((0.0, 0.0), |(s, c), v| {
        let rad = v.to_radians();
        (s + rad.sin(), c + rad.cos())
    });
    normalize_deg(sin_sum.atan2(cos_sum).to_degrees())
}

fn arithmetic_mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn average_readings(readings: &[SensorReading], offsets: CalibrationOffsets) -> SensorReading {
    let n = readings.len();
    let last = readings.last().expect("at least one reading").clone();
    if n == 1 {
        return apply_offsets(last, offsets);
    }

    let accel = Vec3 {
        x: arithmetic_mean(&readings.iter().map(|r| r.accel.x).collect::<Vec<_>>()),
        y: arithmetic_mean(&readings.iter().map(|r| r.accel.y).collect::<Vec<_>>()),
        z: arithmetic_mean(&readings.iter().map(|r| r.accel.z).collect::<Vec<_>>()),
    };
    let mag = Vec3 {
        x: arithmetic_mean(&readings.iter().map(|r| r.mag.x).collect::<Vec<_>>()),
        y: arithmetic_mean(&readings.iter().map(|r| r.mag.y).collect::<Vec<_>>()),
        z: arithmetic_mean(&readings.iter().map(|r| r.mag.z).collect::<Vec<_>>()),
    };
    let altitude_deg = arithmetic_mean(&readings.iter().map(|r| r.altitude_deg).collect::<Vec<_>>());
    let azimuth_deg = circular_mean_deg(&readings.iter().map(|r| r.azimuth_deg).collect::<Vec<_>>());
    let temperature_c = arithmetic_mean(&readings.iter().map(|r| r.temperature_c).collect::<Vec<_>>());
    let humidity_pct = arithmetic_mean(&readings.iter().map(|r| r.humidity_pct).collect::<Vec<_>>());
    let raw_values = readings.iter().map(|r| r.raw_values.as_str()).collect::<Vec<_>>().join(";");

    apply_offsets(
        SensorReading {
            accel,
            mag,
            altitude_deg,
            azimuth_deg,
            temperature_c,
            humidity_pct,
            timestamp_utc: last.timestamp_utc,
            raw_values,
        },
        offsets,
    )
}

fn apply_offsets(mut reading: SensorReading, offsets: CalibrationOffsets) -> SensorReading {
    reading.altitude_deg += offsets.altitude_deg;
    reading.azimuth_deg = normalize_deg(reading.azimuth_deg + offsets.azimuth_deg);
    reading
}

#[cfg(test)]
mod tests {
    use super::*;
    use telescope_driver::sensor::{TwinSensorDriver, TWIN_SENSOR_ID};

    fn make_sensor() -> Sensor {
        Sensor::new(Arc::new(TwinSensorDriver::new()), TWIN_SENSOR_ID)
    }

    #[tokio::test]
    async fn read_for_converts_duration_to_sample_count() {
        let sensor = make_sensor();
        sensor.connect().await.unwrap();
        let reading = sensor.read_for(500).await.unwrap();
        assert!(reading.azimuth_deg >= 0.0 && reading.azimuth_deg < 360.0);
    }

    #[test]
    fn circular_mean_handles_wraparound() {
        let avg = circular_mean_deg(&[350.0, 10.0]);
        assert!((350.0..360.0).contains(&avg) || (0.0..=10.0).contains(&avg));
    }

    #[tokio::test]
    async fn calibrate_rejects_out_of_range_altitude() {
        let sensor = make_sensor();
        sensor.connect().await.unwrap();
        let err = sensor.calibrate(120.0, 10.0).await.unwrap_err();
        assert_eq!(err.kind(), telescope_types::ErrorKind::RangeError);
    }
}
