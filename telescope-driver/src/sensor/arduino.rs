use std::io::{BufRead, BufReader, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use telescope_types::SensorReading;

use super::ascii::parse_line;
use super::{SensorDescriptor, SensorDriverModule, SensorInfo, SensorInstance, SensorStatus};

const BAUD_RATE: u32 = 115_200;
const STATUS_QUERY_WAIT: Duration = Duration::from_millis(200);

/// Serial-port backend for the Arduino-based inertial sensor. `open` spawns
/// the background reader thread once per instance.
pub struct ArduinoSensorDriver {
    port_path: String,
}

impl ArduinoSensorDriver {
    pub fn new(port_path: impl Into<String>) -> Self {
        ArduinoSensorDriver { port_path: port_path.into() }
    }
}

impl SensorDriverModule for ArduinoSensorDriver {
    fn discover(&self) -> anyhow::Result<Vec<SensorDescriptor>> {
        Ok(vec![SensorDescriptor {
            id: self.port_path.clone(),
            device_type: "arduino_serial".into(),
            name: format!("Arduino sensor ({})", self.port_path),
        }])
    }

    fn open(&self, id: &str) -> anyhow::Result<Box<dyn SensorInstance>> {
        anyhow::ensure!(id == self.port_path, "no such sensor: {id}");
        Ok(Box::new(ArduinoSensorInstance::open(&self.port_path)?))
    }
}

/// Spawns a background reader thread that continuously parses lines off the
/// port and publishes the latest reading under a mutex, mirroring the
/// triggerbox serial thread's read-and-publish loop.
pub struct ArduinoSensorInstance {
    port_path: String,
    writer: Mutex<Box<dyn serialport::SerialPort>>,
    latest: Arc<Mutex<Option<SensorReading>>>,
    alive: Arc<AtomicBool>,
    sample_rate_hz: Arc<Mutex<Option<f64>>>,
    calibrated: Arc<AtomicBool>,
}

impl ArduinoSensorInstance {
    fn open(port_path: &str) -> anyhow::Result<Self> {
        let port = serialport::new(port_path, BAUD_RATE)
            .timeout(Duration::from_millis(500))
            .open()?;
        let reader_port = port.try_clone()?;

        let latest = Arc::new(Mutex::new(None));
        let alive = Arc::new(AtomicBool::new(true));
        let sample_rate_hz = Arc::new(Mutex::new(None));

        spawn_reader(reader_port, latest.clone(), alive.clone(), sample_rate_hz.clone());

        Ok(ArduinoSensorInstance {
            port_path: port_path.to_string(),
            writer: Mutex::new(port),
            latest,
            alive,
            sample_rate_hz,
            calibrated: Arc::new(AtomicBool::new(false)),
        })
    }

    fn send_command(&self, cmd: &str) -> anyhow::Result<()> {
        let mut writer = self.writer.lock();
        writer.write_all(cmd.as_bytes())?;
        writer.write_all(b"\r\n")?;
        writer.flush()?;
        Ok(())
    }

    pub fn calibrate(&self) -> anyhow::Result<()> {
        self.send_command("CALIBRATE")?;
        self.calibrated.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn spawn_reader(
    port: Box<dyn serialport::SerialPort>,
    latest: Arc<Mutex<Option<SensorReading>>>,
    alive: Arc<AtomicBool>,
    sample_rate_hz: Arc<Mutex<Option<f64>>>,
) {
    std::thread::Builder::new()
        .name("sensor-serial-reader".into())
        .spawn(move || {
            let mut reader = BufReader::new(port);
            let mut line = String::new();
            while alive.load(Ordering::SeqCst) {
                line.clear();
                match reader.read_line(&mut line) {
                    Ok(0) => continue,
                    Ok(_) => {
                        if let Some(rate) = parse_sample_rate(&line) {
                            *sample_rate_hz.lock() = Some(rate);
                            continue;
                        }
                        match parse_line(&line) {
                            Ok(Some(reading)) => *latest.lock() = Some(reading),
                            Ok(None) => {}
                            Err(e) => debug!(error = %e, "unparsable sensor line"),
                        }
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                    Err(e) => {
                        warn!(error = %e, "sensor serial read failed");
                        break;
                    }
                }
            }
        })
        .expect("spawn sensor serial reader thread");
}

fn parse_sample_rate(line: &str) -> Option<f64> {
    let idx = line.find("Sample Rate:")?;
    let rest = &line[idx + "Sample Rate:".len()..];
    rest.trim().split_whitespace().next()?.parse::<f64>().ok()
}

impl SensorInstance for ArduinoSensorInstance {
    fn get_info(&self) -> SensorInfo {
        SensorInfo { id: self.port_path.clone(), name: format!("Arduino sensor ({})", self.port_path) }
    }

    fn get_status(&self) -> SensorStatus {
        SensorStatus {
            connected: self.alive.load(Ordering::SeqCst),
            calibrated: self.calibrated.load(Ordering::SeqCst),
            is_open: true,
            error: None,
        }
    }

    fn read(&mut self) -> anyhow::Result<SensorReading> {
        self.latest
            .lock()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no sensor reading available yet from {}", self.port_path))
    }

    fn sample_rate_hz(&self) -> Option<f64> {
        *self.sample_rate_hz.lock()
    }

    /// Sends a STATUS query and gives the reader thread a moment to parse
    /// the firmware's "Sample Rate: N Hz" response before re-checking.
    fn query_sample_rate(&mut self) -> Option<f64> {
        if let Err(e) = self.send_command("STATUS") {
            warn!(error = %e, "failed to send STATUS query to sensor");
            return None;
        }
        std::thread::sleep(STATUS_QUERY_WAIT);
        self.sample_rate_hz()
    }

    fn reset(&mut self) -> anyhow::Result<()> {
        self.send_command("RESET")?;
        self.calibrated.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        self.alive.store(false, Ordering::SeqCst);
        Ok(())
    }
}
