use std::collections::HashMap;

use chrono::Utc;
use parking_lot::Mutex;
use telescope_types::{
    CameraSessionEntry, EventEntry, Error, FrameRecord, FrameType, LogEntry, LogLevel, ObservabilityBlock,
    Result, SessionArchive, SessionMeta, SessionMetrics, SessionType,
};

fn slugify(s: &str) -> String {
    let lowered = s.to_lowercase();
    let replaced: String = lowered
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    replaced.chars().take(20).collect()
}

pub fn make_session_id(session_type: SessionType, target: Option<&str>, purpose: Option<&str>) -> String {
    let slug_source = target.or(purpose);
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    match slug_source {
        Some(s) if !s.is_empty() => format!("{}_{}_{}", session_type.as_str(), slugify(s), timestamp),
        _ => format!("{}_{}", session_type.as_str(), timestamp),
    }
}

struct Mutable {
    logs: Vec<LogEntry>,
    events: Vec<EventEntry>,
    telemetry: HashMap<String, Vec<serde_json::Value>>,
    calibration: HashMap<String, Vec<serde_json::Value>>,
    cameras: HashMap<String, CameraSessionEntry>,
    metrics: SessionMetrics,
    closed: bool,
    end_time: Option<chrono::DateTime<Utc>>,
}

/// Accumulates frames, logs, events, telemetry, and calibration data for one
/// observatory session. One-way state machine: open, mutable, until
/// `close()`, after which every mutation fails with `SessionClosed`.
pub struct Session {
    pub session_type: SessionType,
    pub session_id: String,
    pub target: Option<String>,
    pub purpose: Option<String>,
    pub location: Option<String>,
    pub start_time: chrono::DateTime<Utc>,
    inner: Mutex<Mutable>,
}

impl Session {
    pub fn new(
        session_type: SessionType,
        target: Option<String>,
        purpose: Option<String>,
        location: Option<String>,
    ) -> Self {
        let session_id = make_session_id(session_type, target.as_deref(), purpose.as_deref());
        Session {
            session_type,
            session_id,
            target,
            purpose,
            location,
            start_time: Utc::now(),
            inner: Mutex::new(Mutable {
                logs: Vec::new(),
                events: Vec::new(),
                telemetry: HashMap::new(),
                calibration: HashMap::new(),
                cameras: HashMap::new(),
                metrics: SessionMetrics::default(),
                closed: false,
                end_time: None,
            }),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    fn check_open(&self) -> Result<()> {
        if self.inner.lock().closed {
            return Err(Error::session_closed(self.session_id.clone()));
        }
        Ok(())
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>, context: Option<serde_json::Value>) -> Result<()> {
        self.check_open()?;
        let mut inner = self.inner.lock();
        match level {
            LogLevel::Warning => inner.metrics.warnings += 1,
            LogLevel::Error | LogLevel::Critical => inner.metrics.errors += 1,
            _ => {}
        }
        inner.logs.push(LogEntry { timestamp: Utc::now(), level, message: message.into(), context });
        Ok(())
    }

    pub fn add_event(&self, name: impl Into<String>, details: Option<serde_json::Value>) -> Result<()> {
        self.check_open()?;
        self.inner.lock().events.push(EventEntry { timestamp: Utc::now(), event: name.into(), details });
        Ok(())
    }

    pub fn add_frame(
        &self,
        camera_key: &str,
        frame_type: FrameType,
        data: Vec<u8>,
        dtype: impl Into<String>,
        width: u32,
        height: u32,
        meta: HashMap<String, serde_json::Value>,
    ) -> Result<usize> {
        self.check_open()?;
        let mut inner = self.inner.lock();
        let entry = inner.cameras.entry(camera_key.to_string()).or_default();
        let record = FrameRecord { data, dtype: dtype.into(), width, height, meta };
        entry.frames_mut(frame_type).push(record);
        let idx = entry.frames_mut(frame_type).len() - 1;
        inner.metrics.frames_captured += 1;
        Ok(idx)
    }

    pub fn add_telemetry(&self, kind: &str, entry: serde_json::Value) -> Result<()> {
        self.check_open()?;
        self.inner.lock().telemetry.entry(kind.to_string()).or_default().push(entry);
        Ok(())
    }

    pub fn add_calibration(&self, kind: &str, entry: serde_json::Value) -> Result<()> {
        self.check_open()?;
        self.inner.lock().calibration.entry(kind.to_string()).or_default().push(entry);
        Ok(())
    }

    /// Closes the session and returns the archive payload ready to be
    /// written to disk. Idempotent calls after the first fail.
    pub fn close(&self) -> Result<SessionArchive> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(Error::session_closed(self.session_id.clone()));
        }
        inner.closed = true;
        let end_time = Utc::now();
        inner.end_time = Some(end_time);
        inner.metrics.duration_seconds = (end_time - self.start_time).num_milliseconds() as f64 / 1000.0;

        Ok(SessionArchive {
            meta: SessionMeta {
                session_type: self.session_type,
                session_id: self.session_id.clone(),
                target: self.target.clone(),
                purpose: self.purpose.clone(),
                location: self.location.clone(),
                start_time: self.start_time,
                end_time: Some(end_time),
            },
            observability: ObservabilityBlock {
                metrics: inner.metrics.clone(),
                logs: inner.logs.clone(),
                events: inner.events.clone(),
            },
            telemetry: inner.telemetry.clone(),
            calibration: inner.calibration.clone(),
            cameras: inner.cameras.clone(),
        })
    }
}
