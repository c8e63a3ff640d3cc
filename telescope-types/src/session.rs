use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Observation,
    Alignment,
    Experiment,
    Maintenance,
    Idle,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Observation => "observation",
            SessionType::Alignment => "alignment",
            SessionType::Experiment => "experiment",
            SessionType::Maintenance => "maintenance",
            SessionType::Idle => "idle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameType {
    Light,
    Dark,
    Flat,
    Bias,
}

impl FrameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameType::Light => "light",
            FrameType::Dark => "dark",
            FrameType::Flat => "flat",
            FrameType::Bias => "bias",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEntry {
    pub timestamp: DateTime<Utc>,
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    pub data: Vec<u8>,
    pub dtype: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub meta: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CameraSessionEntry {
    #[serde(default)]
    pub info: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub settings: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub light: Vec<FrameRecord>,
    #[serde(default)]
    pub dark: Vec<FrameRecord>,
    #[serde(default)]
    pub flat: Vec<FrameRecord>,
    #[serde(default)]
    pub bias: Vec<FrameRecord>,
}

impl CameraSessionEntry {
    pub fn frames_mut(&mut self, frame_type: FrameType) -> &mut Vec<FrameRecord> {
        match frame_type {
            FrameType::Light => &mut self.light,
            FrameType::Dark => &mut self.dark,
            FrameType::Flat => &mut self.flat,
            FrameType::Bias => &mut self.bias,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub frames_captured: u64,
    pub errors: u64,
    pub warnings: u64,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMeta {
    pub session_type: SessionType,
    pub session_id: String,
    pub target: Option<String>,
    pub purpose: Option<String>,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityBlock {
    pub metrics: SessionMetrics,
    pub logs: Vec<LogEntry>,
    pub events: Vec<EventEntry>,
}

/// Full archive payload written on session close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionArchive {
    pub meta: SessionMeta,
    pub observability: ObservabilityBlock,
    #[serde(default)]
    pub telemetry: HashMap<String, Vec<serde_json::Value>>,
    #[serde(default)]
    pub calibration: HashMap<String, Vec<serde_json::Value>>,
    #[serde(default)]
    pub cameras: HashMap<String, CameraSessionEntry>,
}
