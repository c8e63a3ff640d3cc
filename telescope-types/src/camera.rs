use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    pub camera_id: String,
    pub name: Option<String>,
    pub default_gain: i32,
    pub default_exposure_us: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlInfo {
    pub min: i32,
    pub max: i32,
    pub default: i32,
    pub current: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraInfo {
    pub camera_id: String,
    pub name: String,
    pub max_width: u32,
    pub max_height: u32,
    pub is_color: bool,
    pub bayer_pattern: Option<String>,
    pub supported_bins: Vec<u32>,
    pub controls: HashMap<String, ControlInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayType {
    None,
    Crosshair,
    Grid,
    Circles,
    Custom,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    pub enabled: bool,
    pub overlay_type: OverlayType,
    pub color: RgbColor,
    pub opacity: f32,
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        OverlayConfig {
            enabled: false,
            overlay_type: OverlayType::None,
            color: RgbColor { r: 255, g: 0, b: 0 },
            opacity: 1.0,
            params: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    Jpeg,
    Raw,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureOptions {
    pub exposure_us: Option<u64>,
    pub gain: Option<i32>,
    #[serde(default = "default_true")]
    pub apply_overlay: bool,
    #[serde(default = "default_format")]
    pub format: Option<ImageFormat>,
}

fn default_true() -> bool {
    true
}

fn default_format() -> Option<ImageFormat> {
    Some(ImageFormat::Jpeg)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureResult {
    pub image_bytes: Vec<u8>,
    pub timestamp_utc: DateTime<Utc>,
    pub exposure_us: u64,
    pub gain: i32,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: ImageFormat,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub has_overlay: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamFrame {
    pub image_bytes: Vec<u8>,
    pub timestamp_utc: DateTime<Utc>,
    pub sequence: u64,
    pub exposure_us: u64,
    pub gain: i32,
    pub has_overlay: bool,
}
