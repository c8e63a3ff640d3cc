use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Altitude,
    Azimuth,
}

impl Axis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Altitude => "altitude",
            Axis::Azimuth => "azimuth",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitSide {
    Min,
    Max,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotorStatus {
    pub motor: Axis,
    pub is_moving: bool,
    pub position_steps: i64,
    pub speed: u8,
    pub target_steps: Option<i64>,
    pub stalled: bool,
    pub at_limit: Option<LimitSide>,
}

/// Per-axis soft-limit and motion profile configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisConfig {
    pub min_steps: i64,
    pub max_steps: i64,
    pub home_steps: i64,
    pub steps_per_degree: f64,
    pub max_speed_steps_per_s: f64,
    pub accel_time_s: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotorConfig {
    pub altitude: AxisConfig,
    pub azimuth: AxisConfig,
    pub simulate_timing: bool,
}
