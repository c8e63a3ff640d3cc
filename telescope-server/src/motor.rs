use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use telescope_types::Axis;

use crate::error::{ApiError, ValidationError};
use crate::state::AppState;

fn valid_direction(axis: Axis, direction: &str) -> bool {
    match axis {
        Axis::Altitude => matches!(direction, "up" | "down"),
        Axis::Azimuth => matches!(direction, "cw" | "ccw" | "left" | "right"),
    }
}

fn direction_sign(axis: Axis, direction: &str) -> i64 {
    match (axis, direction) {
        (Axis::Altitude, "up") => 1,
        (Axis::Altitude, "down") => -1,
        (Axis::Azimuth, "cw" | "right") => 1,
        (Axis::Azimuth, "ccw" | "left") => -1,
        _ => 0,
    }
}

#[derive(Debug, Deserialize)]
pub struct MoveParams {
    steps: i64,
    speed: u8,
}

/// `POST /api/motor/{axis}?steps=&speed=` — absolute-step move.
pub async fn move_axis(
    Path(axis): Path<Axis>,
    Query(params): Query<MoveParams>,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let motor = state.motor.clone();
    tokio::task::spawn_blocking(move || motor.move_to(axis, params.steps, params.speed))
        .await
        .map_err(|e| telescope_types::Error::Internal(e.to_string()))??;
    Ok(Json(json!({ "motor": axis.as_str(), "position_steps": params.steps })))
}

#[derive(Debug, Deserialize)]
pub struct NudgeParams {
    direction: String,
    degrees: f64,
    #[serde(default = "default_speed")]
    speed: u8,
}

fn default_speed() -> u8 {
    50
}

pub async fn nudge(
    Path(axis): Path<Axis>,
    Query(params): Query<NudgeParams>,
    State(state): State<AppState>,
) -> Response {
    if !valid_direction(axis, &params.direction) {
        return ValidationError(format!("invalid direction '{}' for {}", params.direction, axis.as_str())).into_response();
    }
    if !(0.01..=10.0).contains(&params.degrees) {
        return ValidationError("degrees must be in [0.01, 10]".into()).into_response();
    }
    if !(1..=100).contains(&params.speed) {
        return ValidationError("speed must be in [1, 100]".into()).into_response();
    }

    let axis_config = match axis {
        Axis::Altitude => state.motor.config().altitude,
        Axis::Azimuth => state.motor.config().azimuth,
    };
    let delta_steps = (direction_sign(axis, &params.direction) as f64 * params.degrees * axis_config.steps_per_degree).round() as i64;

    let motor = state.motor.clone();
    let speed = params.speed;
    let result = tokio::task::spawn_blocking(move || motor.move_relative(axis, delta_steps, speed)).await;
    match result {
        Ok(Ok(())) => Json(json!({ "motor": axis.as_str(), "delta_steps": delta_steps })).into_response(),
        Ok(Err(e)) => ApiError(e).into_response(),
        Err(e) => ApiError(telescope_types::Error::Internal(e.to_string())).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct StartParams {
    direction: String,
    #[serde(default = "default_speed")]
    speed: u8,
}

/// Continuous-motion start: moves toward the axis's travel limit in
/// `direction` until `stop` is called.
pub async fn start(
    Path(axis): Path<Axis>,
    Query(params): Query<StartParams>,
    State(state): State<AppState>,
) -> Response {
    if !valid_direction(axis, &params.direction) {
        return ValidationError(format!("invalid direction '{}' for {}", params.direction, axis.as_str())).into_response();
    }
    if !(1..=100).contains(&params.speed) {
        return ValidationError("speed must be in [1, 100]".into()).into_response();
    }

    let axis_config = match axis {
        Axis::Altitude => state.motor.config().altitude,
        Axis::Azimuth => state.motor.config().azimuth,
    };
    let target = if direction_sign(axis, &params.direction) > 0 {
        axis_config.max_steps
    } else {
        axis_config.min_steps
    };

    let motor = state.motor.clone();
    let speed = params.speed;
    tokio::task::spawn(async move {
        let _ = tokio::task::spawn_blocking(move || motor.move_to(axis, target, speed)).await;
    });

    Json(json!({ "motor": axis.as_str(), "moving_toward": target })).into_response()
}

#[derive(Debug, Deserialize)]
pub struct StopParams {
    axis: Option<Axis>,
}

pub async fn stop(Query(params): Query<StopParams>, State(state): State<AppState>) -> Json<serde_json::Value> {
    state.motor.stop(params.axis);
    Json(json!({ "stopped": params.axis.map(|a| a.as_str()).unwrap_or("all") }))
}

pub async fn home_set(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    state.motor.zero_position(Axis::Altitude);
    state.motor.zero_position(Axis::Azimuth);
    Ok(Json(json!({ "altitude": 0, "azimuth": 0 })))
}
