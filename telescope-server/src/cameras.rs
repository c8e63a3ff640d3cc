use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use telescope_types::{CaptureOptions, FrameType, ImageFormat};
use telescope_streaming::{mjpeg_stream, MjpegConfig};

use crate::error::{ApiError, ValidationError};
use crate::state::AppState;

pub async fn list_cameras(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let mut cameras = Vec::new();
    for key in state.registry.keys() {
        let camera = state.registry.get(&key)?;
        cameras.push(json!({
            "camera_id": key,
            "connected": camera.is_connected(),
            "streaming": camera.is_streaming(),
            "info": camera.info(),
        }));
    }
    Ok(Json(json!({ "cameras": cameras })))
}

#[derive(Debug, Deserialize)]
pub struct StreamParams {
    exposure_us: Option<u64>,
    gain: Option<i32>,
    #[serde(default = "default_fps")]
    fps: f64,
}

fn default_fps() -> f64 {
    15.0
}

pub async fn stream_camera(
    Path(camera_id): Path<String>,
    Query(params): Query<StreamParams>,
    State(state): State<AppState>,
) -> Response {
    if let Some(v) = params.exposure_us {
        if !(1..=60_000_000).contains(&v) {
            return ValidationError("exposure_us must be in [1, 60000000]".into()).into_response();
        }
    }
    if let Some(v) = params.gain {
        if !(0..=600).contains(&v) {
            return ValidationError("gain must be in [0, 600]".into()).into_response();
        }
    }
    if !(1.0..=60.0).contains(&params.fps) {
        return ValidationError("fps must be in [1, 60]".into()).into_response();
    }

    let camera = match state.registry.get(&camera_id) {
        Ok(c) => c,
        Err(e) => return ApiError(e).into_response(),
    };

    camera.disconnect();
    if let Err(e) = camera.connect() {
        return ApiError(e).into_response();
    }

    let options = CaptureOptions {
        exposure_us: params.exposure_us,
        gain: params.gain,
        apply_overlay: true,
        format: Some(ImageFormat::Raw),
    };
    let config = MjpegConfig { max_fps: params.fps, quality: 85 };
    let stream = mjpeg_stream(camera, &state.arbiter, camera_id, options, config);
    let body = axum::body::Body::from_stream(stream);

    Response::builder()
        .header(axum::http::header::CONTENT_TYPE, "multipart/x-mixed-replace; boundary=frame")
        .body(body)
        .unwrap()
}

#[derive(Debug, Deserialize)]
pub struct ControlParams {
    control: String,
    value: i32,
}

const CONTROL_WHITELIST: &[&str] = &["Gain", "Exposure"];

pub async fn set_control(
    Path(camera_id): Path<String>,
    Query(params): Query<ControlParams>,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, Response> {
    if !CONTROL_WHITELIST.contains(&params.control.as_str()) {
        return Err((
            axum::http::StatusCode::BAD_REQUEST,
            Json(json!({ "error": "unknown_control", "message": format!("unknown control: {}", params.control) })),
        )
            .into_response());
    }

    let camera = state.registry.get(&camera_id).map_err(|e| ApiError(e).into_response())?;
    camera
        .set_control(&params.control, params.value)
        .map_err(|e| ApiError(e).into_response())?;
    let value_current = camera.get_control(&params.control).map_err(|e| ApiError(e).into_response())?;

    Ok(Json(json!({
        "camera_id": camera_id,
        "control": params.control,
        "value_set": params.value,
        "value_current": value_current,
        "auto": false,
    })))
}

#[derive(Debug, Deserialize)]
pub struct CaptureParams {
    #[serde(default = "default_frame_type")]
    frame_type: FrameType,
}

fn default_frame_type() -> FrameType {
    FrameType::Light
}

pub async fn capture_still(
    Path(camera_id): Path<String>,
    Query(params): Query<CaptureParams>,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, Response> {
    let camera = state.registry.get(&camera_id).map_err(|e| ApiError(e).into_response())?;

    if !camera.is_streaming() {
        return Err((
            axum::http::StatusCode::BAD_REQUEST,
            Json(json!({ "error": "bad_state", "message": "no active stream buffered for this camera" })),
        )
            .into_response());
    }

    let frame = camera.latest_raw_frame().ok_or_else(|| {
        (
            axum::http::StatusCode::BAD_REQUEST,
            Json(json!({ "error": "bad_state", "message": "no active stream buffered for this camera" })),
        )
            .into_response()
    })?;

    let mut meta = std::collections::HashMap::new();
    meta.insert("camera_id".to_string(), json!(camera_id));
    meta.insert("exposure_us".to_string(), json!(frame.exposure_us));
    meta.insert("gain".to_string(), json!(frame.gain));
    if let Ok(position) = state.sensor.read(1).await {
        meta.insert("altitude_deg".to_string(), json!(position.altitude_deg));
        meta.insert("azimuth_deg".to_string(), json!(position.azimuth_deg));
    }

    let data: Vec<u8> = frame.data.iter().flat_map(|v| v.to_le_bytes()).collect();
    let frame_index = state
        .sessions
        .current()
        .add_frame(&camera_id, params.frame_type, data, "uint16", frame.width, frame.height, meta)
        .map_err(|e| ApiError(e).into_response())?;

    Ok(Json(json!({ "frame_index": frame_index })))
}
