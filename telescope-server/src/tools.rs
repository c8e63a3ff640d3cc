use serde_json::{json, Value};

use crate::state::AppState;

/// One entry in the tool registration list: name, human description, and a
/// JSON Schema describing the accepted input fields.
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "list_cameras",
            description: "Enumerate configured cameras and their connection state",
            input_schema: json!({ "type": "object", "properties": {} }),
        },
        ToolDescriptor {
            name: "capture_image",
            description: "Capture a still frame from the named camera",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "camera_id": { "type": "string" },
                    "exposure_us": { "type": "integer" },
                    "gain": { "type": "integer" }
                },
                "required": ["camera_id"]
            }),
        },
        ToolDescriptor {
            name: "move_motor",
            description: "Move an axis to an absolute step position",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "axis": { "type": "string", "enum": ["altitude", "azimuth"] },
                    "steps": { "type": "integer" },
                    "speed": { "type": "integer" }
                },
                "required": ["axis", "steps", "speed"]
            }),
        },
        ToolDescriptor {
            name: "get_position",
            description: "Read current altitude/azimuth and derived RA/Dec",
            input_schema: json!({ "type": "object", "properties": {} }),
        },
    ]
}

/// Dispatches a tool call by name. Unknown names return the documented
/// `{error: "unknown_tool", ...}` payload rather than a transport error.
pub async fn dispatch(name: &str, input: Value, state: &AppState) -> Value {
    match name {
        "list_cameras" => {
            let mut cameras = Vec::new();
            for key in state.registry.keys() {
                if let Ok(camera) = state.registry.get(&key) {
                    cameras.push(json!({
                        "camera_id": key,
                        "connected": camera.is_connected(),
                        "streaming": camera.is_streaming(),
                    }));
                }
            }
            json!({ "cameras": cameras })
        }
        "capture_image" => {
            let camera_id = match input.get("camera_id").and_then(Value::as_str) {
                Some(id) => id.to_string(),
                None => return json!({ "error": "invalid_input", "message": "camera_id is required" }),
            };
            let camera = match state.registry.get(&camera_id) {
                Ok(c) => c,
                Err(e) => return json!({ "error": e.kind().to_string(), "message": e.to_string() }),
            };
            let exposure_us = input.get("exposure_us").and_then(Value::as_u64);
            let gain = input.get("gain").and_then(Value::as_i64).map(|v| v as i32);
            match camera.capture_raw(exposure_us, gain) {
                Ok(result) => json!({
                    "timestamp_utc": result.timestamp_utc,
                    "exposure_us": result.exposure_us,
                    "gain": result.gain,
                    "bytes": result.image_bytes.len(),
                }),
                Err(e) => json!({ "error": e.kind().to_string(), "message": e.to_string() }),
            }
        }
        "move_motor" => {
            let axis = match input.get("axis").and_then(Value::as_str) {
                Some("altitude") => telescope_types::Axis::Altitude,
                Some("azimuth") => telescope_types::Axis::Azimuth,
                _ => return json!({ "error": "invalid_input", "message": "axis must be altitude or azimuth" }),
            };
            let steps = input.get("steps").and_then(Value::as_i64).unwrap_or(0);
            let speed = input.get("speed").and_then(Value::as_u64).unwrap_or(50) as u8;
            let motor = state.motor.clone();
            let result = tokio::task::spawn_blocking(move || motor.move_to(axis, steps, speed)).await;
            match result {
                Ok(Ok(())) => json!({ "motor": axis.as_str(), "position_steps": steps }),
                Ok(Err(e)) => json!({ "error": e.kind().to_string(), "message": e.to_string() }),
                Err(e) => json!({ "error": "internal", "message": e.to_string() }),
            }
        }
        "get_position" => {
            if !state.sensor.is_connected() {
                return json!({ "sensor_status": "no_sensor" });
            }
            match state.sensor.read(1).await {
                Ok(reading) => {
                    let ra_dec = state.converter.alt_az_to_ra_dec(
                        reading.altitude_deg,
                        reading.azimuth_deg,
                        &state.config.observer,
                        chrono::Utc::now(),
                    );
                    json!({
                        "sensor_status": "ok",
                        "altitude_deg": reading.altitude_deg,
                        "azimuth_deg": reading.azimuth_deg,
                        "ra_deg": ra_dec.ra_deg,
                        "dec_deg": ra_dec.dec_deg,
                    })
                }
                Err(e) => json!({ "sensor_status": "error", "message": e.to_string() }),
            }
        }
        _ => json!({ "error": "unknown_tool", "message": format!("no such tool: {name}") }),
    }
}
