use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::state::AppState;

pub async fn get_position(State(state): State<AppState>) -> Json<serde_json::Value> {
    if !state.sensor.is_connected() {
        return Json(json!({ "sensor_status": "no_sensor" }));
    }

    match state.sensor.read(1).await {
        Ok(reading) => {
            let ra_dec = state.converter.alt_az_to_ra_dec(
                reading.altitude_deg,
                reading.azimuth_deg,
                &state.config.observer,
                Utc::now(),
            );
            Json(json!({
                "sensor_status": "ok",
                "altitude_deg": reading.altitude_deg,
                "azimuth_deg": reading.azimuth_deg,
                "ra_deg": ra_dec.ra_deg,
                "dec_deg": ra_dec.dec_deg,
            }))
        }
        Err(e) => Json(json!({ "sensor_status": "error", "message": e.to_string() })),
    }
}
