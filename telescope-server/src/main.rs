mod cameras;
mod coords;
mod error;
mod motor;
mod position;
mod state;
mod tools;

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde_json::json;
use telescope_camera::Registry;
use telescope_driver::camera::{TwinCameraConfig, TwinCameraDriver};
use telescope_driver::motor::{TwinMotorDriver, TWIN_MOUNT_ID};
use telescope_driver::sensor::{TwinSensorDriver, TWIN_SENSOR_ID};
use telescope_motor::MotorController;
use telescope_sensor::Sensor;
use telescope_session::SessionManager;
use tracing::warn;

use state::AppState;

const SDK_LIBRARY_PATH_ENV: &str = "TELESCOPE_SDK_LIBRARY_PATH";

fn build_registry(config: &telescope_config::AppConfig) -> Registry {
    if std::env::var_os(SDK_LIBRARY_PATH_ENV).is_none() {
        warn!(
            env = SDK_LIBRARY_PATH_ENV,
            "camera SDK library path not set; camera-dependent endpoints will use the digital twin"
        );
    }

    let mut registry = Registry::new();
    for (key, camera_config) in &config.cameras {
        let twin_config = TwinCameraConfig {
            id: camera_config.camera_id.clone(),
            name: camera_config.name.clone().unwrap_or_else(|| key.clone()),
            width: 1280,
            height: 960,
            is_color: false,
        };
        let driver = Arc::new(TwinCameraDriver::new(twin_config));
        let camera = Arc::new(telescope_camera::Camera::new(driver, camera_config.clone()).with_renderer(Arc::new(
            telescope_camera::DefaultOverlayRenderer,
        )));
        registry.insert(key.clone(), camera);
    }
    registry
}

async fn dashboard() -> axum::response::Html<&'static str> {
    axum::response::Html("<html><body><h1>telescope control</h1></body></html>")
}

async fn list_tools() -> Json<serde_json::Value> {
    let descriptors: Vec<_> = tools::descriptors()
        .into_iter()
        .map(|d| json!({ "name": d.name, "description": d.description, "input_schema": d.input_schema }))
        .collect();
    Json(json!({ "tools": descriptors }))
}

async fn call_tool(
    Path(name): Path<String>,
    State(state): State<AppState>,
    Json(input): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    Json(tools::dispatch(&name, input, &state).await)
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/api/cameras", get(cameras::list_cameras))
        .route("/stream/:camera_id", get(cameras::stream_camera))
        .route("/api/camera/:id/control", post(cameras::set_control))
        .route("/api/camera/:id/capture", post(cameras::capture_still))
        .route("/api/motor/:axis", post(motor::move_axis))
        .route("/api/motor/:axis/nudge", post(motor::nudge))
        .route("/api/motor/:axis/start", post(motor::start))
        .route("/api/motor/stop", post(motor::stop))
        .route("/api/motor/home/set", post(motor::home_set))
        .route("/api/position", get(position::get_position))
        .route("/api/tools", get(list_tools))
        .route("/api/tools/:name", post(call_tool))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _logging_guard = telescope_logging::init();

    let cli = telescope_config::Cli::parse();
    let config = telescope_config::load(&cli)?;

    let registry = build_registry(&config);

    let motor_driver = TwinMotorDriver::new(config.motor.clone());
    let motor = MotorController::new(&motor_driver, TWIN_MOUNT_ID)?;

    let sensor = Sensor::new(Arc::new(TwinSensorDriver::new()), TWIN_SENSOR_ID);
    sensor.connect().await.ok();

    let sessions = SessionManager::new(config.data_dir.clone());

    let http_addr = config.http_addr.clone();
    let state = AppState::new(registry, motor, sensor, sessions, config);

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!(addr = %http_addr, "telescope-server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
