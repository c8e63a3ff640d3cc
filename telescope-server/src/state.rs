use std::sync::Arc;

use telescope_camera::{CameraController, Registry};
use telescope_config::AppConfig;
use telescope_motor::MotorController;
use telescope_sensor::Sensor;
use telescope_session::SessionManager;
use telescope_streaming::StreamArbiter;

use crate::coords::{CoordinateConverter, StandardConverter};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub controller: Arc<CameraController>,
    pub motor: Arc<MotorController>,
    pub sensor: Arc<Sensor>,
    pub sessions: Arc<SessionManager>,
    pub arbiter: Arc<StreamArbiter>,
    pub config: Arc<AppConfig>,
    pub converter: Arc<dyn CoordinateConverter>,
}

impl AppState {
    pub fn new(
        registry: Registry,
        motor: MotorController,
        sensor: Sensor,
        sessions: SessionManager,
        config: AppConfig,
    ) -> Self {
        let registry = Arc::new(registry);
        AppState {
            controller: Arc::new(CameraController::new(registry.clone())),
            registry,
            motor: Arc::new(motor),
            sensor: Arc::new(sensor),
            sessions: Arc::new(sessions),
            arbiter: StreamArbiter::new(),
            config: Arc::new(config),
            converter: Arc::new(StandardConverter),
        }
    }
}
