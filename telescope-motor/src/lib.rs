use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use telescope_driver::motor::{MotorDriverModule, MotorInstance};
use telescope_types::{Axis, Error, LimitSide, MotorConfig, MotorStatus, Result};

struct AxisState {
    moving: bool,
    speed: u8,
    stalled: bool,
    target_steps: Option<i64>,
}

impl Default for AxisState {
    fn default() -> Self {
        AxisState { moving: false, speed: 0, stalled: false, target_steps: None }
    }
}

/// Owns the motor driver instance and all position/motion state. Position
/// mutations happen under `inner`; the per-axis stop flag lives outside the
/// mutex so `stop()` always preempts a blocking move regardless of who
/// currently holds the lock.
pub struct MotorController {
    driver: Arc<Mutex<Box<dyn MotorInstance>>>,
    state: Arc<Mutex<HashMap<Axis, AxisState>>>,
    stop_flags: HashMap<Axis, Arc<AtomicBool>>,
}

fn axes() -> [Axis; 2] {
    [Axis::Altitude, Axis::Azimuth]
}

impl MotorController {
    /// Opens `mount_id` on `driver` and takes ownership of the resulting
    /// instance, mirroring the discover/open factory split used by cameras.
    pub fn new(driver: &dyn MotorDriverModule, mount_id: &str) -> Result<Self> {
        let instance = driver.open(mount_id).map_err(|e| Error::driver(mount_id, e))?;

        let mut state = HashMap::new();
        let mut stop_flags = HashMap::new();
        for axis in axes() {
            state.insert(axis, AxisState::default());
            stop_flags.insert(axis, Arc::new(AtomicBool::new(false)));
        }
        Ok(MotorController {
            driver: Arc::new(Mutex::new(instance)),
            state: Arc::new(Mutex::new(state)),
            stop_flags,
        })
    }

    fn axis_config_clone(&self, axis: Axis) -> telescope_types::AxisConfig {
        let driver = self.driver.lock();
        match axis {
            Axis::Altitude => driver.config().altitude.clone(),
            Axis::Azimuth => driver.config().azimuth.clone(),
        }
    }

    pub fn config(&self) -> MotorConfig {
        self.driver.lock().config().clone()
    }

    /// Blocking absolute move. Must be called from a blocking context
    /// (`tokio::task::spawn_blocking`) since it may sleep for the
    /// simulated/physical move duration.
    pub fn move_to(&self, axis: Axis, target_steps: i64, speed: u8) -> Result<()> {
        if !(1..=100).contains(&speed) {
            return Err(Error::range("speed", format!("{speed} not in [1,100]")));
        }
        let axis_cfg = self.axis_config_clone(axis);
        if target_steps < axis_cfg.min_steps || target_steps > axis_cfg.max_steps {
            return Err(Error::range(
                axis.as_str(),
                format!("target {target_steps} outside [{}, {}]", axis_cfg.min_steps, axis_cfg.max_steps),
            ));
        }

        let stop_flag = self.stop_flags[&axis].clone();
        stop_flag.store(false, Ordering::SeqCst);

        {
            let mut state = self.state.lock();
            let entry = state.entry(axis).or_default();
            entry.moving = true;
            entry.speed = speed;
            entry.target_steps = Some(target_steps);
        }

        let result = {
            let mut driver = self.driver.lock();
            driver.move_axis(axis, target_steps, speed, &|| stop_flag.load(Ordering::SeqCst))
        };

        {
            let mut state = self.state.lock();
            let entry = state.entry(axis).or_default();
            entry.moving = false;
            entry.target_steps = None;
        }

        result.map_err(|e| Error::driver(axis.as_str(), e))?;
        Ok(())
    }

    pub fn move_relative(&self, axis: Axis, delta_steps: i64, speed: u8) -> Result<()> {
        let current = self.driver.lock().position_steps(axis);
        self.move_to(axis, current + delta_steps, speed)
    }

    /// Preempts any in-flight move on `axis` (or all axes if `None`).
    /// Safe to call from any context; never blocks on driver I/O.
    pub fn stop(&self, axis: Option<Axis>) {
        match axis {
            Some(a) => self.stop_flags[&a].store(true, Ordering::SeqCst),
            None => {
                for a in axes() {
                    self.stop_flags[&a].store(true, Ordering::SeqCst);
                }
            }
        }
        let mut state = self.state.lock();
        for a in axis.map(|a| vec![a]).unwrap_or_else(|| axes().to_vec()) {
            state.entry(a).or_default().moving = false;
        }
    }

    pub fn home(&self, axis: Axis) -> Result<()> {
        let home_steps = self.axis_config_clone(axis).home_steps;
        self.move_to(axis, home_steps, 50)
    }

    pub fn home_all(&self) -> Result<()> {
        self.home(Axis::Altitude)?;
        self.home(Axis::Azimuth)
    }

    pub fn move_until_stall(&self, axis: Axis, direction: i8, speed: u8, step_size: i64) -> Result<i64> {
        if direction == 0 {
            return Err(Error::range("direction", "must be nonzero"));
        }
        let stop_flag = self.stop_flags[&axis].clone();
        stop_flag.store(false, Ordering::SeqCst);

        {
            let mut state = self.state.lock();
            state.entry(axis).or_default().moving = true;
        }

        let result = {
            let mut driver = self.driver.lock();
            driver.move_until_stall(axis, direction, speed, step_size, &|| stop_flag.load(Ordering::SeqCst))
        };

        let final_pos = result.map_err(|e| Error::driver(axis.as_str(), e))?;

        let axis_cfg = self.axis_config_clone(axis);
        let at_limit = final_pos <= axis_cfg.min_steps || final_pos >= axis_cfg.max_steps;

        let mut state = self.state.lock();
        let entry = state.entry(axis).or_default();
        entry.moving = false;
        entry.stalled = at_limit;

        Ok(final_pos)
    }

    pub fn zero_position(&self, axis: Axis) {
        self.driver.lock().set_position_steps(axis, 0);
        let mut state = self.state.lock();
        state.entry(axis).or_default().stalled = false;
    }

    pub fn set_position(&self, axis: Axis, steps: i64) -> Result<()> {
        let axis_cfg = self.axis_config_clone(axis);
        if steps < axis_cfg.min_steps || steps > axis_cfg.max_steps {
            return Err(Error::range(axis.as_str(), format!("{steps} outside configured limits")));
        }
        self.driver.lock().set_position_steps(axis, steps);
        Ok(())
    }

    pub fn get_status(&self, axis: Axis) -> MotorStatus {
        let driver = self.driver.lock();
        let position_steps = driver.position_steps(axis);
        let at_limit = driver.at_limit(axis);
        drop(driver);

        let state = self.state.lock();
        let entry = state.get(&axis);
        MotorStatus {
            motor: axis,
            is_moving: entry.map(|e| e.moving).unwrap_or(false),
            position_steps,
            speed: entry.map(|e| e.speed).unwrap_or(0),
            target_steps: entry.and_then(|e| e.target_steps),
            stalled: entry.map(|e| e.stalled).unwrap_or(false),
            at_limit,
        }
    }

    pub fn is_at_limit(&self, axis: Axis) -> Option<LimitSide> {
        self.driver.lock().at_limit(axis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use telescope_driver::motor::{TwinMotorDriver, TWIN_MOUNT_ID};
    use telescope_types::AxisConfig;

    fn test_config() -> MotorConfig {
        MotorConfig {
            altitude: AxisConfig {
                min_steps: -93_333,
                max_steps: 4_667,
                home_steps: 0,
                steps_per_degree: 1000.0,
                max_speed_steps_per_s: 5_000.0,
                accel_time_s: 0.2,
            },
            azimuth: AxisConfig {
                min_steps: 0,
                max_steps: 360_000,
                home_steps: 0,
                steps_per_degree: 1000.0,
                max_speed_steps_per_s: 8_000.0,
                accel_time_s: 0.2,
            },
            simulate_timing: false,
        }
    }

    #[test]
    fn move_rejects_out_of_range_target() {
        let controller = MotorController::new(&TwinMotorDriver::new(test_config()), TWIN_MOUNT_ID).unwrap();
        let before = controller.get_status(Axis::Altitude).position_steps;
        let err = controller.move_to(Axis::Altitude, 10_000, 50).unwrap_err();
        assert_eq!(err.kind(), telescope_types::ErrorKind::RangeError);
        assert_eq!(controller.get_status(Axis::Altitude).position_steps, before);
    }

    #[test]
    fn move_until_stall_reaches_limit_and_sets_stalled() {
        let controller = MotorController::new(&TwinMotorDriver::new(test_config()), TWIN_MOUNT_ID).unwrap();
        let final_pos = controller.move_until_stall(Axis::Azimuth, 1, 20, 50_000).unwrap();
        assert_eq!(final_pos, 360_000);
        assert!(controller.get_status(Axis::Azimuth).stalled);
    }

    #[test]
    fn zero_position_clears_stall_flag() {
        let controller = MotorController::new(&TwinMotorDriver::new(test_config()), TWIN_MOUNT_ID).unwrap();
        controller.move_until_stall(Axis::Azimuth, 1, 20, 50_000).unwrap();
        controller.zero_position(Axis::Azimuth);
        let status = controller.get_status(Axis::Azimuth);
        assert!(!status.stalled);
        assert_eq!(status.position_steps, 0);
    }
}
