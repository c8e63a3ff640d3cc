use std::time::Duration;

use telescope_types::{Axis, AxisConfig, LimitSide, MotorConfig};

use super::{MotorDescriptor, MotorDriverModule, MotorInfo, MotorInstance};

pub const TWIN_MOUNT_ID: &str = "twin-mount";

/// Computes the time a trapezoidal velocity profile move of `distance` steps
/// takes at the given speed percentage, given the axis's configured max
/// speed and acceleration ramp time.
///
/// accel_distance = v * t_a / 2. If the move is too short to reach cruise
/// speed the profile is triangular (2*sqrt(d/v)); otherwise it is the full
/// trapezoid (2*t_a + (d - 2*accel_distance)/v).
pub fn simulate_move_time(axis: &AxisConfig, distance_steps: i64, speed_pct: u8) -> Duration {
    let distance = distance_steps.unsigned_abs() as f64;
    if distance == 0.0 {
        return Duration::from_secs(0);
    }
    let v = axis.max_speed_steps_per_s * (speed_pct.clamp(1, 100) as f64 / 100.0);
    let t_a = axis.accel_time_s;
    let accel_distance = v * t_a / 2.0;

    let seconds = if distance < 2.0 * accel_distance {
        2.0 * (distance / v).sqrt()
    } else {
        let cruise_distance = distance - 2.0 * accel_distance;
        2.0 * t_a + cruise_distance / v
    };
    Duration::from_secs_f64(seconds.max(0.0))
}

/// Deterministic stand-in for a vendor mount controller backend. Opens into
/// a single always-available instance, since this system drives one mount.
pub struct TwinMotorDriver {
    config: MotorConfig,
}

impl TwinMotorDriver {
    pub fn new(config: MotorConfig) -> Self {
        TwinMotorDriver { config }
    }
}

impl MotorDriverModule for TwinMotorDriver {
    fn discover(&self) -> anyhow::Result<Vec<MotorDescriptor>> {
        Ok(vec![MotorDescriptor {
            id: TWIN_MOUNT_ID.into(),
            device_type: "digital_twin".into(),
            name: "Digital Twin Mount".into(),
        }])
    }

    fn open(&self, id: &str) -> anyhow::Result<Box<dyn MotorInstance>> {
        if id != TWIN_MOUNT_ID {
            anyhow::bail!("no such mount: {id}");
        }
        Ok(Box::new(TwinMotorInstance::new(self.config.clone())))
    }
}

struct TwinMotorInstance {
    config: MotorConfig,
    altitude_steps: i64,
    azimuth_steps: i64,
}

impl TwinMotorInstance {
    fn new(config: MotorConfig) -> Self {
        let altitude_steps = config.altitude.home_steps;
        let azimuth_steps = config.azimuth.home_steps;
        TwinMotorInstance { config, altitude_steps, azimuth_steps }
    }

    fn axis_config(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::Altitude => &self.config.altitude,
            Axis::Azimuth => &self.config.azimuth,
        }
    }

    fn position_mut(&mut self, axis: Axis) -> &mut i64 {
        match axis {
            Axis::Altitude => &mut self.altitude_steps,
            Axis::Azimuth => &mut self.azimuth_steps,
        }
    }
}

impl MotorInstance for TwinMotorInstance {
    fn get_info(&self) -> MotorInfo {
        MotorInfo { id: TWIN_MOUNT_ID.into(), name: "Digital Twin Mount".into(), config: self.config.clone() }
    }

    fn config(&self) -> &MotorConfig {
        &self.config
    }

    fn position_steps(&self, axis: Axis) -> i64 {
        match axis {
            Axis::Altitude => self.altitude_steps,
            Axis::Azimuth => self.azimuth_steps,
        }
    }

    fn set_position_steps(&mut self, axis: Axis, steps: i64) {
        *self.position_mut(axis) = steps;
    }

    fn move_axis(
        &mut self,
        axis: Axis,
        target_steps: i64,
        speed: u8,
        should_stop: &dyn Fn() -> bool,
    ) -> anyhow::Result<i64> {
        let axis_cfg = self.axis_config(axis).clone();
        let start = self.position_steps(axis);
        let distance = target_steps - start;
        let duration = simulate_move_time(&axis_cfg, distance, speed);

        if axis_cfg_simulate(&self.config) && !duration.is_zero() {
            // poll in small slices so `should_stop` can preempt promptly
            const SLICE: Duration = Duration::from_millis(20);
            let mut elapsed = Duration::from_secs(0);
            while elapsed < duration {
                if should_stop() {
                    return Ok(self.position_steps(axis));
                }
                let remaining = duration - elapsed;
                std::thread::sleep(remaining.min(SLICE));
                elapsed += SLICE;
            }
        }

        if should_stop() {
            return Ok(self.position_steps(axis));
        }

        *self.position_mut(axis) = target_steps;
        Ok(target_steps)
    }

    fn move_until_stall(
        &mut self,
        axis: Axis,
        direction: i8,
        speed: u8,
        step_size: i64,
        should_stop: &dyn Fn() -> bool,
    ) -> anyhow::Result<i64> {
        anyhow::ensure!(direction != 0, "direction must be nonzero");
        let sign = direction.signum() as i64;
        loop {
            if should_stop() {
                return Ok(self.position_steps(axis));
            }
            let current = self.position_steps(axis);
            let axis_cfg = self.axis_config(axis).clone();
            let next = current + sign * step_size;
            if next <= axis_cfg.min_steps {
                self.move_axis(axis, axis_cfg.min_steps, speed, should_stop)?;
                return Ok(axis_cfg.min_steps);
            }
            if next >= axis_cfg.max_steps {
                self.move_axis(axis, axis_cfg.max_steps, speed, should_stop)?;
                return Ok(axis_cfg.max_steps);
            }
            self.move_axis(axis, next, speed, should_stop)?;
        }
    }

    fn at_limit(&self, axis: Axis) -> Option<LimitSide> {
        let axis_cfg = self.axis_config(axis);
        let pos = self.position_steps(axis);
        if pos <= axis_cfg.min_steps {
            Some(LimitSide::Min)
        } else if pos >= axis_cfg.max_steps {
            Some(LimitSide::Max)
        } else {
            None
        }
    }

    fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

fn axis_cfg_simulate(config: &MotorConfig) -> bool {
    config.simulate_timing
}
