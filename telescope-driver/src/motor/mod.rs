mod twin;

pub use twin::{TwinMotorDriver, TWIN_MOUNT_ID};

use telescope_types::{Axis, LimitSide, MotorConfig};

/// A single discoverable mount controller reported by
/// [`MotorDriverModule::discover`].
#[derive(Debug, Clone)]
pub struct MotorDescriptor {
    pub id: String,
    pub device_type: String,
    pub name: String,
}

/// Static identification for an open mount instance.
#[derive(Debug, Clone)]
pub struct MotorInfo {
    pub id: String,
    pub name: String,
    pub config: MotorConfig,
}

/// Driver-level contract for a single open two-axis mount. `move_axis` and
/// `move_until_stall` are expected to block for the physically (or
/// simulated) realistic duration of the motion and to observe `stop_flag`
/// so callers can interrupt them.
///
/// Mirrors `CameraInstance`: a thin, synchronous surface opened by a
/// [`MotorDriverModule`] and called from worker threads.
pub trait MotorInstance: Send {
    fn get_info(&self) -> MotorInfo;
    fn config(&self) -> &MotorConfig;
    fn position_steps(&self, axis: Axis) -> i64;
    fn set_position_steps(&mut self, axis: Axis, steps: i64);

    /// Blocks until the move completes or `should_stop` returns true.
    /// Returns the final position reached.
    fn move_axis(
        &mut self,
        axis: Axis,
        target_steps: i64,
        speed: u8,
        should_stop: &dyn Fn() -> bool,
    ) -> anyhow::Result<i64>;

    /// Repeatedly steps in `direction` until a soft limit is hit (hardware
    /// equivalent: a stall/missed-step signal). Returns final position.
    fn move_until_stall(
        &mut self,
        axis: Axis,
        direction: i8,
        speed: u8,
        step_size: i64,
        should_stop: &dyn Fn() -> bool,
    ) -> anyhow::Result<i64>;

    fn at_limit(&self, axis: Axis) -> Option<LimitSide>;
    fn close(&mut self) -> anyhow::Result<()>;
}

/// Factory/enumeration contract for a mount backend (one per vendor
/// controller, or the digital twin).
pub trait MotorDriverModule: Send + Sync {
    fn discover(&self) -> anyhow::Result<Vec<MotorDescriptor>>;
    fn open(&self, id: &str) -> anyhow::Result<Box<dyn MotorInstance>>;
}
