use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// USB bandwidth-overload value a camera should be set to depending on
/// whether it is the only active stream or shares the bus with another.
pub const BANDWIDTH_SINGLE: i32 = 80;
pub const BANDWIDTH_DUAL: i32 = 40;

/// Tracks how many streams are active across the whole process so each
/// stream can pick a bandwidth-overload value at start time. Shared by all
/// streams via a single process-wide instance.
#[derive(Default)]
pub struct StreamArbiter {
    active: AtomicUsize,
}

impl StreamArbiter {
    pub fn new() -> Arc<Self> {
        Arc::new(StreamArbiter { active: AtomicUsize::new(0) })
    }

    /// Registers a new active stream and reports the bandwidth-overload
    /// value it should apply. The returned guard decrements the count when
    /// the stream ends.
    pub fn start(self: &Arc<Self>) -> (i32, ArbiterGuard) {
        let previously_active = self.active.fetch_add(1, Ordering::SeqCst);
        let bandwidth = if previously_active > 0 { BANDWIDTH_DUAL } else { BANDWIDTH_SINGLE };
        (bandwidth, ArbiterGuard { arbiter: self.clone() })
    }
}

pub struct ArbiterGuard {
    arbiter: Arc<StreamArbiter>,
}

impl Drop for ArbiterGuard {
    fn drop(&mut self) {
        self.arbiter.active.fetch_sub(1, Ordering::SeqCst);
    }
}
