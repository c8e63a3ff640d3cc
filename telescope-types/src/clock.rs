use std::time::{Duration, Instant};

/// Injectable source of monotonic time and sleep.
///
/// Production code uses [`SystemClock`]; tests substitute a fake clock so
/// timing-dependent behavior (rate limiting, recovery backoff, motor move
/// duration) is deterministic.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, dur: Duration) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, dur: Duration) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> {
        Box::pin(tokio::time::sleep(dur))
    }
}
