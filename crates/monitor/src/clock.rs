use chrono::{DateTime, Local, TimeDelta};
use std::future::Future;
use std::time::{Duration, Instant};

/// Source of timestamps and the one place the sampler suspends.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

/// Wall-clock readings that never go backwards.
///
/// The local time is read once at construction; every later reading adds the
/// monotonic time elapsed since then, so NTP steps or manual clock changes
/// cannot reorder samples.
#[derive(Debug, Clone)]
pub struct SystemClock {
    wall: DateTime<Local>,
    mono: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            wall: Local::now(),
            mono: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        self.wall + TimeDelta::from_std(self.mono.elapsed()).unwrap_or_default()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        tokio::time::sleep(duration)
    }
}
