use chrono::{DateTime, Local, TimeDelta, Utc};
use std::time::Duration;

/// Fixed-rate deadlines for the sample loop.
///
/// The deadline moves forward by exactly one period per cycle no matter how
/// long the cycle took, so probe latency shortens the next sleep instead of
/// pushing every later sample back.
#[derive(Debug, Clone)]
pub struct Schedule {
    next:   DateTime<Local>,
    period: TimeDelta,
}

impl Schedule {
    /// First sample is due one period after `start`.
    pub fn new(start: DateTime<Local>, period: TimeDelta) -> Self {
        Self {
            next: step(start, period),
            period,
        }
    }

    /// How long to sleep before the upcoming sample, given the time `now`.
    ///
    /// Zero if the deadline has already passed.  Moves the deadline on by one
    /// period for the following call.
    pub fn advance(&mut self, now: DateTime<Local>) -> Duration {
        let wait = (self.next - now).to_std().unwrap_or(Duration::ZERO);
        self.next = step(self.next, self.period);
        wait
    }
}

/// `at + period`, pinned to the last representable instant on overflow.
fn step(at: DateTime<Local>, period: TimeDelta) -> DateTime<Local> {
    at.checked_add_signed(period)
        .unwrap_or_else(|| DateTime::<Utc>::MAX_UTC.with_timezone(&Local))
}
