use crate::error::{MonitorError, Result};
use chrono::{DateTime, Local};
use std::collections::VecDeque;

/// One probe outcome.  Immutable once taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Wall-clock time at which the probe was started.
    pub timestamp: DateTime<Local>,
    /// `true` if the target answered within the probe timeout.
    pub success: bool,
}

impl Sample {
    pub fn new(timestamp: DateTime<Local>, success: bool) -> Self {
        Self { timestamp, success }
    }
}

/// Sliding window of recent samples, oldest first.
///
/// Samples are only ever appended at the back and evicted from the front, so
/// the window stays sorted by timestamp.  The success count is maintained
/// alongside the samples so every query is O(1).
#[derive(Debug, Clone, Default)]
pub struct Window {
    samples:   VecDeque<Sample>,
    successes: usize,
}

impl Window {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample at the back of the window.
    ///
    /// Rejects a sample older than the newest one already held: the clock is
    /// required to be monotonic and accepting it would unsort the window.
    pub fn push(&mut self, sample: Sample) -> Result<()> {
        if let Some(newest) = self.samples.back() {
            if sample.timestamp < newest.timestamp {
                return Err(MonitorError::Invariant(format!(
                    "sample at {} precedes newest sample at {}",
                    sample.timestamp, newest.timestamp
                )));
            }
        }

        if sample.success {
            self.successes += 1;
        }
        self.samples.push_back(sample);
        Ok(())
    }

    /// Drop every leading sample with `timestamp < cutoff`.
    ///
    /// Stops at the first sample at or after `cutoff`.  Returns how many
    /// samples were evicted.
    pub fn trim(&mut self, cutoff: DateTime<Local>) -> usize {
        let mut evicted = 0;
        while let Some(front) = self.samples.front() {
            if front.timestamp >= cutoff {
                break;
            }
            if let Some(old) = self.samples.pop_front() {
                if old.success {
                    self.successes -= 1;
                }
                evicted += 1;
            }
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.successes
    }

    pub fn newest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn oldest(&self) -> Option<&Sample> {
        self.samples.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
}
