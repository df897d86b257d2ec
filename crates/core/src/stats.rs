use crate::{
    context::RunContext,
    error::{MonitorError, Result},
    sample::Window,
};
use chrono::{DateTime, Local, TimeDelta};

/// Number of availability buckets: "none", ten deciles, "all".
pub const BUCKETS: usize = 12;

/// Map a window's success count onto a bucket index in `0..BUCKETS`.
///
/// `0` means no successes and `11` means every sample succeeded.  Anything in
/// between lands in `floor(10 * successes / count) + 1`, so a rate of exactly
/// 0.5 goes to bucket 6.  `count` must be non-zero.
pub fn classify(successes: usize, count: usize) -> usize {
    if successes == 0 {
        return 0;
    }
    if successes >= count {
        return BUCKETS - 1;
    }
    // floor(10 * rate) in integers, kept within 1..=10.
    (successes * 10 / count).min(9) + 1
}

/// Human-readable range for a bucket, right-aligned to a fixed width.
pub fn bucket_label(index: usize) -> String {
    match index {
        0 => "        0%".to_string(),
        i if i >= BUCKETS - 1 => "      100%".to_string(),
        i => format!("{:2}% - {:3}%", (i - 1) * 10, i * 10),
    }
}

/// How many cycles ended with the window in each bucket.  Never reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Histogram {
    counts: [u64; BUCKETS],
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, index: usize) {
        self.counts[index.min(BUCKETS - 1)] += 1;
    }

    pub fn count(&self, index: usize) -> u64 {
        self.counts.get(index).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &[u64; BUCKETS] {
        &self.counts
    }

    /// Sum over all buckets; equals the number of recorded cycles.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Share of cycles in `index` as a whole percentage, truncated.
    pub fn percent(&self, index: usize) -> u64 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        self.count(index) * 100 / total
    }
}

/// Read-only view of the statistics after one cycle, handed to the log sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Timestamp of the newest sample in the window.
    pub taken_at:      DateTime<Local>,
    /// Fraction of successful samples in the window, in `[0, 1]`.
    pub avg_success:   f64,
    /// Lowest `avg_success` seen so far in the run.
    pub min_success:   f64,
    /// Bucket this cycle was classified into.
    pub bucket:        usize,
    /// Samples currently in the window.
    pub window_count:  usize,
    /// Samples taken since the run started.
    pub total_samples: u64,
    /// Time from run start to `taken_at`.
    pub uptime:        TimeDelta,
}

/// Cumulative statistics over the whole run.
#[derive(Debug, Clone)]
pub struct StatsEngine {
    min_success:   f64,
    histogram:     Histogram,
    total_samples: u64,
}

impl Default for StatsEngine {
    fn default() -> Self {
        Self {
            min_success:   1.0,
            histogram:     Histogram::new(),
            total_samples: 0,
        }
    }
}

impl StatsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the current (already trimmed) window into the running statistics.
    ///
    /// Called exactly once per cycle.  An empty window means the caller broke
    /// the sampling invariant and is reported as [`MonitorError::Invariant`].
    pub fn observe(&mut self, window: &Window, ctx: &RunContext) -> Result<Snapshot> {
        let Some(newest) = window.newest() else {
            return Err(MonitorError::Invariant(
                "statistics requested over an empty window".into(),
            ));
        };

        let count = window.len();
        let successes = window.success_count();
        let avg_success = successes as f64 / count as f64;

        self.min_success = self.min_success.min(avg_success);
        self.total_samples += 1;

        let bucket = classify(successes, count);
        self.histogram.record(bucket);

        Ok(Snapshot {
            taken_at: newest.timestamp,
            avg_success,
            min_success: self.min_success,
            bucket,
            window_count: count,
            total_samples: self.total_samples,
            uptime: newest.timestamp - ctx.start,
        })
    }

    pub fn min_success(&self) -> f64 {
        self.min_success
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }
}
