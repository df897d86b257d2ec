use crate::error::{MonitorError, Result};
use chrono::{DateTime, Local, TimeDelta, Utc};
use std::time::Duration;

/// Per-run parameters, fixed at start and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// When the run began; uptime is measured from here.
    pub start:  DateTime<Local>,
    /// How far back the sliding window reaches from the newest sample.
    pub window: TimeDelta,
    /// Interval between successive probes.
    pub period: TimeDelta,
    /// Host handed to the probe every cycle.
    pub target: String,
}

impl RunContext {
    /// Build a context, rejecting combinations the sampler cannot honour.
    ///
    /// The window must be strictly longer than the sample period.
    pub fn new(
        start: DateTime<Local>,
        window: Duration,
        period: Duration,
        target: impl Into<String>,
    ) -> Result<Self> {
        let target = target.into();
        if target.trim().is_empty() {
            return Err(MonitorError::Config("probe target must not be empty".into()));
        }
        if period.is_zero() {
            return Err(MonitorError::Config("sample period must be positive".into()));
        }
        if window <= period {
            return Err(MonitorError::Config(format!(
                "window ({window:?}) must be longer than the sample period ({period:?})"
            )));
        }

        let window = TimeDelta::from_std(window)
            .map_err(|e| MonitorError::Config(format!("window out of range: {e}")))?;
        let period = TimeDelta::from_std(period)
            .map_err(|e| MonitorError::Config(format!("sample period out of range: {e}")))?;
        if start.checked_sub_signed(window).is_none() {
            return Err(MonitorError::Config(format!(
                "window of {}s reaches past the earliest representable time",
                window.num_seconds()
            )));
        }
        if start.checked_add_signed(period).is_none() {
            return Err(MonitorError::Config(format!(
                "sample period of {}ms reaches past the latest representable time",
                period.num_milliseconds()
            )));
        }

        Ok(Self { start, window, period, target })
    }

    /// Oldest timestamp allowed to stay in the window once `newest` is in it.
    ///
    /// Saturates at the earliest representable time, which keeps every sample.
    pub fn cutoff(&self, newest: DateTime<Local>) -> DateTime<Local> {
        newest
            .checked_sub_signed(self.window)
            .unwrap_or_else(|| DateTime::<Utc>::MIN_UTC.with_timezone(&Local))
    }
}
