use chrono::{DateTime, Local};
use netwatch_core::{MonitorError, Result, RunContext};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Root configuration structure parsed from `netwatch.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sampling parameters.
    pub monitor: MonitorConfig,
    /// Where and how results are written.
    pub output: OutputConfig,
    /// Network identity lookup.
    pub network: NetworkConfig,
}

/// Sampling parameters.  Fixed for the lifetime of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Host or address to probe every cycle.
    pub target: String,
    /// Length of the sliding window in seconds.
    pub window_secs: u64,
    /// Time between samples in milliseconds.
    pub period_ms: u64,
    /// How long a single probe may wait for a reply, in milliseconds.
    pub probe_timeout_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            target:           "8.8.8.8".to_string(),
            window_secs:      30,
            period_ms:        1_000,
            probe_timeout_ms: 500,
        }
    }
}

impl MonitorConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Validate the settings and freeze them into a [`RunContext`].
    pub fn context(&self, start: DateTime<Local>) -> Result<RunContext> {
        if self.probe_timeout_ms == 0 {
            return Err(MonitorError::Config(
                "probe_timeout_ms must be positive".into(),
            ));
        }
        RunContext::new(start, self.window(), self.period(), self.target.clone())
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the `.csv` data file and the `.log` file.
    pub data_dir: PathBuf,
    /// Mirror every log line to stdout.
    pub echo: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            echo:     true,
        }
    }
}

/// Network identity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Wireless interface queried for the current SSID (macOS only).
    pub interface: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            interface: "en0".to_string(),
        }
    }
}
