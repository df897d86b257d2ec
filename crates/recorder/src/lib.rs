//! Output side of the monitor: the raw data file, the human-readable log, and
//! the formatting that turns statistics into status blocks.

pub mod report;
pub mod sink;

pub use report::{format_timestamp, format_uptime, status_block};
pub use sink::{data_row, CsvSink, DataSink, LogSink, TeeLogger, DATA_HEADER};

use chrono::{DateTime, Local};
use netwatch_core::{Histogram, Result, Sample, Snapshot};
use std::path::{Path, PathBuf};
use tracing::info;

/// Data and log file locations for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub data: PathBuf,
    pub log:  PathBuf,
}

impl OutputPaths {
    /// `{dir}/{network}_{YYYY-MM-DD_HH:MM:SS}.csv` and the matching `.log`.
    pub fn new(dir: impl AsRef<Path>, network: &str, start: DateTime<Local>) -> Self {
        let base = format!("{network}_{}", start.format("%Y-%m-%d_%H:%M:%S"));
        let dir = dir.as_ref();
        Self {
            data: dir.join(format!("{base}.csv")),
            log:  dir.join(format!("{base}.log")),
        }
    }
}

/// Both sinks of a run plus the network name stamped into every status block.
#[derive(Debug)]
pub struct Recorder<D, L> {
    data:    D,
    log:     L,
    network: String,
}

impl Recorder<CsvSink, TeeLogger> {
    /// Create the output directory if needed and open both files.
    pub fn open(
        dir: impl AsRef<Path>,
        network: &str,
        start: DateTime<Local>,
        echo: bool,
    ) -> Result<Self> {
        std::fs::create_dir_all(dir.as_ref())?;
        let paths = OutputPaths::new(dir, network, start);

        let data = CsvSink::create(&paths.data)?;
        let log = TeeLogger::create(&paths.log, start, echo)?;
        info!("Writing samples to {}", data.path().display());
        info!("Writing log to {}", log.path().display());

        Ok(Self::new(data, log, network))
    }
}

impl<D: DataSink, L: LogSink> Recorder<D, L> {
    pub fn new(data: D, log: L, network: impl Into<String>) -> Self {
        Self {
            data,
            log,
            network: network.into(),
        }
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn record_sample(&mut self, sample: &Sample) -> Result<()> {
        self.data.append(sample)
    }

    pub fn record_status(&mut self, snapshot: &Snapshot, histogram: &Histogram) -> Result<()> {
        for line in status_block(snapshot, histogram, &self.network) {
            self.log.write_line(&line)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.data.flush()?;
        self.log.flush()
    }

    pub fn into_parts(self) -> (D, L) {
        (self.data, self.log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_share_base_name() {
        let start = DateTime::parse_from_rfc3339("2024-03-05T07:08:09Z")
            .unwrap()
            .with_timezone(&Local);
        let paths = OutputPaths::new("data", "Home_Net", start);
        let stem = format!("Home_Net_{}", start.format("%Y-%m-%d_%H:%M:%S"));
        assert_eq!(paths.data, Path::new("data").join(format!("{stem}.csv")));
        assert_eq!(paths.log, Path::new("data").join(format!("{stem}.log")));
    }

    #[test]
    fn open_creates_directory_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("data");
        let start = Local::now();

        let recorder = Recorder::open(&out, "Unknown", start, false).unwrap();
        assert_eq!(recorder.network(), "Unknown");

        let paths = OutputPaths::new(&out, "Unknown", start);
        assert!(paths.data.exists());
        assert!(paths.log.exists());
    }
}
