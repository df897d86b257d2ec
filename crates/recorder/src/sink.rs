use crate::report::format_timestamp;
use chrono::{DateTime, Local};
use netwatch_core::{MonitorError, Result, Sample};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Column names written once at the top of every data file.
pub const DATA_HEADER: [&str; 2] = ["tov", "result"];

/// Append-only destination for raw samples, one record per sample.
pub trait DataSink {
    fn append(&mut self, sample: &Sample) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Append-only destination for human-readable status lines.
pub trait LogSink {
    fn write_line(&mut self, line: &str) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

fn create(path: &Path) -> Result<File> {
    File::create(path)
        .map_err(|e| MonitorError::Sink(format!("cannot create '{}': {e}", path.display())))
}

/// Encode a sample as a data-file row (without the trailing newline).
pub fn data_row(sample: &Sample) -> String {
    let result = if sample.success { "True" } else { "False" };
    format!("{},{result}", format_timestamp(sample.timestamp))
}

/// CSV data file: `tov,result` header followed by one row per sample.
///
/// Each row goes out in a single write so a crash can at worst lose the row
/// being written, never interleave two.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    file: File,
}

impl CsvSink {
    /// Create (or truncate) `path` and write the header row.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = create(&path)?;
        file.write_all(format!("{}\n", DATA_HEADER.join(",")).as_bytes())?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSink for CsvSink {
    fn append(&mut self, sample: &Sample) -> Result<()> {
        let row = format!("{}\n", data_row(sample));
        self.file.write_all(row.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }
}

/// Log sink that appends every line to a file and optionally echoes it to
/// stdout.
#[derive(Debug)]
pub struct TeeLogger {
    path: PathBuf,
    file: File,
    echo: bool,
}

impl TeeLogger {
    /// Create (or truncate) `path` and stamp it with the start time.
    pub fn create(path: impl AsRef<Path>, started: DateTime<Local>, echo: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = create(&path)?;
        file.write_all(format!("starting log: {}\n", format_timestamp(started)).as_bytes())?;
        drop(file);

        let file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|e| MonitorError::Sink(format!("cannot reopen '{}': {e}", path.display())))?;
        Ok(Self { path, file, echo })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for TeeLogger {
    fn write_line(&mut self, line: &str) -> Result<()> {
        if self.echo {
            let mut out = std::io::stdout().lock();
            writeln!(out, "{line}")?;
        }
        self.file.write_all(format!("{line}\n").as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        std::io::stdout().flush()?;
        self.file.sync_data()?;
        Ok(())
    }
}
