pub mod context;
pub mod error;
pub mod sample;
pub mod stats;

pub use context::RunContext;
pub use error::{MonitorError, Result};
pub use sample::{Sample, Window};
pub use stats::{bucket_label, classify, Histogram, Snapshot, StatsEngine, BUCKETS};
