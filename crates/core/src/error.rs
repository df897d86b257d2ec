use thiserror::Error;

/// Top-level error type shared by every netwatch crate.
///
/// A failed probe is never an error: it is a sample with `success = false`.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("config error: {0}")]
    Config(String),

    #[error("sink error: {0}")]
    Sink(String),

    /// A broken internal invariant (empty window, timestamps going backwards).
    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T, E = MonitorError> = std::result::Result<T, E>;
