pub mod schema;

pub use schema::{Config, MonitorConfig, NetworkConfig, OutputConfig};

use netwatch_core::{MonitorError, Result};
use std::path::{Path, PathBuf};

/// Read `netwatch.toml` from `path`.  A missing file is not an error: the
/// monitor runs with the built-in sampling defaults (8.8.8.8, 30 s window,
/// 1 s period).
pub fn load(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "no netwatch config at '{}'; sampling with built-in defaults \
             (pass a config path as the first argument to override)",
            path.display()
        );
        return Ok(Config::default());
    }

    let raw = std::fs::read_to_string(path).map_err(|e| {
        MonitorError::Config(format!("cannot read netwatch config '{}': {e}", path.display()))
    })?;

    toml::from_str(&raw).map_err(|e| {
        MonitorError::Config(format!("invalid netwatch config '{}': {e}", path.display()))
    })
}

/// Return the default config path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("netwatch").join("netwatch.toml")
}
