use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Extra time granted to the `ping` child on top of its own wait limit
/// before it is killed.
const SPAWN_GRACE: Duration = Duration::from_millis(500);

/// A single reachability check against a host.
///
/// Implementations bound their own running time and report every kind of
/// failure (timeout, resolution error, unreachable host) as `false`.
pub trait Probe {
    fn probe(&mut self, host: &str) -> impl Future<Output = bool>;
}

/// Probe backed by the system `ping` binary: one echo request per call.
#[derive(Debug, Clone)]
pub struct PingProbe {
    timeout: Duration,
}

impl PingProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Probe for PingProbe {
    async fn probe(&mut self, host: &str) -> bool {
        let os = std::env::consts::OS;
        let mut cmd = Command::new("ping");
        cmd.args(ping_args(os, self.timeout, host))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let limit = wait_limit(os, self.timeout) + SPAWN_GRACE;
        match tokio::time::timeout(limit, cmd.status()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                warn!("cannot run ping: {e}");
                false
            }
            Err(_) => {
                debug!("ping {host} outlived its timeout; killed");
                false
            }
        }
    }
}

/// The wait `ping` is actually told to honour on `os`.
///
/// At least one millisecond; Linux `ping` only takes whole seconds, so the
/// timeout is rounded up there.
pub fn wait_limit(os: &str, timeout: Duration) -> Duration {
    let timeout = timeout.max(Duration::from_millis(1));
    match os {
        "windows" | "macos" | "ios" | "freebsd" => {
            Duration::from_millis(timeout.as_millis().try_into().unwrap_or(u64::MAX))
        }
        _ => Duration::from_secs(timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0)),
    }
}

/// Build the `ping` argument list for `os` (as in `std::env::consts::OS`).
///
/// Each platform spells "one request" and "wait limit" differently, and the
/// wait unit is milliseconds on macOS/Windows but whole seconds on Linux.
pub fn ping_args(os: &str, timeout: Duration, host: &str) -> Vec<String> {
    let wait = wait_limit(os, timeout);
    let (count_flag, wait_flag, wait) = match os {
        "windows" => ("-n", "-w", wait.as_millis().to_string()),
        "macos" | "ios" | "freebsd" => ("-c", "-W", wait.as_millis().to_string()),
        _ => ("-c", "-W", wait.as_secs().to_string()),
    };

    vec![
        count_flag.to_string(),
        "1".to_string(),
        wait_flag.to_string(),
        wait,
        host.to_string(),
    ]
}
