use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Name reported when the current network cannot be determined.
pub const UNKNOWN_NETWORK: &str = "Unknown";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);
const AIRPORT_PREFIX: &str = "Current Wi-Fi Network: ";

/// Best-effort name of the network this host is attached to (the Wi-Fi SSID
/// where the platform exposes one), made safe for use in a file name.
///
/// `interface` is only consulted on macOS; `iwgetid` picks the first
/// wireless interface on its own.
///
/// Never fails and never blocks longer than a couple of seconds.
pub async fn current_network_name(interface: &str) -> String {
    let ssid = match std::env::consts::OS {
        "macos" => run(["networksetup", "-getairportnetwork", interface])
            .await
            .and_then(|out| parse_airport_output(&out)),
        "linux" => run(["iwgetid", "-r"])
            .await
            .and_then(|out| parse_iwgetid_output(&out)),
        _ => None,
    };

    ssid.map(|s| sanitize(&s))
        .unwrap_or_else(|| UNKNOWN_NETWORK.to_string())
}

async fn run<const N: usize>(argv: [&str; N]) -> Option<String> {
    let (program, args) = argv.split_first()?;
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    match tokio::time::timeout(LOOKUP_TIMEOUT, cmd.output()).await {
        Ok(Ok(out)) if out.status.success() => Some(String::from_utf8_lossy(&out.stdout).into_owned()),
        Ok(Ok(out)) => {
            debug!("{program} exited with {}", out.status);
            None
        }
        Ok(Err(e)) => {
            debug!("cannot run {program}: {e}");
            None
        }
        Err(_) => {
            debug!("{program} timed out");
            None
        }
    }
}

/// Extract the SSID from `networksetup -getairportnetwork` output.
fn parse_airport_output(out: &str) -> Option<String> {
    let ssid = out.strip_prefix(AIRPORT_PREFIX)?.trim();
    (!ssid.is_empty()).then(|| ssid.to_string())
}

/// `iwgetid -r` prints the bare SSID, or nothing when not associated.
fn parse_iwgetid_output(out: &str) -> Option<String> {
    let ssid = out.trim();
    (!ssid.is_empty()).then(|| ssid.to_string())
}

fn sanitize(ssid: &str) -> String {
    ssid.replace([' ', '/', '\\'], "_")
}
