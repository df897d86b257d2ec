//! Sampling loop for `netwatch`.
//!
//! Wires together the collaborators of a run:
//! - configuration (validated into a `RunContext` before anything starts)
//! - network-identity lookup (names the output files)
//! - the ping probe and the monotonic system clock
//! - the data/log recorder
//! - Ctrl-C, honoured between cycles only

pub mod clock;
pub mod monitor;
pub mod schedule;

pub use clock::{Clock, SystemClock};
pub use monitor::{Monitor, Phase};
pub use schedule::Schedule;

use netwatch_config::{default_path, load as load_config};
use netwatch_core::Result;
use netwatch_recorder::Recorder;
use netwatch_system::{current_network_name, PingProbe};
use std::path::PathBuf;
use tracing::{error, info};

/// Run the monitor until Ctrl-C or a fatal sink error.
///
/// `config_path` overrides the default `$XDG_CONFIG_HOME/netwatch/netwatch.toml`.
pub async fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.unwrap_or_else(default_path))?;

    let clock = SystemClock::new();
    let ctx = config.monitor.context(clock.now())?;

    let network = current_network_name(&config.network.interface).await;
    info!(
        "Probing {} every {}ms over a {}s window on network '{network}'",
        ctx.target,
        ctx.period.num_milliseconds(),
        ctx.window.num_seconds()
    );

    let mut recorder = Recorder::open(
        &config.output.data_dir,
        &network,
        ctx.start,
        config.output.echo,
    )?;

    let probe = PingProbe::new(config.monitor.probe_timeout());
    let mut monitor = Monitor::new(ctx, clock, probe);
    monitor.run(&mut recorder, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
