use chrono::{DateTime, Local, TimeDelta};
use netwatch_core::{bucket_label, Histogram, Snapshot, BUCKETS};

/// Timestamp encoding shared by the data file and the log.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// First line of every status block.
pub const SEPARATOR: &str = "<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<";

pub fn format_timestamp(t: DateTime<Local>) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

/// Render a duration as `[N day(s), ]H:MM:SS[.ffffff]`.
pub fn format_uptime(uptime: TimeDelta) -> String {
    let uptime = uptime.max(TimeDelta::zero());
    let total_secs = uptime.num_seconds();
    let micros = uptime.subsec_nanos() / 1_000;

    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let mins = (total_secs % 3_600) / 60;
    let secs = total_secs % 60;

    let mut out = match days {
        0 => String::new(),
        1 => "1 day, ".to_string(),
        n => format!("{n} days, "),
    };
    out.push_str(&format!("{hours}:{mins:02}:{secs:02}"));
    if micros > 0 {
        out.push_str(&format!(".{micros:06}"));
    }
    out
}

/// Lay out the per-cycle status block, one entry per log line.
pub fn status_block(snapshot: &Snapshot, histogram: &Histogram, network: &str) -> Vec<String> {
    let mut lines = vec![
        SEPARATOR.to_string(),
        format!("Current time: {}", format_timestamp(snapshot.taken_at)),
        format!("Network: {network}"),
        "Connectivity data:".to_string(),
        format!("        Avg Success: {:?}", snapshot.avg_success),
        format!("              Count: {}", snapshot.window_count),
        format!("        Min Success: {:?}", snapshot.min_success),
        format!("        Total count: {}", snapshot.total_samples),
        format!("             Uptime: {}", format_uptime(snapshot.uptime)),
        "         Percentiles:".to_string(),
    ];

    lines.extend((0..BUCKETS).map(|i| {
        format!(
            "                     {}: {:3}% ({})",
            bucket_label(i),
            histogram.percent(i),
            histogram.count(i)
        )
    }));
    lines
}
