//! Telemetry export.
//!
//! Each channel goes to its own file named
//! `{timestamp}_{vessel}_{channel}.csv`, one value per line in tick order.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use tracing::info;
use vt_core::VesselId;

use crate::error::ReactorResult;
use crate::telemetry::{TelemetryChannel, TelemetryLog};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Format an export timestamp. Hyphens keep the name portable.
pub fn export_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn now_timestamp() -> String {
    export_timestamp(&Local::now())
}

/// Write all five channels of `log` into `dir`, creating it if needed.
///
/// Returns the written paths in channel order.
pub fn export_channels(
    log: &TelemetryLog,
    dir: &Path,
    vessel: VesselId,
    timestamp: &str,
) -> ReactorResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(TelemetryChannel::ALL.len());
    for channel in TelemetryChannel::ALL {
        let path = dir.join(format!("{timestamp}_{vessel}_{}.csv", channel.name()));
        let mut content = String::new();
        for value in log.channel(channel) {
            let _ = writeln!(content, "{value}");
        }
        fs::write(&path, content)?;
        written.push(path);
    }
    info!(%vessel, samples = log.len(), dir = %dir.display(), "telemetry exported");
    Ok(written)
}

/// Write every sample as one JSON object per line.
pub fn export_jsonl(
    log: &TelemetryLog,
    dir: &Path,
    vessel: VesselId,
    timestamp: &str,
) -> ReactorResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{timestamp}_{vessel}.jsonl"));
    let mut content = String::new();
    for sample in log.samples() {
        content.push_str(&serde_json::to_string(sample)?);
        content.push('\n');
    }
    fs::write(&path, content)?;
    Ok(path)
}
