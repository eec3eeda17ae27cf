//! Per-tick telemetry.

use serde::{Deserialize, Serialize};
use vt_core::Command;

/// What one applied tick observed and commanded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlSample {
    pub temperature: f64,
    pub control_value: Command,
    pub p_term: f64,
    pub i_term: f64,
    pub d_term: f64,
}

/// Exported channels, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelemetryChannel {
    Temperature,
    ControlValue,
    Kp,
    Ki,
    Kd,
}

impl TelemetryChannel {
    pub const ALL: [TelemetryChannel; 5] = [
        TelemetryChannel::Temperature,
        TelemetryChannel::ControlValue,
        TelemetryChannel::Kp,
        TelemetryChannel::Ki,
        TelemetryChannel::Kd,
    ];

    /// Name used in exported file names.
    pub fn name(self) -> &'static str {
        match self {
            TelemetryChannel::Temperature => "temperature",
            TelemetryChannel::ControlValue => "control_value",
            TelemetryChannel::Kp => "kp",
            TelemetryChannel::Ki => "ki",
            TelemetryChannel::Kd => "kd",
        }
    }

    pub fn value(self, sample: &ControlSample) -> f64 {
        match self {
            TelemetryChannel::Temperature => sample.temperature,
            TelemetryChannel::ControlValue => f64::from(sample.control_value),
            TelemetryChannel::Kp => sample.p_term,
            TelemetryChannel::Ki => sample.i_term,
            TelemetryChannel::Kd => sample.d_term,
        }
    }
}

/// Append-only sample record.
///
/// Samples are stored whole, so every channel view has the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TelemetryLog {
    samples: Vec<ControlSample>,
}

impl TelemetryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: ControlSample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[ControlSample] {
        &self.samples
    }

    pub fn last(&self) -> Option<&ControlSample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Values of one channel in tick order.
    pub fn channel(&self, channel: TelemetryChannel) -> Vec<f64> {
        self.samples.iter().map(|s| channel.value(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: f64, u: Command) -> ControlSample {
        ControlSample {
            temperature: t,
            control_value: u,
            p_term: 1.0,
            i_term: 2.0,
            d_term: 3.0,
        }
    }

    #[test]
    fn channels_follow_samples() {
        let mut log = TelemetryLog::new();
        log.push(sample(25.0, 100));
        log.push(sample(30.0, -7));
        assert_eq!(log.channel(TelemetryChannel::Temperature), vec![25.0, 30.0]);
        assert_eq!(log.channel(TelemetryChannel::ControlValue), vec![100.0, -7.0]);
        for ch in TelemetryChannel::ALL {
            assert_eq!(log.channel(ch).len(), log.len());
        }
    }

    #[test]
    fn serializes_as_list() {
        let mut log = TelemetryLog::new();
        log.push(sample(25.0, 1));
        let json = serde_json::to_string(&log).unwrap();
        assert!(json.starts_with('['));
        let back: TelemetryLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, log);
    }

    #[test]
    fn channel_names() {
        let names: Vec<_> = TelemetryChannel::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names, ["temperature", "control_value", "kp", "ki", "kd"]);
    }
}
