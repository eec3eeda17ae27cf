//! Plant configuration file format and validation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vt_controls::PidConfig;
use vt_core::VesselId;
use vt_hw::DeviceMap;
use vt_sim::PlantParams;

use crate::error::ReactorResult;

pub const CONFIG_VERSION: u32 = 1;

/// Shortest tick period accepted.
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("No vessels configured")]
    NoVessels,

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

impl ValidationError {
    fn invalid(field: impl Into<String>, value: impl ToString, reason: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Whether the vessels' devices share one lock per physical bus.
///
/// `false` puts every device in single-owner mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub shared_one_wire: bool,
    pub shared_i2c: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            shared_one_wire: true,
            shared_i2c: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselConfig {
    pub id: VesselId,
    #[serde(default = "default_target_temperature")]
    pub target_temperature_c: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_wire_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub esc_channel: Option<u8>,
}

fn default_target_temperature() -> f64 {
    25.0
}

fn default_enabled() -> bool {
    true
}

impl VesselConfig {
    pub fn new(id: VesselId) -> Self {
        Self {
            id,
            target_temperature_c: default_target_temperature(),
            enabled: default_enabled(),
            one_wire_address: None,
            esc_channel: None,
        }
    }
}

/// Settings for the simulated plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub plant: PlantParams,
    /// Time each simulated bus transaction holds the bus.
    pub bus_latency_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            plant: PlantParams::default(),
            bus_latency_ms: 2,
        }
    }
}

impl SimConfig {
    pub fn bus_latency(&self) -> Duration {
        Duration::from_millis(self.bus_latency_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    pub version: u32,
    /// Seconds between ticks of each vessel.
    pub tick_period_s: f64,
    /// Directory receiving telemetry exports.
    pub log_dir: PathBuf,
    pub pid: PidConfig,
    pub buses: BusConfig,
    pub devices: DeviceMap,
    pub vessels: Vec<VesselConfig>,
    pub simulation: SimConfig,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            tick_period_s: 1.0,
            log_dir: PathBuf::from("log"),
            pid: PidConfig::default(),
            buses: BusConfig::default(),
            devices: DeviceMap::default(),
            vessels: vec![VesselConfig::new(VesselId::new(0))],
            simulation: SimConfig::default(),
        }
    }
}

impl PlantConfig {
    /// Tick period as a `Duration`, never shorter than [`MIN_TICK_PERIOD`].
    pub fn tick_period(&self) -> Duration {
        Duration::try_from_secs_f64(self.tick_period_s)
            .unwrap_or(MIN_TICK_PERIOD)
            .max(MIN_TICK_PERIOD)
    }

    /// Device map with per-vessel overrides applied.
    pub fn device_map(&self) -> DeviceMap {
        let mut map = self.devices.clone();
        for vessel in &self.vessels {
            if let Some(addr) = &vessel.one_wire_address {
                map.one_wire.insert(vessel.id, addr.clone());
            }
            if let Some(ch) = vessel.esc_channel {
                map.esc_channels.insert(vessel.id, ch);
            }
        }
        map
    }
}

pub fn validate_config(config: &PlantConfig) -> Result<(), ValidationError> {
    if config.version > CONFIG_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: config.version,
        });
    }
    match Duration::try_from_secs_f64(config.tick_period_s) {
        Ok(period) if period >= MIN_TICK_PERIOD => {}
        _ => {
            return Err(ValidationError::invalid(
                "tick_period_s",
                config.tick_period_s,
                "must be at least 1 ms and fit a duration",
            ));
        }
    }
    if let Err(e) = config.pid.validate() {
        return Err(ValidationError::invalid("pid", format!("{:?}", config.pid.gains), e.to_string()));
    }
    if let Err(e) = config.simulation.plant.validate() {
        return Err(ValidationError::invalid("simulation.plant", "", e.to_string()));
    }

    if config.vessels.is_empty() {
        return Err(ValidationError::NoVessels);
    }
    let mut ids = HashSet::new();
    for vessel in &config.vessels {
        if !ids.insert(vessel.id) {
            return Err(ValidationError::DuplicateId {
                id: vessel.id.to_string(),
                context: "vessels".to_string(),
            });
        }
        if !vessel.target_temperature_c.is_finite() {
            return Err(ValidationError::invalid(
                format!("vessels[{}].target_temperature_c", vessel.id.index()),
                vessel.target_temperature_c,
                "must be finite",
            ));
        }
    }
    Ok(())
}

pub fn load_yaml(path: &Path) -> ReactorResult<PlantConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: PlantConfig = serde_yaml::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn save_yaml(path: &Path, config: &PlantConfig) -> ReactorResult<()> {
    validate_config(config)?;
    let content = serde_yaml::to_string(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ReactorResult<PlantConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: PlantConfig = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        validate_config(&PlantConfig::default()).unwrap();
    }

    #[test]
    fn minimal_yaml_fills_defaults() {
        let yaml = "vessels:\n  - id: 1\n    target_temperature_c: 39.0\n  - id: 2\n    enabled: false\n";
        let config: PlantConfig = serde_yaml::from_str(yaml).unwrap();
        validate_config(&config).unwrap();
        assert_eq!(config.tick_period_s, 1.0);
        assert_eq!(config.pid.gains.kp, 80.0);
        assert_eq!(config.vessels[0].target_temperature_c, 39.0);
        assert!(config.vessels[0].enabled);
        assert_eq!(config.vessels[1].target_temperature_c, 25.0);
        assert!(!config.vessels[1].enabled);
        assert!(config.buses.shared_i2c);
    }

    #[test]
    fn rejects_duplicate_vessels() {
        let mut config = PlantConfig::default();
        config.vessels.push(VesselConfig::new(VesselId::new(0)));
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn rejects_empty_and_bad_values() {
        let mut config = PlantConfig::default();
        config.vessels.clear();
        assert!(matches!(validate_config(&config), Err(ValidationError::NoVessels)));

        let mut config = PlantConfig::default();
        config.tick_period_s = 0.0;
        assert!(validate_config(&config).is_err());

        let mut config = PlantConfig::default();
        config.vessels[0].target_temperature_c = f64::NAN;
        assert!(validate_config(&config).is_err());

        let mut config = PlantConfig::default();
        config.tick_period_s = f64::INFINITY;
        assert!(validate_config(&config).is_err());

        let mut config = PlantConfig::default();
        config.pid.output_limits.min = 200.0;
        assert!(validate_config(&config).is_err());

        let mut config = PlantConfig::default();
        config.version = CONFIG_VERSION + 1;
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn tick_period_must_fit_a_duration() {
        for bad in [1e-12, 1e-4, 1e20, -1.0, f64::NAN] {
            let mut config = PlantConfig::default();
            config.tick_period_s = bad;
            assert!(
                matches!(
                    validate_config(&config),
                    Err(ValidationError::InvalidValue { .. })
                ),
                "tick_period_s = {bad} accepted"
            );
            assert!(config.tick_period() >= MIN_TICK_PERIOD);
        }

        let mut config = PlantConfig::default();
        config.tick_period_s = 0.001;
        validate_config(&config).unwrap();
        assert_eq!(config.tick_period(), MIN_TICK_PERIOD);
    }

    #[test]
    fn overrides_apply_to_device_map() {
        let mut config = PlantConfig::default();
        config.vessels[0].one_wire_address = Some("28-deadbeef".into());
        config.vessels[0].esc_channel = Some(5);
        let map = config.device_map();
        assert_eq!(map.probe_address(VesselId::new(0)).unwrap(), "28-deadbeef");
        assert_eq!(map.esc_channel(VesselId::new(0)).unwrap(), 5);
        assert_eq!(map.esc_channel(VesselId::new(1)).unwrap(), 1);
    }
}
