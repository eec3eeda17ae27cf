//! DS18B20 temperature probes on the Linux one-wire bus.
//!
//! The kernel `w1-gpio`/`w1-therm` drivers expose each probe as
//! `<devices_root>/<address>/w1_slave`. Reading that file triggers a
//! conversion and returns two lines:
//!
//! ```text
//! 72 01 4b 46 7f ff 0e 10 57 : crc=57 YES
//! 72 01 4b 46 7f ff 0e 10 57 t=23125
//! ```
//!
//! The second line carries the temperature in millidegrees Celsius.

use std::path::{Path, PathBuf};

use vt_core::VesselId;

use crate::bus::BusArbiter;
use crate::error::{HwError, HwResult};
use crate::ports::SensorPort;

/// Default sysfs location of one-wire devices.
pub const DEFAULT_DEVICES_ROOT: &str = "/sys/bus/w1/devices";

/// One-wire bus as exposed by sysfs.
#[derive(Debug, Clone)]
pub struct W1Bus {
    devices_root: PathBuf,
}

impl W1Bus {
    pub fn new(devices_root: impl Into<PathBuf>) -> Self {
        Self {
            devices_root: devices_root.into(),
        }
    }

    pub fn devices_root(&self) -> &Path {
        &self.devices_root
    }

    pub fn slave_path(&self, address: &str) -> PathBuf {
        self.devices_root.join(address).join("w1_slave")
    }

    /// Raw `w1_slave` contents of one probe.
    pub fn read_slave(&self, address: &str) -> HwResult<String> {
        std::fs::read_to_string(self.slave_path(address)).map_err(|e| HwError::io(address, e))
    }
}

impl Default for W1Bus {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICES_ROOT)
    }
}

/// Extract the temperature in °C from `w1_slave` contents.
pub fn parse_w1_slave(device: &str, raw: &str) -> HwResult<f64> {
    let mut lines = raw.lines();
    let crc_line = lines.next().ok_or_else(|| parse_error(device, "empty reading"))?;
    if !crc_line.trim_end().ends_with("YES") {
        return Err(parse_error(device, "CRC check failed"));
    }
    let data_line = lines
        .next()
        .ok_or_else(|| parse_error(device, "missing data line"))?;
    let position = data_line
        .find("t=")
        .ok_or_else(|| parse_error(device, "missing t= field"))?;
    let millidegrees: i64 = data_line[position + 2..]
        .trim()
        .parse()
        .map_err(|_| parse_error(device, "t= field is not an integer"))?;
    Ok(millidegrees as f64 / 1000.0)
}

fn parse_error(device: &str, what: &'static str) -> HwError {
    HwError::Parse {
        device: device.to_string(),
        what,
    }
}

/// Water temperature probe of one vessel.
#[derive(Debug)]
pub struct WaterTemperatureSensor {
    id: VesselId,
    address: String,
    bus: BusArbiter<W1Bus>,
}

impl WaterTemperatureSensor {
    pub fn new(id: VesselId, address: impl Into<String>, bus: BusArbiter<W1Bus>) -> Self {
        Self {
            id,
            address: address.into(),
            bus,
        }
    }

    pub fn id(&self) -> VesselId {
        self.id
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl SensorPort for WaterTemperatureSensor {
    fn read_temperature(&mut self) -> HwResult<f64> {
        let raw = self.bus.transaction(|bus| bus.read_slave(&self.address))?;
        parse_w1_slave(&self.address, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "72 01 4b 46 7f ff 0e 10 57 : crc=57 YES\n\
                        72 01 4b 46 7f ff 0e 10 57 t=23125\n";

    #[test]
    fn parses_millidegrees() {
        assert!((parse_w1_slave("p", GOOD).unwrap() - 23.125).abs() < 1e-12);
    }

    #[test]
    fn parses_negative_temperatures() {
        let raw = "ff ff : crc=aa YES\nff ff t=-1250\n";
        assert!((parse_w1_slave("p", raw).unwrap() + 1.25).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_crc() {
        let raw = "72 01 : crc=57 NO\n72 01 t=23125\n";
        let err = parse_w1_slave("28-x", raw).unwrap_err();
        assert!(matches!(err, HwError::Parse { what: "CRC check failed", .. }));
    }

    #[test]
    fn rejects_missing_field() {
        assert!(parse_w1_slave("p", "").is_err());
        assert!(parse_w1_slave("p", "crc=57 YES\n").is_err());
        assert!(parse_w1_slave("p", "crc=57 YES\n72 01 4b\n").is_err());
        assert!(parse_w1_slave("p", "crc=57 YES\n72 01 t=abc\n").is_err());
    }

    #[test]
    fn slave_path_layout() {
        let bus = W1Bus::new("/tmp/w1");
        assert_eq!(
            bus.slave_path("28-0114536b03aa"),
            PathBuf::from("/tmp/w1/28-0114536b03aa/w1_slave")
        );
        assert_eq!(W1Bus::default().devices_root(), Path::new(DEFAULT_DEVICES_ROOT));
    }
}
