//! Vessel-to-device wiring.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vt_core::VesselId;

use crate::error::{HwError, HwResult};

/// Which probe and which expander channels belong to each vessel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceMap {
    /// DS18B20 one-wire addresses.
    pub one_wire: BTreeMap<VesselId, String>,
    /// PCA9685 channels driving the heating/cooling ESCs.
    pub esc_channels: BTreeMap<VesselId, u8>,
    /// PCA9685 channels driving the enclosure fans.
    pub fan_channels: BTreeMap<VesselId, u8>,
}

impl Default for DeviceMap {
    fn default() -> Self {
        let one_wire = [
            (0, "28-0114536b03aa"),
            (1, "28-80000026f3d8"),
            (2, "28-0114534081aa"),
        ]
        .into_iter()
        .map(|(id, addr)| (VesselId::new(id), addr.to_string()))
        .collect();
        let esc_channels = [(0, 0), (1, 1), (2, 2)]
            .into_iter()
            .map(|(id, ch)| (VesselId::new(id), ch))
            .collect();
        let fan_channels = [(0, 8), (1, 9), (2, 10)]
            .into_iter()
            .map(|(id, ch)| (VesselId::new(id), ch))
            .collect();
        Self {
            one_wire,
            esc_channels,
            fan_channels,
        }
    }
}

impl DeviceMap {
    pub fn probe_address(&self, id: VesselId) -> HwResult<&str> {
        self.one_wire
            .get(&id)
            .map(String::as_str)
            .ok_or(HwError::UnknownVessel {
                id,
                what: "one-wire probe",
            })
    }

    pub fn esc_channel(&self, id: VesselId) -> HwResult<u8> {
        self.esc_channels
            .get(&id)
            .copied()
            .ok_or(HwError::UnknownVessel {
                id,
                what: "ESC channel",
            })
    }

    pub fn fan_channel(&self, id: VesselId) -> HwResult<u8> {
        self.fan_channels
            .get(&id)
            .copied()
            .ok_or(HwError::UnknownVessel {
                id,
                what: "fan channel",
            })
    }
}
