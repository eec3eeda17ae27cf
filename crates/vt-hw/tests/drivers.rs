//! Driver tests against a recording I2C bus and a temporary sysfs tree.

use std::sync::{Arc, Mutex};

use embedded_hal::i2c::{ErrorType, I2c, Operation};
use vt_core::VesselId;
use vt_hw::pca9685::DEFAULT_ADDRESS;
use vt_hw::{
    ActuatorPort, BusArbiter, BusLock, DeviceMap, EscActuator, HwError, Pca9685, PcFan,
    SensorPort, W1Bus, WaterTemperatureSensor,
};

#[derive(Clone, Default)]
struct RecordingI2c {
    writes: Arc<Mutex<Vec<(u8, Vec<u8>)>>>,
}

impl RecordingI2c {
    fn writes(&self) -> Vec<(u8, Vec<u8>)> {
        self.writes.lock().unwrap().clone()
    }
}

impl ErrorType for RecordingI2c {
    type Error = core::convert::Infallible;
}

impl I2c for RecordingI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations.iter() {
            if let Operation::Write(bytes) = op {
                self.writes.lock().unwrap().push((address, bytes.to_vec()));
            }
        }
        Ok(())
    }
}

#[test]
fn esc_and_fan_share_one_initialised_expander() {
    let i2c = RecordingI2c::default();
    let lock = BusLock::new("i2c-1", Pca9685::new(i2c.clone(), DEFAULT_ADDRESS));
    let map = DeviceMap::default();
    let id = VesselId::new(1);

    let mut esc = EscActuator::new(
        id,
        map.esc_channel(id).unwrap(),
        BusArbiter::shared("esc1", &lock),
    )
    .unwrap();
    let mut fan = PcFan::new(
        id,
        map.fan_channel(id).unwrap(),
        BusArbiter::shared("fan1", &lock),
    )
    .unwrap();

    // Mode/prescale setup happens exactly once for the shared expander.
    let setup = i2c.writes();
    assert_eq!(setup.len(), 4);
    assert_eq!(setup[0], (DEFAULT_ADDRESS, vec![0x00, 0x10]));
    assert_eq!(setup[1], (DEFAULT_ADDRESS, vec![0xFE, 121]));

    esc.write(100).unwrap();
    esc.stop().unwrap();
    fan.start().unwrap();
    fan.stop().unwrap();

    let writes = i2c.writes();
    let esc_register = 0x06 + 4;
    let fan_register = 0x06 + 4 * 9;

    // 2000 µs at 50 Hz -> duty 6554 -> 12-bit 409.
    let full_heat = &writes[4].1;
    assert_eq!(full_heat[0], esc_register);
    assert_eq!(u16::from_le_bytes([full_heat[3], full_heat[4]]), 6554 >> 4);

    // Neutral 1500 µs -> duty 4915 -> 12-bit 307.
    let neutral = &writes[5].1;
    assert_eq!(u16::from_le_bytes([neutral[3], neutral[4]]), 4915 >> 4);

    // Full on / full off use the dedicated bits.
    assert_eq!(writes[6].1, vec![fan_register, 0x00, 0x10, 0x00, 0x00]);
    assert_eq!(writes[7].1, vec![fan_register, 0x00, 0x00, 0x00, 0x10]);
}

#[test]
fn expander_rejects_out_of_range_channel() {
    let mut pca = Pca9685::new(RecordingI2c::default(), DEFAULT_ADDRESS);
    let err = pca.set_pwm(16, 100).unwrap_err();
    assert!(matches!(err, HwError::InvalidArg { .. }));
}

#[test]
fn probe_reads_through_sysfs_tree() {
    let root = std::env::temp_dir().join(format!("vt_hw_w1_{}", std::process::id()));
    let address = "28-0114536b03aa";
    std::fs::create_dir_all(root.join(address)).unwrap();
    std::fs::write(
        root.join(address).join("w1_slave"),
        "50 05 4b 46 7f ff 0c 10 1c : crc=1c YES\n50 05 4b 46 7f ff 0c 10 1c t=38937\n",
    )
    .unwrap();

    let lock = BusLock::new("w1", W1Bus::new(&root));
    let mut sensor = WaterTemperatureSensor::new(
        VesselId::new(0),
        address,
        BusArbiter::shared("probe0", &lock),
    );
    let t = sensor.read_temperature().unwrap();
    assert!((t - 38.937).abs() < 1e-9);

    let mut missing = WaterTemperatureSensor::new(
        VesselId::new(1),
        "28-000000000000",
        BusArbiter::shared("probe1", &lock),
    );
    let err = missing.read_temperature().unwrap_err();
    assert!(matches!(err, HwError::Io { .. }));

    std::fs::remove_dir_all(&root).unwrap();
}
