//! Sensor and actuator handles backed by a [`VesselPlant`].

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;
use vt_core::{Clock, Command, VesselId};
use vt_hw::{ActuatorPort, BusArbiter, HwError, HwResult, SensorPort};

use crate::bus::SimBus;
use crate::error::SimResult;
use crate::plant::{PlantParams, VesselPlant};

#[derive(Debug)]
struct Shared {
    plant: Mutex<VesselPlant>,
    fail_next_read: AtomicBool,
    fail_next_write: AtomicBool,
}

impl Shared {
    fn plant(&self) -> MutexGuard<'_, VesselPlant> {
        self.plant.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One simulated vessel. Cloning yields another handle to the same plant.
#[derive(Debug, Clone)]
pub struct SimulatedVessel<C> {
    id: VesselId,
    shared: Arc<Shared>,
    clock: C,
}

impl<C: Clock + Clone> SimulatedVessel<C> {
    pub fn new(id: VesselId, params: PlantParams, clock: C) -> SimResult<Self> {
        let mut plant = VesselPlant::new(params)?;
        plant.advance_to(clock.now_s());
        Ok(Self {
            id,
            shared: Arc::new(Shared {
                plant: Mutex::new(plant),
                fail_next_read: AtomicBool::new(false),
                fail_next_write: AtomicBool::new(false),
            }),
            clock,
        })
    }

    pub fn id(&self) -> VesselId {
        self.id
    }

    /// Temperature probe reached through `bus`.
    pub fn sensor(&self, bus: BusArbiter<SimBus>) -> SimSensor<C> {
        SimSensor {
            vessel: self.clone(),
            bus,
        }
    }

    /// Heating/cooling actuator reached through `bus`.
    pub fn actuator(&self, bus: BusArbiter<SimBus>) -> SimActuator<C> {
        SimActuator {
            vessel: self.clone(),
            bus,
        }
    }

    /// Current temperature, integrating up to now.
    pub fn temperature_c(&self) -> f64 {
        let mut plant = self.shared.plant();
        plant.advance_to(self.clock.now_s());
        plant.temperature_c()
    }

    pub fn command(&self) -> Command {
        self.shared.plant().command()
    }

    /// Snapshot of the plant state.
    pub fn plant(&self) -> VesselPlant {
        self.shared.plant().clone()
    }

    /// Make the next sensor read fail with an I/O error.
    pub fn fail_next_read(&self) {
        self.shared.fail_next_read.store(true, Ordering::SeqCst);
    }

    /// Make the next actuator write or stop fail with an I/O error.
    pub fn fail_next_write(&self) {
        self.shared.fail_next_write.store(true, Ordering::SeqCst);
    }

    fn injected(flag: &AtomicBool, device: &str) -> HwResult<()> {
        if flag.swap(false, Ordering::SeqCst) {
            return Err(HwError::io(device, io::Error::other("injected fault")));
        }
        Ok(())
    }
}

pub struct SimSensor<C> {
    vessel: SimulatedVessel<C>,
    bus: BusArbiter<SimBus>,
}

impl<C: Clock + Clone> SensorPort for SimSensor<C> {
    fn read_temperature(&mut self) -> HwResult<f64> {
        let device = self.bus.device().to_string();
        let vessel = &self.vessel;
        self.bus.transaction(|bus| {
            bus.transact(&device, || -> HwResult<f64> {
                SimulatedVessel::<C>::injected(&vessel.shared.fail_next_read, &device)?;
                Ok(vessel.temperature_c())
            })
        })
    }
}

pub struct SimActuator<C> {
    vessel: SimulatedVessel<C>,
    bus: BusArbiter<SimBus>,
}

impl<C: Clock + Clone> SimActuator<C> {
    fn apply(&mut self, command: Command) -> HwResult<()> {
        let device = self.bus.device().to_string();
        let vessel = &self.vessel;
        self.bus.transaction(|bus| {
            bus.transact(&device, || -> HwResult<()> {
                SimulatedVessel::<C>::injected(&vessel.shared.fail_next_write, &device)?;
                let now = vessel.clock.now_s();
                vessel.shared.plant().set_command(command, now);
                debug!(vessel = %vessel.id, command, "simulated actuator set");
                Ok(())
            })
        })
    }
}

impl<C: Clock + Clone> ActuatorPort for SimActuator<C> {
    fn write(&mut self, command: Command) -> HwResult<()> {
        self.apply(command)
    }

    fn stop(&mut self) -> HwResult<()> {
        self.apply(0)
    }
}
