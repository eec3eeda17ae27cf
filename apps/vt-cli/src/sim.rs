//! Simulated plant wiring and the tick loops driving it.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::time::Duration;

use tokio::time;
use tracing::{error, info};
use vt_core::{Clock, ManualClock, MonotonicClock};
use vt_hw::{ActuatorPort, BusArbiter, BusLock, SensorPort};
use vt_reactor::{PlantConfig, ReactorController, export_channels, export_jsonl, now_timestamp};
use vt_sim::{SimActuator, SimBus, SimSensor, SimulatedVessel};

use crate::error::{CliError, CliResult};

pub type SimController<C> = ReactorController<SimSensor<C>, SimActuator<C>, C>;

/// Controllers for every configured vessel, one bus lock per shared bus.
pub struct SimPlant<C: Clock + Clone> {
    pub vessels: Vec<SimulatedVessel<C>>,
    pub controllers: Vec<SimController<C>>,
}

impl<C: Clock + Clone> SimPlant<C> {
    pub fn build(config: &PlantConfig, clock: C, setpoint: Option<f64>) -> CliResult<Self> {
        let latency = config.simulation.bus_latency();
        let one_wire = config
            .buses
            .shared_one_wire
            .then(|| BusLock::new("w1", SimBus::new(latency)));
        let i2c = config
            .buses
            .shared_i2c
            .then(|| BusLock::new("i2c-1", SimBus::new(latency)));
        let devices = config.device_map();

        let mut vessels = Vec::with_capacity(config.vessels.len());
        let mut controllers = Vec::with_capacity(config.vessels.len());
        for vc in &config.vessels {
            let vessel =
                SimulatedVessel::new(vc.id, config.simulation.plant.clone(), clock.clone())?;
            let probe = devices.probe_address(vc.id)?;
            let esc = format!("esc{}", devices.esc_channel(vc.id)?);
            let sensor = vessel.sensor(BusArbiter::new(probe, one_wire.as_ref(), || {
                SimBus::new(latency)
            }));
            let actuator = vessel.actuator(BusArbiter::new(esc, i2c.as_ref(), || {
                SimBus::new(latency)
            }));
            let controller = ReactorController::new(
                vc.id,
                sensor,
                actuator,
                clock.clone(),
                &config.pid,
                setpoint.unwrap_or(vc.target_temperature_c),
                vc.enabled,
            )?;
            vessels.push(vessel);
            controllers.push(controller);
        }
        Ok(Self {
            vessels,
            controllers,
        })
    }

    pub fn print_summary(&self) {
        for (vessel, c) in self.vessels.iter().zip(&self.controllers) {
            println!(
                "  {}: {:.2} °C (target {:.2} °C), {} samples, last command {}",
                vessel.id(),
                vessel.temperature_c(),
                c.target_temperature(),
                c.telemetry().len(),
                c.telemetry().last().map_or(0, |s| s.control_value),
            );
        }
    }
}

/// Tick one controller. A panic inside the tick is caught and reported as
/// an error so the controller is still there for export and finalize.
fn guarded_tick<S: SensorPort, A: ActuatorPort, C: Clock>(
    c: &mut ReactorController<S, A, C>,
) -> CliResult<()> {
    match panic::catch_unwind(AssertUnwindSafe(|| c.tick())) {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => {
            error!(vessel = %c.id(), error = %e, "tick failed");
            Err(e.into())
        }
        Err(_) => {
            error!(vessel = %c.id(), "tick panicked");
            Err(CliError::TickPanicked { vessel: c.id() })
        }
    }
}

/// Tick every controller once, stopping at the first failure.
fn tick_all<S: SensorPort, A: ActuatorPort, C: Clock>(
    controllers: &mut [ReactorController<S, A, C>],
) -> CliResult<()> {
    for c in controllers.iter_mut() {
        guarded_tick(c)?;
    }
    Ok(())
}

/// Simulated time: advance a manual clock by one tick period per step.
pub fn run_fast(config: &PlantConfig, ticks: usize, setpoint: Option<f64>, jsonl: bool) -> CliResult<()> {
    let clock = ManualClock::new(0.0);
    let mut plant = SimPlant::build(config, clock.clone(), setpoint)?;
    info!(vessels = plant.controllers.len(), ticks, "simulating");

    let mut result = Ok(());
    for _ in 0..ticks {
        clock.advance(config.tick_period_s);
        result = tick_all(&mut plant.controllers);
        if result.is_err() {
            break;
        }
    }

    println!("Simulated {:.0} s", clock.now_s());
    plant.print_summary();
    let shutdown = shutdown(&mut plant.controllers, &config.log_dir, jsonl);
    result.and(shutdown)
}

/// Wall-clock time: one blocking tick task per vessel on every interval
/// tick, until `ticks` are done or Ctrl-C arrives.
pub fn run_realtime(
    config: &PlantConfig,
    ticks: Option<usize>,
    setpoint: Option<f64>,
    jsonl: bool,
) -> CliResult<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let clock = MonotonicClock::new();
    let plant = SimPlant::build(config, clock, setpoint)?;
    let period = config.tick_period();
    runtime.block_on(realtime_loop(plant, period, ticks, &config.log_dir, jsonl))
}

async fn realtime_loop(
    mut plant: SimPlant<MonotonicClock>,
    period: Duration,
    ticks: Option<usize>,
    log_dir: &Path,
    jsonl: bool,
) -> CliResult<()> {
    let mut interval = time::interval(period);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    info!(vessels = plant.controllers.len(), period_s = period.as_secs_f64(), "control loop started");

    let mut done = 0usize;
    let mut result = Ok(());
    while ticks.is_none_or(|n| done < n) {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupt received, shutting down");
                break;
            }
            _ = interval.tick() => {
                let tasks: Vec<_> = plant
                    .controllers
                    .drain(..)
                    .map(|mut c| {
                        tokio::task::spawn_blocking(move || {
                            let r = guarded_tick(&mut c);
                            (c, r)
                        })
                    })
                    .collect();
                for task in tasks {
                    match task.await {
                        Ok((c, r)) => {
                            result = result.and(r);
                            plant.controllers.push(c);
                        }
                        Err(e) => result = result.and(Err(CliError::from(e))),
                    }
                }
                if result.is_err() {
                    break;
                }
                done += 1;
            }
        }
    }

    plant.print_summary();
    let shutdown = shutdown(&mut plant.controllers, log_dir, jsonl);
    result.and(shutdown)
}

/// Export each controller's telemetry, then finalize it. Every controller
/// is finalized even if an export or an earlier finalize failed.
pub fn shutdown<S: SensorPort, A: ActuatorPort, C: Clock>(
    controllers: &mut [ReactorController<S, A, C>],
    log_dir: &Path,
    jsonl: bool,
) -> CliResult<()> {
    let timestamp = now_timestamp();
    let mut first_err: Option<CliError> = None;
    for c in controllers.iter_mut() {
        match export_channels(c.telemetry(), log_dir, c.id(), &timestamp) {
            Ok(_) => println!("  {}: telemetry written to {}", c.id(), log_dir.display()),
            Err(e) => {
                error!(vessel = %c.id(), error = %e, "telemetry export failed");
                first_err.get_or_insert(e.into());
            }
        }
        if jsonl && let Err(e) = export_jsonl(c.telemetry(), log_dir, c.id(), &timestamp) {
            error!(vessel = %c.id(), error = %e, "jsonl export failed");
            first_err.get_or_insert(e.into());
        }
        if let Err(e) = c.finalize() {
            error!(vessel = %c.id(), error = %e, "finalize failed");
            first_err.get_or_insert(e.into());
        }
    }
    first_err.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vt_core::VesselId;
    use vt_hw::HwResult;
    use vt_reactor::{MIN_TICK_PERIOD, VesselConfig};
    use vt_sim::PlantParams;

    struct FaultySensor;

    impl SensorPort for FaultySensor {
        fn read_temperature(&mut self) -> HwResult<f64> {
            panic!("sensor driver bug");
        }
    }

    fn config(tag: &str) -> PlantConfig {
        let mut config = PlantConfig::default();
        config.log_dir = std::env::temp_dir().join(format!("vt_cli_{tag}_{}", std::process::id()));
        config.simulation.bus_latency_ms = 0;
        config.vessels = vec![
            VesselConfig::new(VesselId::new(0)),
            VesselConfig {
                enabled: false,
                ..VesselConfig::new(VesselId::new(1))
            },
        ];
        config
    }

    #[test]
    fn fast_run_exports_and_stops_every_vessel() {
        let config = config("fast");
        let clock = ManualClock::new(0.0);
        let mut plant = SimPlant::build(&config, clock.clone(), Some(35.0)).unwrap();
        for _ in 0..5 {
            clock.advance(1.0);
            tick_all(&mut plant.controllers).unwrap();
        }
        assert_eq!(plant.controllers[0].telemetry().len(), 5);
        assert!(plant.controllers[1].telemetry().is_empty());
        assert_eq!(plant.vessels[0].command(), 100);

        shutdown(&mut plant.controllers, &config.log_dir, true).unwrap();
        assert!(plant.vessels.iter().all(|v| v.command() == 0));
        assert!(plant.controllers.iter().all(|c| !c.is_enabled()));

        let files = std::fs::read_dir(&config.log_dir).unwrap().count();
        // Five channels plus one jsonl per vessel.
        assert_eq!(files, 12);
        std::fs::remove_dir_all(&config.log_dir).unwrap();
    }

    #[test]
    fn unshared_buses_still_run() {
        let mut config = config("unshared");
        config.buses.shared_one_wire = false;
        config.buses.shared_i2c = false;
        let clock = ManualClock::new(0.0);
        let mut plant = SimPlant::build(&config, clock.clone(), None).unwrap();
        clock.advance(1.0);
        tick_all(&mut plant.controllers).unwrap();
        assert_eq!(plant.controllers[0].telemetry().len(), 1);
    }

    #[test]
    fn panicking_tick_still_exports_and_finalizes() {
        let config = config("panic");
        let clock = ManualClock::new(0.0);
        let vessel =
            SimulatedVessel::new(VesselId::new(0), PlantParams::default(), clock.clone()).unwrap();
        let actuator = vessel.actuator(BusArbiter::exclusive("esc0", SimBus::default()));
        let c = ReactorController::new(
            VesselId::new(0),
            FaultySensor,
            actuator,
            clock.clone(),
            &config.pid,
            39.0,
            true,
        )
        .unwrap();
        let mut controllers = vec![c];

        clock.advance(1.0);
        let err = tick_all(&mut controllers).unwrap_err();
        assert!(matches!(err, CliError::TickPanicked { vessel } if vessel == VesselId::new(0)));
        assert_eq!(controllers.len(), 1);

        shutdown(&mut controllers, &config.log_dir, false).unwrap();
        assert!(!controllers[0].is_enabled());
        assert_eq!(vessel.command(), 0);
        let files = std::fs::read_dir(&config.log_dir).unwrap().count();
        assert_eq!(files, 5);
        std::fs::remove_dir_all(&config.log_dir).unwrap();
    }

    #[test]
    fn realtime_run_exports_after_fixed_ticks() {
        let mut config = config("realtime");
        config.tick_period_s = MIN_TICK_PERIOD.as_secs_f64() * 5.0;
        run_realtime(&config, Some(3), None, false).unwrap();
        let files = std::fs::read_dir(&config.log_dir).unwrap().count();
        assert_eq!(files, 10);
        std::fs::remove_dir_all(&config.log_dir).unwrap();
    }
}
