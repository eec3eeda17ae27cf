mod error;
mod sim;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vt_hw::{BusArbiter, BusLock, SensorPort, W1Bus, WaterTemperatureSensor};
use vt_reactor::{PlantConfig, load_json, load_yaml, save_yaml};

use crate::error::{CliError, CliResult};

#[derive(Parser)]
#[command(name = "vt-cli")]
#[command(about = "Vessel temperature control - PID regulation of heated/cooled vessels", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a plant configuration file
    Validate {
        /// Path to the plant YAML (or JSON) file
        config_path: PathBuf,
    },
    /// Write a default plant configuration
    Init {
        /// Destination YAML file
        config_path: PathBuf,
    },
    /// Run the control loop against simulated vessels
    Simulate {
        /// Plant configuration; built-in defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of ticks to run (realtime mode runs until Ctrl-C when omitted)
        #[arg(short, long)]
        ticks: Option<usize>,
        /// Tick on the wall clock instead of simulated time
        #[arg(long)]
        realtime: bool,
        /// Override every vessel's target temperature, °C
        #[arg(long)]
        setpoint: Option<f64>,
        /// Also export telemetry as JSON lines
        #[arg(long)]
        jsonl: bool,
    },
    /// Read every configured DS18B20 probe once
    ReadSensors {
        /// Plant configuration; built-in defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Root of the one-wire sysfs tree
        #[arg(long, default_value = vt_hw::w1::DEFAULT_DEVICES_ROOT)]
        devices_root: PathBuf,
    },
}

const DEFAULT_FAST_TICKS: usize = 600;

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::Init { config_path } => cmd_init(&config_path),
        Commands::Simulate {
            config,
            ticks,
            realtime,
            setpoint,
            jsonl,
        } => {
            let config = load_config(config.as_deref())?;
            if realtime {
                sim::run_realtime(&config, ticks, setpoint, jsonl)
            } else {
                sim::run_fast(&config, ticks.unwrap_or(DEFAULT_FAST_TICKS), setpoint, jsonl)
            }
        }
        Commands::ReadSensors {
            config,
            devices_root,
        } => cmd_read_sensors(config.as_deref(), &devices_root),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<PlantConfig> {
    let Some(path) = path else {
        info!("no configuration given, using defaults");
        return Ok(PlantConfig::default());
    };
    let config = if path.extension().is_some_and(|ext| ext == "json") {
        load_json(path)?
    } else {
        load_yaml(path)?
    };
    Ok(config)
}

fn cmd_validate(config_path: &Path) -> CliResult<()> {
    println!("Validating configuration: {}", config_path.display());
    let config = load_config(Some(config_path))?;
    println!("✓ Configuration is valid");
    println!("  Vessels: {}", config.vessels.len());
    for v in &config.vessels {
        println!(
            "    {} - target {:.1} °C, {}",
            v.id,
            v.target_temperature_c,
            if v.enabled { "enabled" } else { "disabled" }
        );
    }
    println!("  Tick period: {:.3} s", config.tick_period_s);
    Ok(())
}

fn cmd_init(config_path: &Path) -> CliResult<()> {
    save_yaml(config_path, &PlantConfig::default())?;
    println!("✓ Default configuration written to {}", config_path.display());
    Ok(())
}

fn cmd_read_sensors(config_path: Option<&Path>, devices_root: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let devices = config.device_map();
    let lock = config
        .buses
        .shared_one_wire
        .then(|| BusLock::new("w1", W1Bus::new(devices_root)));

    let mut failed = 0;
    for v in &config.vessels {
        let address = devices.probe_address(v.id)?;
        let bus = BusArbiter::new(address, lock.as_ref(), || W1Bus::new(devices_root));
        let mut sensor = WaterTemperatureSensor::new(v.id, address, bus);
        match sensor.read_temperature() {
            Ok(t) => println!("  {} ({}): {:.3} °C", v.id, address, t),
            Err(e) => {
                error!(vessel = %v.id, error = %e, "sensor read failed");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(CliError::SensorReads {
            failed,
            total: config.vessels.len(),
        });
    }
    Ok(())
}
