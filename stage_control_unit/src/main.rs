//! # Stage Control Unit
//!
//! Runs the motor controller against the simulated stage. Host commands can
//! be scripted from the command line: an optional mode request is issued at
//! tick 0, moves and the service test cycle follow at tick 1, once the mode
//! has been applied.

use std::fmt;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{Parser, ValueEnum};
use stage_common::config::{ConfigError, LogLevel};
use stage_common::motor::state::{Axis, ExecMode};
use stage_common::protocol::{APP_REVISION, DEVICE_CAN_ID, opcode};
use stage_control_unit::config::{StageConfig, load_config};
use stage_control_unit::cycle::{CycleRunner, rt_setup};
use stage_control_unit::sim::SimulatedStage;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Disable,
    Calibration,
    Command,
    Service,
}

impl From<ModeArg> for ExecMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Disable => ExecMode::Disable,
            ModeArg::Calibration => ExecMode::Calibration,
            ModeArg::Command => ExecMode::Command,
            ModeArg::Service => ExecMode::Service,
        }
    }
}

const fn mode_opcode(mode: ExecMode) -> u8 {
    match mode {
        ExecMode::Disable => opcode::DISABLE_MODE,
        ExecMode::Calibration => opcode::CALIB_MODE,
        ExecMode::Command => opcode::COMMAND_MODE,
        ExecMode::Service => opcode::SERVICE_MODE,
    }
}

/// Stage Control Unit: X/Y/Z motor workflow controller
#[derive(Parser, Debug)]
#[command(name = "stage_control_unit")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Motor workflow controller for the X/Y/Z positioning stage")]
struct Args {
    /// Controller configuration TOML. Built-in defaults when absent.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Mode to request at start.
    #[arg(long, value_enum)]
    exec_mode: Option<ModeArg>,

    /// Move X to this target [0.1 mm] (needs command mode).
    #[arg(long, value_name = "TENTHS")]
    move_x: Option<u16>,

    /// Move Y to this target [0.1 mm] (needs command mode).
    #[arg(long, value_name = "TENTHS")]
    move_y: Option<u16>,

    /// Move Z to this target [0.1 mm] (needs command mode).
    #[arg(long, value_name = "TENTHS")]
    move_z: Option<u16>,

    /// Start the service test cycle (needs service mode).
    #[arg(long)]
    test_cycle: bool,

    /// Stop after this many ticks. Runs until Ctrl-C otherwise.
    #[arg(long)]
    ticks: Option<u64>,

    /// CPU core to pin the loop to.
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority.
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

/// Where the running configuration came from.
enum ConfigSource {
    Defaults,
    Missing(PathBuf),
    File(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defaults => write!(f, "no config file given, using built-in defaults"),
            Self::Missing(path) => {
                write!(f, "config {} not found, using built-in defaults", path.display())
            }
            Self::File(path) => write!(f, "loaded config from {}", path.display()),
        }
    }
}

fn main() {
    let args = Args::parse();

    // Load before tracing exists so the file can set the default level.
    let loaded = resolve_config(&args);
    let log_level = loaded
        .as_ref()
        .map_or(LogLevel::default(), |(config, _)| config.shared.log_level);
    setup_tracing(&args, log_level);

    let (major, minor, sub) = APP_REVISION;
    info!(
        "Stage Control Unit v{} starting (device 0x{DEVICE_CAN_ID:02X}, app rev {major}.{minor}.{sub})",
        env!("CARGO_PKG_VERSION")
    );

    let result: Result<(), Box<dyn std::error::Error>> = loaded
        .map_err(Into::into)
        .and_then(|(config, source)| {
            match &source {
                ConfigSource::Missing(_) => warn!("{source}"),
                _ => info!("{source}"),
            }
            run(&args, &config)
        });
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Stage Control Unit shutdown complete");
}

fn run(args: &Args, config: &StageConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        service = %config.shared.service_name,
        tick_us = config.motors.tick_period_us,
        test_cycle_opcode = config.protocol.test_cycle_opcode,
        "config OK"
    );

    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        args.cpu_core, args.rt_priority
    );

    let hal = SimulatedStage::new(&config.motors);
    let mut runner = CycleRunner::new(hal, config);
    schedule_script(args, config, &mut runner);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    runner.run(&running, args.ticks)?;

    let stats = runner.stats();
    let controller = runner.controller();
    info!(
        mode = %controller.exec_mode(),
        ticks = stats.cycle_count,
        overruns = stats.overruns,
        avg_ns = stats.avg_cycle_ns(),
        reports = runner.reports_sent(),
        x = controller.hal().position(Axis::X),
        y = controller.hal().position(Axis::Y),
        z = controller.hal().position(Axis::Z),
        "run finished"
    );
    Ok(())
}

/// Load the config file, or fall back to defaults when none is given or it is missing.
fn resolve_config(args: &Args) -> Result<(StageConfig, ConfigSource), ConfigError> {
    let Some(path) = &args.config else {
        return Ok((StageConfig::default(), ConfigSource::Defaults));
    };
    match load_config(path) {
        Ok(config) => Ok((config, ConfigSource::File(path.clone()))),
        Err(ConfigError::FileNotFound) => {
            Ok((StageConfig::default(), ConfigSource::Missing(path.clone())))
        }
        Err(e) => Err(e),
    }
}

fn schedule_script(args: &Args, config: &StageConfig, runner: &mut CycleRunner<SimulatedStage>) {
    if let Some(mode) = args.exec_mode {
        runner.schedule(0, mode_opcode(mode.into()), &[]);
    }
    for (op, target) in [
        (opcode::MOVE_X, args.move_x),
        (opcode::MOVE_Y, args.move_y),
        (opcode::MOVE_Z, args.move_z),
    ] {
        if let Some(target) = target {
            runner.schedule(1, op, &target.to_le_bytes());
        }
    }
    if args.test_cycle {
        runner.schedule(1, config.protocol.test_cycle_opcode, &[]);
    }
}

/// Setup tracing subscriber. `--verbose` overrides the configured level.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let directive = if args.verbose {
        LogLevel::Debug.as_directive()
    } else {
        log_level.as_directive()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
