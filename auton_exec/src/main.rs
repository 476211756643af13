//! Main autonomous executable entry point.
//!
//! # Architecture
//!
//! The executable runs one autonomous routine, motion script or the tracking wheel calibration
//! against the simulated drivetrain:
//!
//!     - Initialise the session and logging
//!     - Load parameters
//!     - Build the simulated drive controller and mechanisms
//!     - Dispatch the requested routine through the motion script executor
//!     - Report the final state of the drive
//!
//! Simulated time only passes while the executor waits, so a run completes as fast as the host
//! allows.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::info;
use std::path::PathBuf;
use structopt::StructOpt;

// Internal
use auton_lib::{
    auton::Autonomous,
    drive::{DriveController, SimDrive},
    exec::Executor,
    mech::SimMechanisms,
    params::AutonExecParams,
    routines::RoutineDispatcher,
    script::run_script,
};
use util::{
    logger::{logger_init, LevelFilter},
    script_interpreter::ScriptInterpreter,
    session::Session,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(
    name = "auton_exec",
    about = "Run autonomous routines against the simulated drivetrain"
)]
struct Opts {
    /// Log every physics step of the simulated drive.
    #[structopt(long)]
    trace_sim: bool,

    #[structopt(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, StructOpt)]
enum Cmd {
    /// List the available routines.
    #[structopt(name = "list")]
    List,

    /// Run the named routine.
    #[structopt(name = "run")]
    Run { routine: String },

    /// Run the motion script at the given path.
    #[structopt(name = "script")]
    Script {
        #[structopt(parse(from_os_str))]
        path: PathBuf,
    },

    /// Measure the tracking wheel offsets.
    #[structopt(name = "calibrate")]
    Calibrate,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();
    let dispatcher = RoutineDispatcher::with_bundled();

    if let Cmd::List = opts.cmd {
        for name in dispatcher.names() {
            println!("{}", name);
        }
        return Ok(());
    }

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("auton_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    // Initialise logger
    let sim_level = if opts.trace_sim {
        LevelFilter::Trace
    } else {
        LevelFilter::Info
    };
    logger_init(LevelFilter::Trace, sim_level, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Autonomous Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params: AutonExecParams = util::params::load_or_default("auton_exec.toml")
        .wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE DRIVE ----

    let mut sim = SimDrive::new(params.drive.clone(), params.sim.clone());
    let mut mech = SimMechanisms::new();

    // ---- DISPATCH ----

    {
        let mut auton = Autonomous::new(
            Executor::new(&mut sim, params.exec.clone()),
            &mut mech,
            params.recovery.clone(),
        );

        match opts.cmd {
            Cmd::Run { routine } => dispatcher
                .run(&routine, &mut auton)
                .wrap_err_with(|| format!("Routine \"{}\" failed", routine))?,
            Cmd::Script { path } => {
                let si = ScriptInterpreter::new(&path).wrap_err("Failed to load script")?;
                info!("Loaded script contains {} steps\n", si.get_num_steps());

                let report = run_script(si, &mut auton).wrap_err("Script failed")?;
                info!("Script report: {:?}", report);
            }
            Cmd::Calibrate => {
                let report = dispatcher
                    .calibrate(&mut auton, params.calib.clone())
                    .wrap_err("Calibration failed")?;
                info!(
                    "Calibration used {} trials, rejected {}",
                    report.num_valid, report.num_rejected
                );
            }
            Cmd::List => (),
        }
    }

    // ---- REPORT ----

    info!(
        "Finished at {} after {:.2} s simulated",
        sim.pose(),
        sim.time_ms() as f64 / 1000.0
    );

    // Save the drive configuration so installed offsets can be copied into the parameters
    let config_path = session.session_root.join("drive_config.json");
    let config_str = serde_json::to_string_pretty(&sim.config())
        .wrap_err("Failed to serialise the drive configuration")?;
    std::fs::write(&config_path, config_str)
        .wrap_err("Failed to write the drive configuration")?;
    info!("Drive configuration saved to {:?}", config_path);

    Ok(())
}
