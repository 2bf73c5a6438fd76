//! Main alignment executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Telecommand processing
//!         - Detection acquisition from each camera
//!         - Alignment control processing
//!         - Chassis drive
//!         - Archiving
//!
//! # Modules
//!
//! All modules (e.g. `align_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!
//! # Usage
//!
//! ```text
//! align_exec <script.prs>
//! ```

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use align_lib::{
    data_store::DataStore,
    drive_if::{self, ChassisDrive},
    params::{AlignExecParams, VisionBackend},
    sim::{SimParams, SimWorld},
    vision::{acquirer, DetectionSource, FieldLayout, LayoutSource},
};
use comms_if::eqpt::vision::{CamId, DetectionSet};

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use chrono::{DateTime, Utc};
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, error, info, warn};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session =
        Session::new("align_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Fiducial Alignment Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: AlignExecParams =
        util::params::load("align_exec.toml").wrap_err("Could not load exec params")?;

    let cycle_frequency_hz = 1.0 / exec_params.cycle_period_s;

    info!("Exec parameters loaded");

    // ---- INITIALISE TC SOURCE ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    if args.len() != 2 {
        return Err(eyre!(
            "Expected exactly one argument (the script path), found {}",
            args.len() - 1
        ));
    }

    info!("Loading script from \"{}\"", &args[1]);

    let mut script = ScriptInterpreter::new(&args[1]).wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} TCs\n",
        script.get_duration(),
        script.get_num_tcs()
    );

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    // Module init data lives for the whole execution
    let align_ctrl_params: &'static str =
        Box::leak(exec_params.align_ctrl_params.clone().into_boxed_str());

    ds.align_ctrl
        .init(align_ctrl_params, &session)
        .wrap_err("Failed to initialise AlignCtrl")?;
    info!("AlignCtrl init complete");

    let status_rx = ds.align_ctrl.subscribe_status();

    info!("Module initialisation complete\n");

    // ---- INITIALISE WORLD ----

    let sim_params: SimParams =
        util::params::load(&exec_params.sim_params).wrap_err("Could not load sim params")?;
    let layout =
        FieldLayout::load(&exec_params.field_layout).wrap_err("Could not load the field layout")?;

    info!("Field layout contains {} markers", layout.len());

    let world = SimWorld::new(sim_params, &layout, Utc::now());

    let mut backend = match exec_params.vision_backend {
        VisionBackend::PoseCamera => Backend::PoseCamera(world),
        VisionBackend::FieldLayout => {
            let mounts = world.mounts();
            Backend::FieldLayout(LayoutSource::new(world, layout, mounts))
        }
    };

    info!("Using the {:?} vision backend", exec_params.vision_backend);

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(cycle_frequency_hz);

        // ---- TELECOMMAND PROCESSING ----

        match script.get_pending_tcs(ds.session_time_s) {
            PendingTcs::None => (),
            PendingTcs::Some(tc_vec) => {
                for tc in tc_vec.iter() {
                    tc_processor::exec(&mut ds, tc);
                }
            }
            // Exit if end of script reached
            PendingTcs::EndOfScript => {
                info!("End of TC script reached, stopping");
                break;
            }
        }

        if ds.shutdown {
            info!("Shutdown TC executed, stopping");
            break;
        }

        // ---- DATA INPUT ----

        let now = backend.world().time();

        if let Backend::FieldLayout(ref mut src) = backend {
            let pose = src.inner().current_pose();
            src.set_chassis_pose(pose);
        }

        let frames: Vec<_> = exec_params
            .cameras
            .iter()
            .map(|&cam| (cam, backend.acquire(cam, now)))
            .collect();

        ds.align_ctrl_input.frames = frames;
        ds.align_ctrl_input.cycle_time = Some(now);

        // ---- CONTROL ALGORITHM PROCESSING ----

        match ds.align_ctrl.proc(&ds.align_ctrl_input) {
            Ok((o, r)) => {
                ds.align_ctrl_output = o;
                ds.align_ctrl_status_rpt = r;
            }
            Err(e) => warn!("Error during AlignCtrl processing: {}", e),
        };

        for status in status_rx.try_iter() {
            info!("Alignment status: {:?}", status);
        }

        // Send demands to the chassis
        if let Some(cmd) = ds.align_ctrl_output.drive_cmd {
            drive_if::apply(backend.world_mut(), &cmd);
        }

        // ---- WRITE ARCHIVES ----

        if let Err(e) = ds.align_ctrl.write() {
            warn!("Could not write AlignCtrl archives: {}", e);
        }

        // ---- SIMULATION ----

        backend.world_mut().step(exec_params.cycle_period_s);

        if ds.is_1_hz_cycle {
            debug!(
                "Cycle {}: {:?}, chassis at {:?}",
                ds.num_cycles,
                ds.align_ctrl_status_rpt.mode,
                backend.world().current_pose()
            );
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(exec_params.cycle_period_s).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - exec_params.cycle_period_s
                );
                ds.num_consec_cycle_overruns += 1;

                if ds.num_consec_cycle_overruns == exec_params.max_consec_cycle_overruns {
                    error!(
                        "{} consecutive cycle overruns, control is no longer real time",
                        ds.num_consec_cycle_overruns
                    );
                }
            }
        }

        ds.cycle_end();
    }

    // ---- SHUTDOWN ----

    backend.world_mut().stop();

    info!(
        "End of execution after {} cycles at {:.03} s",
        ds.num_cycles,
        session::get_elapsed_seconds()
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The world the executable drives, and how detections are obtained from it.
enum Backend {
    PoseCamera(SimWorld),
    FieldLayout(LayoutSource<SimWorld>),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Backend {
    fn world(&self) -> &SimWorld {
        match self {
            Backend::PoseCamera(w) => w,
            Backend::FieldLayout(s) => s.inner(),
        }
    }

    fn world_mut(&mut self) -> &mut SimWorld {
        match self {
            Backend::PoseCamera(w) => w,
            Backend::FieldLayout(s) => s.inner_mut(),
        }
    }

    fn source_mut(&mut self) -> &mut dyn DetectionSource {
        match self {
            Backend::PoseCamera(w) => w,
            Backend::FieldLayout(s) => s,
        }
    }

    fn acquire(&mut self, cam: CamId, now: DateTime<Utc>) -> DetectionSet {
        acquirer::acquire(self.source_mut(), cam, now)
    }
}
