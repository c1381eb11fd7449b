//! Person tracking executable entry point.
//!
//! # Architecture
//!
//! The executable consists of:
//!
//!     - Configuration from the command line, validated before anything starts
//!     - Session and logger initialisation
//!     - Module initialisation:
//!         - Tracking control
//!         - Detection source
//!         - Motor driver
//!     - Tracking loop, running until the detection stream ends:
//!         - Frame capture and object detection
//!         - Target selection and PD steering
//!         - Motor speed demands
//!
//! Set `TRACKBUD_SW_ROOT` to the software root, sessions are written to `sessions/` under it and
//! the motor HAT parameters are loaded from `params/mot_driver.toml`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::info;
use structopt::StructOpt;

// Internal
use track_lib::{
    cli::{MotorKind, Opts},
    clock::MonoClock,
    det_source::{DetSource, ReplaySource},
    mot_driver::{pca9685, HatParams, MotorDriver, SimMotors},
    track_ctrl::TrackCtrl,
    track_loop::{LoopSummary, TrackLoop, TrackLoopError},
};
use util::{host, logger::logger_init, module::State, session::Session};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- CONFIGURATION ----

    let opts = Opts::from_args();

    // Nothing is started on an invalid configuration
    opts.validate().wrap_err("Invalid configuration")?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("track_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opts.log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Person Tracking Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- INITIALISE MODULES ----

    let mut track_ctrl = TrackCtrl::default();
    track_ctrl
        .init(opts.ctrl_params(), Some(&session))
        .wrap_err("Failed to initialise TrackCtrl")?;
    info!("TrackCtrl init complete: {:?}", track_ctrl.params());

    let source = ReplaySource::open(&opts.input_uri, opts.detect_config())
        .wrap_err("Failed to open the detection source")?;

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    let summary = match opts.motors {
        MotorKind::Sim => {
            info!("Driving simulated motors");
            run(source, SimMotors::new(), track_ctrl)
        }
        MotorKind::Hat => {
            let hat_params: HatParams = util::params::load("mot_driver.toml")
                .wrap_err("Could not load the motor HAT parameters")?;

            let motors =
                pca9685::open_hat(hat_params).wrap_err("Could not open the motor HAT")?;
            info!("Motor HAT opened");

            run(source, motors, track_ctrl)
        }
    }
    .wrap_err("Tracking loop failed")?;

    info!(
        "End of session: {} cycles, {} without a target",
        summary.num_cycles, summary.num_no_target
    );

    Ok(())
}

/// Run the tracking loop on the monotonic clock.
fn run<S, M>(source: S, motors: M, ctrl: TrackCtrl) -> Result<LoopSummary, TrackLoopError>
where
    S: DetSource,
    M: MotorDriver,
{
    TrackLoop::new(source, motors, MonoClock::new(), ctrl).run()
}
