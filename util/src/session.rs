//! Session management
//!
//! A session is one execution of an executable. Each session gets its own directory under the
//! software root containing the log file and the archives written during the run.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use chrono::{DateTime, Utc};
use conquer_once::{OnceCell, TryInitError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal imports
use crate::time;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static SESSION_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// A chrono format string which diplays a timestamp. See
/// https://docs.rs/chrono/0.4.11/chrono/format/strftime/index.html for more
/// information.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A struct storing information about the current session
#[derive(Clone, Debug)]
pub struct Session {
    /// The root directory for this session
    pub session_root: PathBuf,

    /// The root directory for this session's archives
    pub arch_root: PathBuf,

    /// The path to the session's log file
    pub log_file_path: PathBuf,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors associated with the session module.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The software root environment variable ({}) is not set", crate::host::SW_ROOT_ENV_VAR)]
    SwRootNotSet,

    #[error("Cannot create the session directory: {0}")]
    CannotCreateDir(std::io::Error),

    #[error("Cannot initialise the session epoch (conquer_once error: {0})")]
    CannotInitEpoch(TryInitError),

    #[error("Cannot get the epoch time")]
    CannotGetEpoch,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start a new session within the given directory of the software root.
    ///
    /// This will create a new session directory named `{exec_name}_{timestamp}`
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        let root = crate::host::get_sw_root().map_err(|_| SessionError::SwRootNotSet)?;

        Self::in_root(root, exec_name, sessions_dir)
    }

    /// Start a new session under an explicit root directory.
    ///
    /// The session epoch is process wide, only the first session created sets it.
    pub fn in_root<P: AsRef<Path>>(
        root: P,
        exec_name: &str,
        sessions_dir: &str,
    ) -> Result<Self, SessionError> {
        // Set the session epoch if this is the first session
        match SESSION_EPOCH.try_init_once(Utc::now) {
            Ok(_) | Err(TryInitError::AlreadyInit) => (),
            Err(e) => return Err(SessionError::CannotInitEpoch(e)),
        };

        let timestamp = match SESSION_EPOCH.get() {
            Some(e) => e.format(TIMESTAMP_FORMAT),
            None => return Err(SessionError::CannotGetEpoch),
        };

        let mut path = root.as_ref().to_path_buf();
        path.push(sessions_dir);
        path.push(format!("{}_{}", exec_name, timestamp));

        let arch_path = path.join("arch");
        fs::create_dir_all(&arch_path).map_err(SessionError::CannotCreateDir)?;

        let log_file_path = path.join(format!("{}.log", exec_name));

        Ok(Session {
            session_root: path,
            arch_root: arch_path,
            log_file_path,
        })
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the number of seconds elapsed since the start of the session.
///
/// Returns NaN if no session has been started yet.
pub fn get_elapsed_seconds() -> f64 {
    match SESSION_EPOCH.get() {
        Some(e) => time::duration_to_seconds(Utc::now() - *e).unwrap_or(std::f64::NAN),
        None => std::f64::NAN,
    }
}

/// Return a reference to the session's epoch, if a session has been started.
pub fn get_epoch() -> Option<&'static DateTime<Utc>> {
    SESSION_EPOCH.get()
}
