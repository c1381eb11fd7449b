//! Tracking control module
//!
//! A PD controller on the horizontal pixel offset between the tracked target and the centre of
//! the frame. The controller output `K` is added to the left wheel speed and subtracted from the
//! right, both around a base of `0.5`, so a target to the right of centre (positive error) turns
//! the robot to the right.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The speed both wheels are demanded at when the steering gain is zero.
pub const BASE_SPEED: f64 = 0.5;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during TrackCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum TrackCtrlError {
    #[error("Controller processed {elapsed_ms:.3} ms after the last sample, the period is {period_ms} ms")]
    NotDue { elapsed_ms: f64, period_ms: f64 },

    #[error("Could not set up the controller archive: {0}")]
    ArchiveError(#[from] util::archive::ArchiveError),

    #[error(transparent)]
    InvalidParams(#[from] ParamsError),
}
