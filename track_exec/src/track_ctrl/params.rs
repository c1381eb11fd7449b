//! Parameters structure for TrackCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::det::{ClassId, PERSON_CLASS_ID};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Longest accepted sampling period, one hour.
///
/// Units: milliseconds
pub const MAX_PERIOD_MS: f64 = 3_600_000.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Tracking control.
///
/// These are fixed at startup and never change while the loop runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Params {
    // ---- GAINS ----
    /// Proportional gain.
    ///
    /// Units: 1/pixels
    pub k_p: f64,

    /// Derivative gain.
    ///
    /// Units: seconds/pixels
    pub k_d: f64,

    // ---- TIMING ----
    /// Sampling period, the minimum time between two control computations.
    ///
    /// Units: milliseconds
    pub period_ms: f64,

    // ---- CAPABILITIES ----
    /// Minimum wheel speed demanded by the controller.
    ///
    /// Units: normalised
    pub min_speed: f64,

    /// Maximum wheel speed demanded by the controller.
    ///
    /// Units: normalised
    pub max_speed: f64,

    // ---- TARGETING ----
    /// Class of detection to track.
    pub track_class: ClassId,

    /// What to do on a cycle with no target.
    pub no_target_mode: NoTargetMode,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Behaviour of the controller on a cycle where no target was found.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoTargetMode {
    /// Demand the neutral stop command.
    Stop,

    /// Repeat the last command computed with a target, or stop if there hasn't been one.
    Hold,

    /// Turn on the spot towards the side the target was last seen on.
    Search,
}

/// Errors in the tracking control parameters.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParamsError {
    #[error("The minimum wheel speed ({min}) must be less than the maximum ({max})")]
    InvalidSpeedRange { min: f64, max: f64 },

    #[error("Wheel speeds must be between -1.0 and 1.0, found {0}")]
    SpeedOutOfRange(f64),

    #[error("The sampling period must be greater than zero and at most one hour, found {0} ms")]
    InvalidPeriod(f64),

    #[error("The {0} gain must be finite, found {1}")]
    NonFiniteGain(&'static str, f64),

    #[error("Unknown no-target mode \"{0}\", expected 'stop', 'hold' or 'search'")]
    UnknownNoTargetMode(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            k_p: 0.1,
            k_d: 0.01,
            period_ms: 500.0,
            min_speed: 0.2,
            max_speed: 0.8,
            track_class: PERSON_CLASS_ID,
            no_target_mode: NoTargetMode::Stop,
        }
    }
}

impl Params {
    /// Check the parameters can be used by the controller.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !self.k_p.is_finite() {
            return Err(ParamsError::NonFiniteGain("proportional", self.k_p));
        }
        if !self.k_d.is_finite() {
            return Err(ParamsError::NonFiniteGain("derivative", self.k_d));
        }

        // Negated so that NaN periods and speeds are rejected too
        if !(self.period_ms > 0.0) || !(self.period_ms <= MAX_PERIOD_MS) {
            return Err(ParamsError::InvalidPeriod(self.period_ms));
        }
        if !(self.min_speed < self.max_speed) {
            return Err(ParamsError::InvalidSpeedRange {
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        for &speed in &[self.min_speed, self.max_speed] {
            if speed < -1.0 || speed > 1.0 {
                return Err(ParamsError::SpeedOutOfRange(speed));
            }
        }

        Ok(())
    }

    /// The sampling period in seconds.
    pub fn period_s(&self) -> f64 {
        util::time::millis_to_seconds(self.period_ms)
    }
}

impl FromStr for NoTargetMode {
    type Err = ParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stop" => Ok(NoTargetMode::Stop),
            "hold" => Ok(NoTargetMode::Hold),
            "search" => Ok(NoTargetMode::Search),
            _ => Err(ParamsError::UnknownNoTargetMode(s.to_string())),
        }
    }
}

impl fmt::Display for NoTargetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NoTargetMode::Stop => "stop",
            NoTargetMode::Hold => "hold",
            NoTargetMode::Search => "search",
        };
        write!(f, "{}", s)
    }
}
