//! # Motor Equipment Communications Module

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Speed demands for the two differential drive wheels.
///
/// Units: normalised, `0.0` is stopped and `1.0` is full speed forward.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Default)]
pub struct MotorDems {
    /// Left wheel speed
    pub left: f64,

    /// Right wheel speed
    pub right: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Identifies one of the two drive motors.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Hash, Eq, PartialEq)]
pub enum MotorId {
    Left,
    Right,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotorDems {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    /// The neutral command, both wheels stopped.
    pub fn stop() -> Self {
        Self::default()
    }

    pub fn is_stop(&self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }
}
