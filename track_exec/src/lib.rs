//! # Tracking library.
//!
//! Visual tracking controller for a small differential drive robot. Each cycle a frame and its
//! detections are taken from the detection source, the person closest to the centre of the frame
//! is selected, and a PD controller on that person's horizontal offset steers the robot by
//! setting the left and right wheel speeds.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command line configuration surface of the executable
pub mod cli;

/// Monotonic clocks used to gate the sampling of the controller
pub mod clock;

/// Detection source - provides frames and the objects detected in them
pub mod det_source;

/// Motor driver - actuates the left and right wheel speed demands
pub mod mot_driver;

/// Target selection - picks the detection to track from a frame's detections
pub mod target_sel;

/// Tracking control module - PD steering on the target's offset from the frame centre
pub mod track_ctrl;

/// Fixed period tracking loop tying the source, controller and motors together
pub mod track_loop;
