//! # Communications interface crate.
//!
//! Provides the interfaces shared between the tracking core and the equipment it drives or reads
//! from (detection source, wheel motors).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Data definitions for equipment (detection source, motors)
pub mod eqpt;
