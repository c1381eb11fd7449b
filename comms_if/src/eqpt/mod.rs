//! # Equipment Interface
//!
//! This module defines the interface structures which are exchanged with equipment.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod det;
pub mod mot;
