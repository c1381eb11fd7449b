//! Utility library for the TrackBud software

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod archive;
pub mod host;
pub mod logger;
pub mod maths;
pub mod module;
pub mod params;
pub mod session;
pub mod time;

// ---------------------------------------------------------------------------
// REEXPORTS
// ---------------------------------------------------------------------------

pub use comms_if;
