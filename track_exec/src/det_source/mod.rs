//! # Detection Source
//!
//! The detection source captures frames from the video stream and runs the detection network on
//! them. Both calls block until they have a result.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod replay;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::det::{DetFrame, Detection, OverlayFlags};
use serde::{Deserialize, Serialize};

pub use replay::*;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of frames and the objects detected in them.
pub trait DetSource {
    /// Capture the next frame.
    ///
    /// Returns `Ok(None)` once the stream has ended.
    fn capture(&mut self) -> Result<Option<DetFrame>, DetSourceError>;

    /// Detect objects in the frame returned by the last call to `capture`.
    fn detect(&mut self, frame: &DetFrame) -> Result<Vec<Detection>, DetSourceError>;

    /// False once the stream has ended.
    fn is_streaming(&self) -> bool;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Configuration of the detection network, fixed at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectConfig {
    /// Name of the pre-trained detection network
    pub network: String,

    /// Minimum confidence of a detection to be reported
    pub threshold: f64,

    /// Elements drawn over the displayed frame
    pub overlay: OverlayFlags,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DetSourceError {
    #[error("Could not open the detection stream {0:?}: {1}")]
    OpenError(std::path::PathBuf, std::io::Error),

    #[error("Could not read from the detection stream: {0}")]
    ReadError(std::io::Error),

    #[error("Could not parse line {0} of the detection stream: {1}")]
    ParseError(usize, serde_json::Error),

    #[error("Detection was requested without a captured frame")]
    NoFrameCaptured,

    #[error("The detection threshold must be between 0 and 1, found {0}")]
    InvalidThreshold(f64),

    #[error("No detection network given")]
    NoNetwork,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            network: String::from("ssd-mobilenet-v2"),
            threshold: 0.5,
            overlay: OverlayFlags {
                bbox: true,
                labels: true,
                conf: true,
            },
        }
    }
}

impl DetectConfig {
    pub fn validate(&self) -> Result<(), DetSourceError> {
        if !(self.threshold >= 0.0 && self.threshold <= 1.0) {
            return Err(DetSourceError::InvalidThreshold(self.threshold));
        }
        if self.network.trim().is_empty() {
            return Err(DetSourceError::NoNetwork);
        }

        Ok(())
    }
}

impl<S: DetSource + ?Sized> DetSource for Box<S> {
    fn capture(&mut self) -> Result<Option<DetFrame>, DetSourceError> {
        (**self).capture()
    }

    fn detect(&mut self, frame: &DetFrame) -> Result<Vec<Detection>, DetSourceError> {
        (**self).detect(frame)
    }

    fn is_streaming(&self) -> bool {
        (**self).is_streaming()
    }
}
