//! # Detection Equipment Communications Module
//!
//! Types produced by the object detection source on every cycle. All of these are ephemeral, a
//! fresh set is produced for each captured frame and dropped once the cycle's control output has
//! been computed.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Class identifier of a person in the COCO label map used by the SSD detection networks.
pub const PERSON_CLASS_ID: ClassId = ClassId(1);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Identifier of a detected object's class, as given by the detection network's label map.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct ClassId(pub u32);

/// Axis aligned bounding box of a detection.
///
/// Units: pixels,
/// Frame: image, origin top left, x to the right, y down
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// A single object found in a frame.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq)]
pub struct Detection {
    /// Class of the detected object
    pub class_id: ClassId,

    /// Confidence score of the detection, between 0 and 1
    pub confidence: f64,

    /// Bounding box of the object in the frame
    pub bbox: BoundingBox,
}

/// A frame acquired from the video source.
///
/// Only the geometry of the frame is needed by the tracking controller, the pixel data stays with
/// the detection source.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq)]
pub struct DetFrame {
    /// UTC timestamp at which the frame was acquired
    #[serde(with = "ts_milliseconds", default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Width of the frame
    ///
    /// Units: pixels
    pub width: u32,

    /// Height of the frame
    ///
    /// Units: pixels
    pub height: u32,
}

/// Which elements the detection source draws over the frame it displays.
///
/// These are cosmetic only and have no effect on control.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Default)]
pub struct OverlayFlags {
    pub bbox: bool,
    pub labels: bool,
    pub conf: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum OverlayParseError {
    #[error("Unknown overlay flag \"{0}\", valid flags are 'box', 'labels', 'conf' and 'none'")]
    UnknownFlag(String),

    #[error("The 'none' overlay flag cannot be combined with other flags")]
    NoneCombined,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Centre point of the box as `(x, y)`.
    pub fn center(&self) -> (f64, f64) {
        (
            0.5 * (self.left + self.right),
            0.5 * (self.top + self.bottom),
        )
    }
}

impl Detection {
    /// Centre point of the detection's bounding box as `(x, y)`.
    pub fn center(&self) -> (f64, f64) {
        self.bbox.center()
    }
}

impl DetFrame {
    /// Create a frame of the given size acquired now.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            timestamp: Utc::now(),
            width,
            height,
        }
    }

    /// Horizontal midpoint of the frame.
    ///
    /// Units: pixels
    pub fn mid_x(&self) -> f64 {
        self.width as f64 / 2.0
    }
}

impl OverlayFlags {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        !(self.bbox || self.labels || self.conf)
    }
}

impl FromStr for OverlayFlags {
    type Err = OverlayParseError;

    /// Parse a comma separated list of flags, for example `box,labels,conf`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = OverlayFlags::none();
        let mut saw_none = false;
        let mut saw_other = false;

        for token in s.split(',').map(|t| t.trim()).filter(|t| !t.is_empty()) {
            match token.to_lowercase().as_str() {
                "box" => flags.bbox = true,
                "labels" => flags.labels = true,
                "conf" => flags.conf = true,
                "none" => {
                    saw_none = true;
                    continue;
                }
                _ => return Err(OverlayParseError::UnknownFlag(token.to_string())),
            }

            saw_other = true;
        }

        if saw_none && saw_other {
            return Err(OverlayParseError::NoneCombined);
        }

        Ok(flags)
    }
}

impl fmt::Display for OverlayFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "none");
        }

        let mut tokens = vec![];
        if self.bbox {
            tokens.push("box");
        }
        if self.labels {
            tokens.push("labels");
        }
        if self.conf {
            tokens.push("conf");
        }

        write!(f, "{}", tokens.join(","))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bbox_center() {
        let bbox = BoundingBox {
            left: 100.0,
            top: 50.0,
            right: 300.0,
            bottom: 250.0,
        };

        assert_eq!(bbox.center(), (200.0, 150.0));
        assert_eq!(bbox.width(), 200.0);
        assert_eq!(bbox.height(), 200.0);
    }

    #[test]
    fn test_overlay_parse() {
        let flags: OverlayFlags = "box,labels,conf".parse().unwrap();
        assert!(flags.bbox && flags.labels && flags.conf);
        assert_eq!(flags.to_string(), "box,labels,conf");

        let flags: OverlayFlags = "labels".parse().unwrap();
        assert!(!flags.bbox && flags.labels && !flags.conf);

        let flags: OverlayFlags = "none".parse().unwrap();
        assert!(flags.is_none());
        assert_eq!(flags.to_string(), "none");

        let flags: OverlayFlags = "None".parse().unwrap();
        assert!(flags.is_none());

        assert_eq!(
            "box,outline".parse::<OverlayFlags>(),
            Err(OverlayParseError::UnknownFlag("outline".into()))
        );
        assert_eq!(
            "none,box".parse::<OverlayFlags>(),
            Err(OverlayParseError::NoneCombined)
        );
    }

    #[test]
    fn test_frame_json() {
        let frame: DetFrame = serde_json::from_str(r#"{"width": 1280, "height": 720}"#).unwrap();
        assert_eq!(frame.mid_x(), 640.0);
        assert_eq!(frame.height, 720);
    }
}
