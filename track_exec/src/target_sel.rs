//! # Target selection
//!
//! Each cycle the target is chosen from scratch, there is no association of targets between
//! frames.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::det::{ClassId, DetFrame, Detection};
use log::debug;
use std::cmp::Ordering;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Result of target selection for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    /// The detection to track
    Found(Detection),

    /// None of the frame's detections are of the tracked class
    NoTarget,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Target {
    pub fn detection(&self) -> Option<&Detection> {
        match self {
            Target::Found(d) => Some(d),
            Target::NoTarget => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Target::Found(_))
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Select the detection of `track_class` whose centre is horizontally closest to the middle of
/// the frame.
///
/// If several detections are equally close the first one in `detections` wins. Detections with a
/// non-finite centre are ignored.
pub fn select_target(detections: &[Detection], frame: &DetFrame, track_class: ClassId) -> Target {
    let mid_x = frame.mid_x();

    let best = detections
        .iter()
        .filter(|d| d.class_id == track_class)
        .filter(|d| {
            let finite = d.center().0.is_finite();
            if !finite {
                debug!("Ignoring detection with non-finite centre: {:?}", d);
            }
            finite
        })
        .map(|d| (d, (d.center().0 - mid_x).abs()))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    match best {
        Some((d, _)) => Target::Found(*d),
        None => Target::NoTarget,
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::det::{BoundingBox, PERSON_CLASS_ID};

    fn det(class_id: u32, center_x: f64) -> Detection {
        Detection {
            class_id: ClassId(class_id),
            confidence: 0.9,
            bbox: BoundingBox {
                left: center_x - 20.0,
                top: 100.0,
                right: center_x + 20.0,
                bottom: 300.0,
            },
        }
    }

    #[test]
    fn test_closest_to_center() {
        let frame = DetFrame::new(1280, 720);

        let dets = vec![det(1, 640.0 + 50.0), det(1, 640.0 - 10.0), det(1, 640.0 + 200.0)];

        let target = select_target(&dets, &frame, PERSON_CLASS_ID);
        assert_eq!(target, Target::Found(dets[1]));
        assert_eq!(target.detection().unwrap().center().0, 630.0);
    }

    #[test]
    fn test_other_classes_ignored() {
        let frame = DetFrame::new(1280, 720);

        // A dog right in the middle, a person off to the side
        let dets = vec![det(18, 640.0), det(1, 900.0)];

        assert_eq!(select_target(&dets, &frame, PERSON_CLASS_ID), Target::Found(dets[1]));
        assert_eq!(select_target(&dets, &frame, ClassId(18)), Target::Found(dets[0]));
    }

    #[test]
    fn test_no_target() {
        let frame = DetFrame::new(1280, 720);

        assert_eq!(select_target(&[], &frame, PERSON_CLASS_ID), Target::NoTarget);
        assert_eq!(
            select_target(&[det(3, 640.0), det(62, 10.0)], &frame, PERSON_CLASS_ID),
            Target::NoTarget
        );
        assert!(!Target::NoTarget.is_found());
    }

    #[test]
    fn test_tie_takes_first() {
        let frame = DetFrame::new(1280, 720);

        let mut left = det(1, 600.0);
        left.confidence = 0.6;
        let right = det(1, 680.0);

        assert_eq!(select_target(&[left, right], &frame, PERSON_CLASS_ID), Target::Found(left));
        assert_eq!(select_target(&[right, left], &frame, PERSON_CLASS_ID), Target::Found(right));
    }

    #[test]
    fn test_non_finite_ignored() {
        let frame = DetFrame::new(1280, 720);

        let bad = det(1, std::f64::NAN);
        let good = det(1, 1000.0);

        assert_eq!(select_target(&[bad, good], &frame, PERSON_CLASS_ID), Target::Found(good));
        assert_eq!(select_target(&[bad], &frame, PERSON_CLASS_ID), Target::NoTarget);
    }
}
