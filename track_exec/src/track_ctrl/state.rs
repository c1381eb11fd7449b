//! Implementations for the TrackCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::eqpt::{
    det::{DetFrame, Detection},
    mot::MotorDems,
};
use log::trace;
use serde::Serialize;

// Internal
use super::{NoTargetMode, Params, TrackCtrlError, BASE_SPEED};
use crate::target_sel::{select_target, Target};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    maths::clamp,
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tracking control module state
#[derive(Default)]
pub struct TrackCtrl {
    pub(crate) params: Params,

    pub(crate) state: CtrlState,

    /// Last output computed from a target, used by the hold fallback.
    last_target_output: Option<OutputData>,

    pub(crate) report: StatusReport,
    arch_report: Archiver,
}

/// The part of the controller's state which carries over between cycles.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct CtrlState {
    /// Clock reading at which the last sample was taken.
    ///
    /// Units: milliseconds
    pub last_sample_ms: f64,

    /// Error computed on the last cycle that had a target.
    ///
    /// Units: pixels
    pub last_error: f64,
}

/// Input data to Tracking Control.
#[derive(Debug, Clone)]
pub struct InputData {
    /// Clock reading taken just before the frame was captured.
    ///
    /// Units: milliseconds
    pub now_ms: f64,

    /// The frame the detections were found in
    pub frame: DetFrame,

    /// All detections in the frame
    pub detections: Vec<Detection>,
}

/// Output of TrackCtrl, the wheel speeds the motors must be set to.
pub type OutputData = MotorDems;

/// Status report for TrackCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct StatusReport {
    /// Clock reading of the sample
    pub time_ms: f64,

    /// Number of detections in the frame
    pub num_detections: usize,

    /// True if a target was found
    pub target_found: bool,

    /// Horizontal offset of the target from the frame centre, positive to the right.
    ///
    /// Units: pixels
    pub error_px: f64,

    /// Rate of change of the error.
    ///
    /// Units: pixels/second
    pub deriv_pxs: f64,

    /// Steering gain `K`
    pub gain: f64,

    /// Demanded left wheel speed
    pub left_speed: f64,

    /// Demanded right wheel speed
    pub right_speed: f64,

    /// True if the left speed was limited to the speed range
    pub left_limited: bool,

    /// True if the right speed was limited to the speed range
    pub right_limited: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for TrackCtrl {
    type InitData = Params;
    type InitError = TrackCtrlError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = TrackCtrlError;

    /// Initialise the TrackCtrl module.
    ///
    /// Expected init data is the controller parameters. If a session is given the status report
    /// of each cycle is archived in it.
    fn init(
        &mut self,
        init_data: Self::InitData,
        session: Option<&Session>,
    ) -> Result<(), Self::InitError> {
        init_data.validate()?;

        self.params = init_data;
        self.state = CtrlState::default();
        self.last_target_output = None;

        if let Some(session) = session {
            self.arch_report = Archiver::from_path(session, "track_ctrl/status_report.csv")?;
        }

        Ok(())
    }

    /// Perform cyclic processing of Tracking Control.
    ///
    /// Must only be called once the sampling period has elapsed since the last sample, see
    /// `is_due`.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        if !self.is_due(input_data.now_ms) {
            return Err(TrackCtrlError::NotDue {
                elapsed_ms: input_data.now_ms - self.state.last_sample_ms,
                period_ms: self.params.period_ms,
            });
        }

        self.report = StatusReport {
            time_ms: input_data.now_ms,
            num_detections: input_data.detections.len(),
            ..Default::default()
        };

        let target = select_target(
            &input_data.detections,
            &input_data.frame,
            self.params.track_class,
        );

        if let Some(det) = target.detection() {
            trace!(
                "Target class {} at x {:.1} px, box {:.0}x{:.0} px",
                det.class_id,
                det.center().0,
                det.bbox.width(),
                det.bbox.height()
            );
        }

        let output = match target {
            Target::Found(det) => {
                let output = self.calc_steering(det.center().0 - input_data.frame.mid_x());
                self.last_target_output = Some(output);
                output
            }
            Target::NoTarget => self.calc_no_target(),
        };

        self.state.last_sample_ms = input_data.now_ms;

        self.report.target_found = target.is_found();
        self.report.left_speed = output.left;
        self.report.right_speed = output.right;

        trace!(
            "TrackCtrl output: left {:.3}, right {:.3}",
            output.left,
            output.right
        );

        Ok((output, self.report))
    }
}

impl Archived for TrackCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_report.serialise(self.report)
    }
}

impl TrackCtrl {
    /// Create a new controller with the given parameters, without archiving.
    pub fn new(params: Params) -> Result<Self, TrackCtrlError> {
        let mut ctrl = Self::default();
        ctrl.init(params, None)?;
        Ok(ctrl)
    }

    /// Mark the start of sampling, the first sample is due one period after `now_ms`.
    pub fn start(&mut self, now_ms: f64) {
        self.state.last_sample_ms = now_ms;
    }

    /// True if a full sampling period has elapsed since the last sample.
    pub fn is_due(&self, now_ms: f64) -> bool {
        now_ms - self.state.last_sample_ms >= self.params.period_ms
    }

    /// Milliseconds left until the next sample is due, zero if it already is.
    pub fn time_until_due(&self, now_ms: f64) -> f64 {
        (self.state.last_sample_ms + self.params.period_ms - now_ms).max(0.0)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn ctrl_state(&self) -> CtrlState {
        self.state
    }

    /// Compute the wheel speeds for the given target error.
    ///
    /// The derivative uses the nominal sampling period rather than the measured time between
    /// samples.
    fn calc_steering(&mut self, error: f64) -> OutputData {
        let deriv = (error - self.state.last_error) / self.params.period_s();
        let gain = self.params.k_p * error + self.params.k_d * deriv;

        let left_raw = BASE_SPEED + gain;
        let right_raw = BASE_SPEED - gain;
        let left = clamp(left_raw, self.params.min_speed, self.params.max_speed);
        let right = clamp(right_raw, self.params.min_speed, self.params.max_speed);

        self.state.last_error = error;

        self.report.error_px = error;
        self.report.deriv_pxs = deriv;
        self.report.gain = gain;
        self.report.left_limited = left != left_raw;
        self.report.right_limited = right != right_raw;

        MotorDems::new(left, right)
    }

    /// Compute the fallback output for a cycle without a target.
    ///
    /// The last error is kept so that the derivative picks up from the last seen target.
    fn calc_no_target(&self) -> OutputData {
        match self.params.no_target_mode {
            NoTargetMode::Stop => MotorDems::stop(),
            NoTargetMode::Hold => self.last_target_output.unwrap_or_else(MotorDems::stop),
            NoTargetMode::Search => {
                if self.state.last_error >= 0.0 {
                    MotorDems::new(self.params.max_speed, self.params.min_speed)
                } else {
                    MotorDems::new(self.params.min_speed, self.params.max_speed)
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::det::{BoundingBox, ClassId, PERSON_CLASS_ID};

    const WIDTH: u32 = 1280;

    fn person_at(center_x: f64) -> Detection {
        Detection {
            class_id: PERSON_CLASS_ID,
            confidence: 0.8,
            bbox: BoundingBox {
                left: center_x - 30.0,
                top: 200.0,
                right: center_x + 30.0,
                bottom: 500.0,
            },
        }
    }

    fn input(now_ms: f64, detections: Vec<Detection>) -> InputData {
        InputData {
            now_ms,
            frame: DetFrame::new(WIDTH, 720),
            detections,
        }
    }

    /// Input with a single person at the given error from the centre.
    fn input_err(now_ms: f64, error: f64) -> InputData {
        input(now_ms, vec![person_at(WIDTH as f64 / 2.0 + error)])
    }

    fn ctrl(params: Params) -> TrackCtrl {
        let mut c = TrackCtrl::new(params).unwrap();
        c.start(0.0);
        c
    }

    #[test]
    fn test_zero_error_is_base_speed() {
        let mut c = ctrl(Params::default());

        let (out, rpt) = c.proc(&input_err(500.0, 0.0)).unwrap();
        assert_eq!(out, MotorDems::new(0.5, 0.5));
        assert_eq!(rpt.gain, 0.0);

        let (out, rpt) = c.proc(&input_err(1000.0, 0.0)).unwrap();
        assert_eq!(out, MotorDems::new(0.5, 0.5));
        assert_eq!(rpt.gain, 0.0);
        assert!(!rpt.left_limited && !rpt.right_limited);
    }

    #[test]
    fn test_base_speed_outside_range_is_clamped() {
        let mut c = ctrl(Params {
            min_speed: 0.6,
            max_speed: 0.9,
            ..Default::default()
        });

        let (out, _) = c.proc(&input_err(500.0, 0.0)).unwrap();
        assert_eq!(out, MotorDems::new(0.6, 0.6));
    }

    #[test]
    fn test_derivative() {
        let k_p = 0.003;
        let k_d = 0.0005;
        let mut c = ctrl(Params {
            k_p,
            k_d,
            period_ms: 500.0,
            ..Default::default()
        });

        let (_, rpt) = c.proc(&input_err(500.0, 10.0)).unwrap();
        assert_eq!(rpt.error_px, 10.0);
        assert_eq!(rpt.deriv_pxs, 20.0);

        let (out, rpt) = c.proc(&input_err(1000.0, 20.0)).unwrap();
        assert_eq!(rpt.error_px, 20.0);
        assert_eq!(rpt.deriv_pxs, 20.0);

        let gain = k_p * 20.0 + k_d * 20.0;
        assert!((rpt.gain - gain).abs() < 1e-12);
        assert!((out.left - (0.5 + gain)).abs() < 1e-12);
        assert!((out.right - (0.5 - gain)).abs() < 1e-12);
        assert_eq!(c.ctrl_state().last_error, 20.0);
    }

    #[test]
    fn test_target_right_turns_right() {
        let mut c = ctrl(Params {
            k_p: 0.001,
            k_d: 0.0,
            ..Default::default()
        });

        let (out, _) = c.proc(&input_err(500.0, 100.0)).unwrap();
        assert!(out.left > out.right);

        let (out, _) = c.proc(&input_err(1000.0, -100.0)).unwrap();
        assert!(out.left < out.right);
    }

    #[test]
    fn test_speeds_always_in_range() {
        let errors = [0.0, 1.0, -1.0, 640.0, -640.0, 1e6, -1e6, 1e300, -1e300, 3.5, -0.25];
        let gains = [(0.1, 0.01), (0.0, 0.0), (1e3, 1e3), (-0.5, 0.2), (0.001, -5.0)];

        for &(k_p, k_d) in gains.iter() {
            let params = Params {
                k_p,
                k_d,
                period_ms: 50.0,
                min_speed: 0.25,
                max_speed: 0.75,
                ..Default::default()
            };
            let mut c = ctrl(params.clone());

            for (i, &e) in errors.iter().enumerate() {
                let now = 50.0 * (i + 1) as f64;
                let (out, _) = c.proc(&input_err(now, e)).unwrap();

                assert!(
                    out.left >= params.min_speed && out.left <= params.max_speed,
                    "left {} out of range for error {} and gains ({}, {})",
                    out.left, e, k_p, k_d
                );
                assert!(
                    out.right >= params.min_speed && out.right <= params.max_speed,
                    "right {} out of range for error {} and gains ({}, {})",
                    out.right, e, k_p, k_d
                );
            }
        }
    }

    #[test]
    fn test_limit_flags() {
        let mut c = ctrl(Params::default());

        // Default gains saturate on any sizable error
        let (out, rpt) = c.proc(&input_err(500.0, 300.0)).unwrap();
        assert_eq!(out, MotorDems::new(0.8, 0.2));
        assert!(rpt.left_limited && rpt.right_limited);
    }

    #[test]
    fn test_gate() {
        let mut c = ctrl(Params::default());
        c.start(1000.0);

        assert!(!c.is_due(1499.9));
        assert_eq!(c.time_until_due(1200.0), 300.0);
        match c.proc(&input_err(1499.9, 0.0)) {
            Err(TrackCtrlError::NotDue { .. }) => (),
            r => panic!("Expected NotDue, got {:?}", r),
        }

        // Exactly one period triggers a sample
        assert!(c.is_due(1500.0));
        assert!(c.proc(&input_err(1500.0, 0.0)).is_ok());
        assert_eq!(c.ctrl_state().last_sample_ms, 1500.0);
        assert!(!c.is_due(1999.0));

        // A long stall is a single late sample, the next is due a period after it
        assert!(c.is_due(5000.0));
        assert!(c.proc(&input_err(5000.0, 0.0)).is_ok());
        assert!(!c.is_due(5499.0));
        assert_eq!(c.time_until_due(5600.0), 0.0);
    }

    #[test]
    fn test_no_target_stop() {
        let mut c = ctrl(Params::default());

        c.proc(&input_err(500.0, 40.0)).unwrap();

        let dog = Detection {
            class_id: ClassId(18),
            ..person_at(640.0)
        };
        let (out, rpt) = c.proc(&input(1000.0, vec![dog])).unwrap();
        assert!(out.is_stop());
        assert!(!rpt.target_found);
        assert_eq!(rpt.num_detections, 1);

        // The last error is kept, the sample time moves on
        assert_eq!(c.ctrl_state().last_error, 40.0);
        assert_eq!(c.ctrl_state().last_sample_ms, 1000.0);

        let (out, _) = c.proc(&input(1500.0, vec![])).unwrap();
        assert!(out.is_stop());
    }

    #[test]
    fn test_no_target_hold() {
        let mut c = ctrl(Params {
            k_p: 0.001,
            k_d: 0.0,
            no_target_mode: NoTargetMode::Hold,
            ..Default::default()
        });

        // Nothing to hold yet
        let (out, _) = c.proc(&input(500.0, vec![])).unwrap();
        assert!(out.is_stop());

        let (tracked, _) = c.proc(&input_err(1000.0, 100.0)).unwrap();
        let (out, _) = c.proc(&input(1500.0, vec![])).unwrap();
        assert_eq!(out, tracked);
    }

    #[test]
    fn test_no_target_search() {
        let params = Params {
            k_p: 0.001,
            k_d: 0.0,
            no_target_mode: NoTargetMode::Search,
            ..Default::default()
        };
        let mut c = ctrl(params.clone());

        // Never seen, search to the right
        let (out, _) = c.proc(&input(500.0, vec![])).unwrap();
        assert_eq!(out, MotorDems::new(params.max_speed, params.min_speed));

        // Last seen on the left
        c.proc(&input_err(1000.0, -50.0)).unwrap();
        let (out, _) = c.proc(&input(1500.0, vec![])).unwrap();
        assert_eq!(out, MotorDems::new(params.min_speed, params.max_speed));
    }

    #[test]
    fn test_init_rejects_invalid_params() {
        let mut c = TrackCtrl::default();
        let res = c.init(
            Params {
                min_speed: 0.9,
                max_speed: 0.1,
                ..Default::default()
            },
            None,
        );

        match res {
            Err(TrackCtrlError::InvalidParams(_)) => (),
            r => panic!("Expected invalid params, got {:?}", r),
        }
    }

    #[test]
    fn test_archive_report() {
        let root = std::env::temp_dir().join("track_ctrl_archive_test");
        let session = Session::in_root(&root, "track_test", "sessions").unwrap();

        let mut c = TrackCtrl::default();
        c.init(Params::default(), Some(&session)).unwrap();
        c.start(0.0);

        c.proc(&input_err(500.0, 0.0)).unwrap();
        c.write().unwrap();
        c.proc(&input(1000.0, vec![])).unwrap();
        c.write().unwrap();

        let csv = std::fs::read_to_string(
            session.arch_root.join("track_ctrl/status_report.csv")
        ).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("time_ms,num_detections,target_found"));
        assert!(lines[1].starts_with("500.0,1,true"));
        assert!(lines[2].starts_with("1000.0,0,false"));

        std::fs::remove_dir_all(root).ok();
    }
}
