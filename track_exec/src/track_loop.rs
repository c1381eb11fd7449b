//! # Tracking loop
//!
//! A fixed period sampling loop. While the sampling period has not elapsed since the last sample
//! the loop waits. Once it has, the loop runs one cycle:
//!
//! - capture a frame and detect the objects in it
//! - select the target and compute the PD wheel speeds (`TrackCtrl`)
//! - send the speeds to the motors
//!
//! The loop ends when the detection source reports the end of the stream, after which the motors
//! are stopped. Any source or motor error is fatal, the motors are stopped as well as possible
//! and the error is returned.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, error, info, warn};

use crate::{
    clock::Clock,
    det_source::{DetSource, DetSourceError},
    mot_driver::{MotorDriver, MotorError},
    track_ctrl::{InputData, TrackCtrl, TrackCtrlError},
};
use util::{archive::Archived, module::State};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The tracking loop and everything it owns.
pub struct TrackLoop<S, M, C> {
    source: S,
    motors: M,
    clock: C,
    ctrl: TrackCtrl,
    summary: LoopSummary,
}

/// Statistics of a finished loop.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopSummary {
    /// Number of cycles executed
    pub num_cycles: u64,

    /// Number of executed cycles in which no target was found
    pub num_no_target: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TrackLoopError {
    #[error("Detection source failure: {0}")]
    SourceFailure(#[from] DetSourceError),

    #[error("Motor driver failure: {0}")]
    MotorFailure(#[from] MotorError),

    #[error("Tracking controller error: {0}")]
    CtrlError(#[from] TrackCtrlError),
}

/// What happened in one cycle.
enum CycleOutcome {
    Continue,
    EndOfStream,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<S, M, C> TrackLoop<S, M, C>
where
    S: DetSource,
    M: MotorDriver,
    C: Clock,
{
    /// Create a new loop. `ctrl` must already be initialised.
    pub fn new(source: S, motors: M, clock: C, ctrl: TrackCtrl) -> Self {
        Self {
            source,
            motors,
            clock,
            ctrl,
            summary: LoopSummary::default(),
        }
    }

    /// Run the loop until the end of the detection stream.
    pub fn run(&mut self) -> Result<LoopSummary, TrackLoopError> {
        self.ctrl.start(self.clock.now_ms());

        loop {
            // ---- WAITING ----

            let now_ms = self.clock.now_ms();
            if !self.ctrl.is_due(now_ms) {
                self.clock.sleep_ms(self.ctrl.time_until_due(now_ms));
                continue;
            }

            // ---- SAMPLING ----

            // Missed periods are dropped, not caught up
            let period_ms = self.ctrl.params().period_ms;
            let late_ms = now_ms - self.ctrl.ctrl_state().last_sample_ms - period_ms;
            if late_ms >= period_ms {
                warn!(
                    "Cycle overrun: sample is {:.0} ms late, skipping {} period(s)",
                    late_ms,
                    (late_ms / period_ms).floor()
                );
            }

            match self.cycle(now_ms) {
                Ok(CycleOutcome::Continue) => (),
                Ok(CycleOutcome::EndOfStream) => break,
                Err(e) => {
                    error!("Tracking loop failed: {}", e);
                    self.stop_motors();
                    return Err(e);
                }
            }

            if !self.source.is_streaming() {
                break;
            }
        }

        info!(
            "Detection stream ended after {} cycles ({} without a target), stopping motors",
            self.summary.num_cycles, self.summary.num_no_target
        );
        self.motors.stop()?;

        Ok(self.summary)
    }

    /// Execute one sampling cycle.
    ///
    /// `now_ms` is the clock reading taken before capture, so capture and inference time counts
    /// towards the next period.
    fn cycle(&mut self, now_ms: f64) -> Result<CycleOutcome, TrackLoopError> {
        let frame = match self.source.capture()? {
            Some(f) => f,
            None => return Ok(CycleOutcome::EndOfStream),
        };

        let detections = self.source.detect(&frame)?;

        info!("detected {} objects in image", detections.len());

        let (dems, report) = self.ctrl.proc(&InputData {
            now_ms,
            frame,
            detections,
        })?;

        self.summary.num_cycles += 1;

        if report.target_found {
            info!("gain: {:.4} error (pixels): {:.1}", report.gain, report.error_px);
        } else {
            self.summary.num_no_target += 1;
            warn!(
                "No target in frame, applying the {} fallback",
                self.ctrl.params().no_target_mode
            );
        }

        if let Err(e) = self.ctrl.write() {
            warn!("Could not archive the TrackCtrl report: {}", e);
        }

        self.motors.set_speeds(&dems)?;
        debug!("Motors set to left {:.3}, right {:.3}", dems.left, dems.right);

        Ok(CycleOutcome::Continue)
    }

    /// Best effort stop, used on the failure path.
    fn stop_motors(&mut self) {
        match self.motors.stop() {
            Ok(_) => info!("Motors stopped"),
            Err(e) => error!("Could not stop the motors: {}", e),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn motors(&self) -> &M {
        &self.motors
    }

    pub fn ctrl(&self) -> &TrackCtrl {
        &self.ctrl
    }

    /// Consume the loop returning the source and motors.
    pub fn into_parts(self) -> (S, M) {
        (self.source, self.motors)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
