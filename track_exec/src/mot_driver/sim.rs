//! Simulated motors
//!
//! Records every command it is given instead of driving hardware. Used when running against a
//! recorded detection stream on a machine with no motors, and in tests.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::mot::{MotorDems, MotorId};
use log::trace;

use super::{check_speed, MotorDriver, MotorError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct SimMotors {
    /// Speed each motor is currently running at
    current: MotorDems,

    /// Every individual motor command received, in order
    history: Vec<(MotorId, f64)>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimMotors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Speeds the motors are currently running at.
    pub fn current(&self) -> MotorDems {
        self.current
    }

    /// All commands received so far.
    pub fn history(&self) -> &[(MotorId, f64)] {
        &self.history
    }

    /// The commands received grouped into left/right pairs.
    ///
    /// Only complete pairs, a left command followed by a right command, are returned.
    pub fn dems_history(&self) -> Vec<MotorDems> {
        self.history
            .windows(2)
            .filter_map(|w| match (w[0], w[1]) {
                ((MotorId::Left, l), (MotorId::Right, r)) => Some(MotorDems::new(l, r)),
                _ => None,
            })
            .collect()
    }
}

impl MotorDriver for SimMotors {
    fn set_speed(&mut self, motor: MotorId, speed: f64) -> Result<(), MotorError> {
        check_speed(motor, speed)?;

        match motor {
            MotorId::Left => self.current.left = speed,
            MotorId::Right => self.current.right = speed,
        }
        self.history.push((motor, speed));

        trace!("Sim {:?} motor set to {:.3}", motor, speed);

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let mut m = SimMotors::new();

        m.set_speeds(&MotorDems::new(0.3, 0.7)).unwrap();
        m.set_left_speed(0.4).unwrap();
        assert_eq!(m.current(), MotorDems::new(0.4, 0.7));

        m.stop().unwrap();
        assert!(m.current().is_stop());
        assert_eq!(
            m.dems_history(),
            vec![MotorDems::new(0.3, 0.7), MotorDems::stop()]
        );
    }

    #[test]
    fn test_rejects_out_of_range() {
        let mut m = SimMotors::new();

        assert_eq!(
            m.set_right_speed(1.5),
            Err(MotorError::InvalidSpeed(MotorId::Right, 1.5))
        );
        assert!(m.set_left_speed(std::f64::NAN).is_err());
        assert!(m.history().is_empty());
    }
}
