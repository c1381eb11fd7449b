//! # Motor Driver Module
//!
//! This module provides a unified interface to the two drive motors which can abstract over the
//! hardware actually fitted.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Adafruit Motor HAT driver
pub mod hat;

/// [`PwmBoard`] implementation for the PCA9685 16 channel PWM driver.
pub mod pca9685;

/// Simulated motors for bench testing
pub mod sim;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::mot::{MotorDems, MotorId};

pub use hat::{HatMotors, HatParams};
pub use sim::SimMotors;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for driving the wheel motors.
///
/// Each motor is set independently, the last speed written to a motor is the one it runs at.
pub trait MotorDriver {
    /// Set the speed of one motor.
    ///
    /// ## Arguments
    /// - `motor` - The motor to set
    /// - `speed` - Normalised speed between -1.0 (full reverse) and 1.0 (full forward), values
    ///   outside this range are rejected.
    fn set_speed(&mut self, motor: MotorId, speed: f64) -> Result<(), MotorError>;

    fn set_left_speed(&mut self, speed: f64) -> Result<(), MotorError> {
        self.set_speed(MotorId::Left, speed)
    }

    fn set_right_speed(&mut self, speed: f64) -> Result<(), MotorError> {
        self.set_speed(MotorId::Right, speed)
    }

    /// Set both motors from a demand.
    fn set_speeds(&mut self, dems: &MotorDems) -> Result<(), MotorError> {
        self.set_left_speed(dems.left)?;
        self.set_right_speed(dems.right)
    }

    /// Stop both motors.
    fn stop(&mut self) -> Result<(), MotorError> {
        self.set_speeds(&MotorDems::stop())
    }
}

/// Trait to provide a unified API for accessing PWM driver boards.
pub trait PwmBoard {
    /// Set the duty cycle of a channel.
    ///
    /// ## Arguments
    /// - `channel` - The channel to set the duty cycle for
    /// - `duty_cycle` - The duty cycle to set. Must be a value between 0.0 and 1.0. Values
    ///   outside this range will be rejected.
    fn set_duty_cycle(&mut self, channel: u8, duty_cycle: f64) -> Result<(), PwmError>;

    /// Drive a channel fully on or fully off, for use as a digital pin.
    fn set_pin(&mut self, channel: u8, high: bool) -> Result<(), PwmError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum PwmError {
    #[error("An I2C error occured")]
    I2c,

    #[error("Duty cycle must be between 0.0 and 1.0, found {0}")]
    InvalidDutyCycle(f64),

    #[error("The board has no channel {0}")]
    InvalidChannel(u8),
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum MotorError {
    #[error("Speed must be between -1.0 and 1.0, found {1} for the {0:?} motor")]
    InvalidSpeed(MotorId, f64),

    #[error("PWM board error on the {0:?} motor: {1}")]
    Pwm(MotorId, PwmError),

    #[error("Could not open the motor driver: {0}")]
    OpenError(String),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Check a speed demand is in the driver's range.
pub(crate) fn check_speed(motor: MotorId, speed: f64) -> Result<(), MotorError> {
    if speed >= -1.0 && speed <= 1.0 {
        Ok(())
    } else {
        Err(MotorError::InvalidSpeed(motor, speed))
    }
}
