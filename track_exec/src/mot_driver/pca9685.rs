//! [`PwmBoard`] implementation for the PCA9685 driver

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use embedded_hal::blocking::i2c::{Write, WriteRead};
use pwm_pca9685::{Channel, Pca9685};
use util::maths::lin_map;

use super::{HatMotors, HatParams, MotorError, PwmBoard, PwmError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Largest value of the on/off counters.
const MAX_PWM: u16 = 4095;

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// PWM board of the motor HAT on this host.
#[cfg(all(target_os = "linux", any(target_arch = "arm", target_arch = "aarch64")))]
pub type HostBoard = Pca9685<rppal::i2c::I2c>;

/// PWM board of the motor HAT on this host, hosts without an I2C bus have none.
#[cfg(not(all(target_os = "linux", any(target_arch = "arm", target_arch = "aarch64"))))]
pub type HostBoard = NoBoard;

/// A board that cannot exist.
#[derive(Debug)]
pub enum NoBoard {}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<I2C, E> PwmBoard for Pca9685<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    fn set_duty_cycle(&mut self, channel: u8, duty_cycle: f64) -> Result<(), PwmError> {
        // If the duty cycle is out of range return an error
        if !(duty_cycle >= 0.0 && duty_cycle <= 1.0) {
            return Err(PwmError::InvalidDutyCycle(duty_cycle));
        }

        let off = lin_map((0.0, 1.0), (0.0, MAX_PWM as f64), duty_cycle).round() as u16;

        self.set_channel_on_off(to_channel(channel)?, 0, off)
            .map_err(|e| map_pca_error(e, duty_cycle))
    }

    fn set_pin(&mut self, channel: u8, high: bool) -> Result<(), PwmError> {
        let ch = to_channel(channel)?;

        if high {
            // Full off takes precedence over full on, so clear it first
            self.set_channel_off(ch, 0)
                .map_err(|e| map_pca_error(e, 1.0))?;
            self.set_channel_full_on(ch, 0)
                .map_err(|e| map_pca_error(e, 1.0))
        } else {
            self.set_channel_full_off(ch)
                .map_err(|e| map_pca_error(e, 0.0))
        }
    }
}

impl PwmBoard for NoBoard {
    fn set_duty_cycle(&mut self, _channel: u8, _duty_cycle: f64) -> Result<(), PwmError> {
        match *self {}
    }

    fn set_pin(&mut self, _channel: u8, _high: bool) -> Result<(), PwmError> {
        match *self {}
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Open the motor HAT on the host's I2C bus.
#[cfg(all(target_os = "linux", any(target_arch = "arm", target_arch = "aarch64")))]
pub fn open_hat(params: HatParams) -> Result<HatMotors<HostBoard>, MotorError> {
    let i2c = rppal::i2c::I2c::with_bus(params.i2c_bus)
        .map_err(|e| MotorError::OpenError(format!("I2C bus {}: {}", params.i2c_bus, e)))?;

    let open_err = |_| {
        MotorError::OpenError(format!(
            "cannot configure the PCA9685 at address {:#04x}",
            params.address
        ))
    };

    let mut pwm = Pca9685::new(i2c, params.address).map_err(open_err)?;
    pwm.set_prescale(params.prescale).map_err(open_err)?;
    pwm.enable().map_err(open_err)?;

    Ok(HatMotors::new(pwm, params))
}

/// Open the motor HAT on the host's I2C bus.
#[cfg(not(all(target_os = "linux", any(target_arch = "arm", target_arch = "aarch64"))))]
pub fn open_hat(_params: HatParams) -> Result<HatMotors<HostBoard>, MotorError> {
    Err(MotorError::OpenError(String::from(
        "the motor HAT is only supported on ARM Linux hosts",
    )))
}

fn to_channel(channel: u8) -> Result<Channel, PwmError> {
    let ch = match channel {
        0 => Channel::C0,
        1 => Channel::C1,
        2 => Channel::C2,
        3 => Channel::C3,
        4 => Channel::C4,
        5 => Channel::C5,
        6 => Channel::C6,
        7 => Channel::C7,
        8 => Channel::C8,
        9 => Channel::C9,
        10 => Channel::C10,
        11 => Channel::C11,
        12 => Channel::C12,
        13 => Channel::C13,
        14 => Channel::C14,
        15 => Channel::C15,
        _ => return Err(PwmError::InvalidChannel(channel)),
    };

    Ok(ch)
}

fn map_pca_error<E>(e: pwm_pca9685::Error<E>, duty_cycle: f64) -> PwmError {
    match e {
        pwm_pca9685::Error::I2C(_) => PwmError::I2c,
        pwm_pca9685::Error::InvalidInputData => PwmError::InvalidDutyCycle(duty_cycle),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_channels() {
        assert!(to_channel(0).is_ok());
        assert!(to_channel(15).is_ok());
        assert_eq!(to_channel(16).err(), Some(PwmError::InvalidChannel(16)));
    }
}
