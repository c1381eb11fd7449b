//! Adafruit Motor HAT driver
//!
//! The HAT drives each DC motor through an H-bridge controlled by three channels of its PWM
//! board: one PWM channel setting the speed and two input pins setting the direction.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::mot::MotorId;
use log::trace;
use serde::{Deserialize, Serialize};

use super::{check_speed, MotorDriver, MotorError, PwmBoard};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the motor HAT, loaded from `mot_driver.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HatParams {
    /// I2C bus the HAT is on
    pub i2c_bus: u8,

    /// I2C address of the HAT's PWM board
    pub address: u8,

    /// PWM frequency prescaler, `round(25 MHz / (4096 * freq)) - 1`
    pub prescale: u8,

    pub left: MotorParams,
    pub right: MotorParams,
}

/// Parameters of a single motor on the HAT.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MotorParams {
    /// PWM board channels wired to this motor
    pub channels: MotorChannels,

    /// Scale applied to the demanded speed, to balance the two motors
    pub alpha: f64,

    /// Offset applied to non-zero demanded speeds
    pub beta: f64,

    /// Reverse the direction of the motor, for motors wired back to front
    #[serde(default)]
    pub invert: bool,
}

/// PWM board channels of one H-bridge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MotorChannels {
    pub pwm: u8,
    pub in1: u8,
    pub in2: u8,
}

/// The two drive motors on a motor HAT.
pub struct HatMotors<B: PwmBoard> {
    board: B,
    params: HatParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for HatParams {
    /// Motor 1 on the left and motor 2 on the right of a HAT at the factory address.
    fn default() -> Self {
        let motor = |pwm, in1, in2| MotorParams {
            channels: MotorChannels { pwm, in1, in2 },
            alpha: 1.0,
            beta: 0.0,
            invert: false,
        };

        Self {
            i2c_bus: 1,
            address: 0x60,
            prescale: 3,
            left: motor(8, 10, 9),
            right: motor(13, 11, 12),
        }
    }
}

impl<B: PwmBoard> HatMotors<B> {
    pub fn new(board: B, params: HatParams) -> Self {
        Self { board, params }
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    fn motor_params(&self, motor: MotorId) -> MotorParams {
        match motor {
            MotorId::Left => self.params.left,
            MotorId::Right => self.params.right,
        }
    }
}

impl<B: PwmBoard> MotorDriver for HatMotors<B> {
    fn set_speed(&mut self, motor: MotorId, speed: f64) -> Result<(), MotorError> {
        check_speed(motor, speed)?;

        let p = self.motor_params(motor);
        let ch = p.channels;
        let pwm_err = |e| MotorError::Pwm(motor, e);

        // Zero always releases the motor, whatever the trim
        let mut value = if speed == 0.0 {
            0.0
        } else {
            p.alpha * speed + p.beta
        };
        if p.invert {
            value = -value;
        }
        let duty = util::maths::clamp(value.abs(), 0.0, 1.0);

        trace!("HAT {:?} motor value {:.3}, duty {:.3}", motor, value, duty);

        if duty == 0.0 {
            self.board.set_duty_cycle(ch.pwm, 0.0).map_err(pwm_err)?;
            self.board.set_pin(ch.in1, false).map_err(pwm_err)?;
            self.board.set_pin(ch.in2, false).map_err(pwm_err)?;
            return Ok(());
        }

        // Drop the active pin first so both are never high together
        if value > 0.0 {
            self.board.set_pin(ch.in2, false).map_err(pwm_err)?;
            self.board.set_pin(ch.in1, true).map_err(pwm_err)?;
        } else {
            self.board.set_pin(ch.in1, false).map_err(pwm_err)?;
            self.board.set_pin(ch.in2, true).map_err(pwm_err)?;
        }

        self.board.set_duty_cycle(ch.pwm, duty).map_err(pwm_err)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::mot_driver::PwmError;
    use comms_if::eqpt::mot::MotorDems;
    use std::collections::HashMap;

    /// PWM board keeping the last value written to each channel.
    #[derive(Default)]
    struct MockBoard {
        duty: HashMap<u8, f64>,
        pins: HashMap<u8, bool>,
        fail: bool,
    }

    impl PwmBoard for MockBoard {
        fn set_duty_cycle(&mut self, channel: u8, duty_cycle: f64) -> Result<(), PwmError> {
            if self.fail {
                return Err(PwmError::I2c);
            }
            self.duty.insert(channel, duty_cycle);
            Ok(())
        }

        fn set_pin(&mut self, channel: u8, high: bool) -> Result<(), PwmError> {
            if self.fail {
                return Err(PwmError::I2c);
            }
            self.pins.insert(channel, high);
            Ok(())
        }
    }

    #[test]
    fn test_forward_and_stop() {
        let mut hat = HatMotors::new(MockBoard::default(), HatParams::default());

        hat.set_speeds(&MotorDems::new(0.25, 0.75)).unwrap();

        let b = hat.board();
        assert_eq!(b.duty[&8], 0.25);
        assert_eq!((b.pins[&10], b.pins[&9]), (true, false));
        assert_eq!(b.duty[&13], 0.75);
        assert_eq!((b.pins[&11], b.pins[&12]), (true, false));

        hat.stop().unwrap();

        let b = hat.board();
        assert_eq!(b.duty[&8], 0.0);
        assert_eq!(b.duty[&13], 0.0);
        assert!(b.pins.values().all(|high| !high));
    }

    #[test]
    fn test_reverse_trim_and_invert() {
        let mut params = HatParams::default();
        params.left.alpha = 0.5;
        params.left.beta = 0.1;
        params.right.invert = true;
        let mut hat = HatMotors::new(MockBoard::default(), params);

        hat.set_left_speed(-0.8).unwrap();
        let b = hat.board();
        assert!((b.duty[&8] - 0.3).abs() < 1e-12);
        assert_eq!((b.pins[&10], b.pins[&9]), (false, true));

        // Inverted forward runs the bridge backwards
        hat.set_right_speed(0.5).unwrap();
        let b = hat.board();
        assert_eq!(b.duty[&13], 0.5);
        assert_eq!((b.pins[&11], b.pins[&12]), (false, true));

        // Trim offset never keeps a stopped motor turning
        hat.set_left_speed(0.0).unwrap();
        assert_eq!(hat.board().duty[&8], 0.0);
    }

    #[test]
    fn test_errors() {
        let mut hat = HatMotors::new(MockBoard::default(), HatParams::default());
        assert_eq!(
            hat.set_left_speed(-1.2),
            Err(MotorError::InvalidSpeed(MotorId::Left, -1.2))
        );

        let mut hat = HatMotors::new(
            MockBoard {
                fail: true,
                ..Default::default()
            },
            HatParams::default(),
        );
        assert_eq!(
            hat.set_right_speed(0.5),
            Err(MotorError::Pwm(MotorId::Right, PwmError::I2c))
        );
    }

    #[test]
    fn test_params_toml() {
        let params: HatParams = util::params::from_str(
            r#"
            i2c_bus = 1
            address = 96
            prescale = 3

            [left]
            channels = { pwm = 8, in1 = 10, in2 = 9 }
            alpha = 1.0
            beta = 0.0

            [right]
            channels = { pwm = 13, in1 = 11, in2 = 12 }
            alpha = 0.95
            beta = 0.0
            invert = true
            "#,
        )
        .unwrap();

        assert_eq!(params.left, HatParams::default().left);
        assert_eq!(params.right.alpha, 0.95);
        assert!(params.right.invert);
    }
}
