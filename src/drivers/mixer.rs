//! Thermostatic mixing valve driver.
//!
//! Servo-positioned mixer driven by a PWM channel: 0 % duty is full cold,
//! 100 % duty is full hot.  Positions are clamped to [0.0, 1.0] before
//! they reach the hardware.

use embedded_hal::pwm::{Error as _, SetDutyCycle};
use log::error;

pub struct MixerValve<P> {
    pwm: P,
    position: f64,
}

impl<P: SetDutyCycle> MixerValve<P> {
    /// Parks the mixer at full cold.
    pub fn new(pwm: P) -> Self {
        let mut mixer = Self { pwm, position: 0.0 };
        mixer.set_position(0.0);
        mixer
    }

    /// Returns `false` if the PWM write failed.
    pub fn set_position(&mut self, position: f64) -> bool {
        let position = if position.is_finite() {
            position.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.position = position;
        let max = self.pwm.max_duty_cycle();
        let duty = (position * f64::from(max)).round() as u16;
        match self.pwm.set_duty_cycle(duty.min(max)) {
            Ok(()) => true,
            Err(e) => {
                error!("mixer: duty write failed: {:?}", e.kind());
                false
            }
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }
}
