//! Closed-loop water temperature control.
//!
//! Drives the mixing valve toward a clamped target.  Without a
//! temperature probe the outlet temperature is modelled as a first-order
//! lag; with a probe the reading replaces the model.
//!
//! ```text
//!   target ──clamp[min,max]──▶ error = target − current
//!                                  │
//!            ┌─────────────────────┼──────────────────────┐
//!            ▼                     ▼                      ▼
//!   model: current += err×gain   mixer ±step (deadband)   current > max?
//!   (never past target)          clamp [0, 1]             → OverTemperature
//! ```

use log::{debug, warn};

use crate::config::SystemConfig;
use crate::error::FaultKind;

/// Mixer position at which hot and cold contribute equally.
pub const MIXER_BALANCED: f64 = 0.5;

/// Result of one control step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureReading {
    pub current_c: f64,
    pub target_c: f64,
    pub mixer_position: f64,
    pub fault: Option<FaultKind>,
}

pub struct TemperatureController {
    min_c: f64,
    max_c: f64,
    gain: f64,
    mixer_step: f64,
    deadband_c: f64,
    target_c: f64,
    current_c: f64,
    mixer: f64,
    last_tick: Option<u64>,
    last: TemperatureReading,
}

impl TemperatureController {
    pub fn new(config: &SystemConfig) -> Self {
        let target_c = config
            .default_temperature_c
            .clamp(config.min_temperature_c, config.max_temperature_c);
        let current_c = config.initial_water_temperature_c;
        Self {
            min_c: config.min_temperature_c,
            max_c: config.max_temperature_c,
            gain: config.temperature_gain,
            mixer_step: config.mixer_step,
            deadband_c: config.mixer_deadband_c,
            target_c,
            current_c,
            mixer: 0.0,
            last_tick: None,
            last: TemperatureReading {
                current_c,
                target_c,
                mixer_position: 0.0,
                fault: None,
            },
        }
    }

    /// Clamp and apply a new target.  Returns the applied value.
    /// NaN keeps the previous target.
    pub fn set_target(&mut self, requested: f64) -> f64 {
        if requested.is_nan() {
            warn!("Ignoring NaN temperature target, keeping {:.1}°C", self.target_c);
            return self.target_c;
        }
        let applied = requested.clamp(self.min_c, self.max_c);
        if (applied - requested).abs() > f64::EPSILON {
            debug!("Temperature target {:.1}°C clamped to {:.1}°C", requested, applied);
        }
        self.target_c = applied;
        applied
    }

    /// Force the mixer to a position (used when flow opens or closes).
    pub fn set_mixer(&mut self, position: f64) {
        if position.is_finite() {
            self.mixer = position.clamp(0.0, 1.0);
        }
    }

    /// Run one control step at logical tick `at`.
    ///
    /// `measured` is the probe reading when one is fitted.  A tick at or
    /// before the last processed one returns the previous reading.
    pub fn tick(&mut self, at: u64, measured: Option<f64>) -> TemperatureReading {
        if self.last_tick.is_some_and(|last| at <= last) {
            return self.last;
        }
        self.last_tick = Some(at);

        let mut fault = None;
        match measured {
            Some(v) if v.is_finite() => self.current_c = v,
            Some(_) => fault = Some(FaultKind::TemperatureSensor),
            None => {
                let error = self.target_c - self.current_c;
                let step = error * self.gain;
                // Never step past the target.
                self.current_c = if step.abs() >= error.abs() {
                    self.target_c
                } else {
                    self.current_c + step
                };
            }
        }

        let error = self.target_c - self.current_c;
        if error > self.deadband_c {
            self.mixer = (self.mixer + self.mixer_step).min(1.0);
        } else if error < -self.deadband_c {
            self.mixer = (self.mixer - self.mixer_step).max(0.0);
        }

        if fault.is_none() && self.current_c > self.max_c {
            fault = Some(FaultKind::OverTemperature);
        }

        self.last = TemperatureReading {
            current_c: self.current_c,
            target_c: self.target_c,
            mixer_position: self.mixer,
            fault,
        };
        self.last
    }

    pub fn target(&self) -> f64 {
        self.target_c
    }

    pub fn current(&self) -> f64 {
        self.current_c
    }

    pub fn mixer_position(&self) -> f64 {
        self.mixer
    }
}
