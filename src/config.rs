//! System configuration parameters
//!
//! All tunable parameters for the SmartShower controller.
//! Values can be overridden from a JSON file through
//! [`ConfigPort`](crate::app::ports::ConfigPort); missing fields keep
//! their defaults.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Temperature ---
    /// Target used when a start request carries no temperature (°C)
    pub default_temperature_c: f64,
    /// Lowest target the mixer may be asked for (°C)
    pub min_temperature_c: f64,
    /// Highest target, and the over-temperature trip point (°C)
    pub max_temperature_c: f64,
    /// Fraction of the remaining error closed per control tick (model mode)
    pub temperature_gain: f64,
    /// Mixer travel per control tick (0.0-1.0 scale)
    pub mixer_step: f64,
    /// Error below which the mixer holds still (°C)
    pub mixer_deadband_c: f64,
    /// Error at or below which flow counts as stable (°C)
    pub stable_band_c: f64,
    /// Water temperature assumed at power-on in model mode (°C)
    pub initial_water_temperature_c: f64,

    // --- Flow ---
    /// Flow rate set when water starts (L/min)
    pub default_flow_rate_lpm: f64,
    /// Highest flow the supply line tolerates while flowing (L/min)
    pub flow_ceiling_lpm: f64,
    /// Flow below this while flowing raises a low-flow warning (L/min)
    pub low_flow_lpm: f64,
    /// Supply pressure that stops the flow (bar)
    pub pressure_limit_bar: f64,

    // --- Safety ---
    /// Door closed this long during a session triggers auto-shutoff (seconds)
    pub door_timeout_secs: u32,
    /// Hard cap on session length (seconds)
    pub max_session_secs: u32,
    /// A leak lasting longer than this escalates to emergency (milliseconds)
    pub leak_escalation_ms: u32,

    // --- Timing ---
    /// Water control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
    /// Safety loop interval (milliseconds)
    pub safety_loop_interval_ms: u32,
    /// Telemetry report interval (seconds)
    pub telemetry_interval_secs: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Temperature
            default_temperature_c: 38.0,
            min_temperature_c: 20.0,
            max_temperature_c: 45.0,
            temperature_gain: 0.1,
            mixer_step: 0.01,
            mixer_deadband_c: 0.5,
            stable_band_c: 0.5,
            initial_water_temperature_c: 20.0,

            // Flow
            default_flow_rate_lpm: 8.0,
            flow_ceiling_lpm: 12.0,
            low_flow_lpm: 0.5,
            pressure_limit_bar: 5.0,

            // Safety
            door_timeout_secs: 600,  // 10 min
            max_session_secs: 1800, // 30 min
            leak_escalation_ms: 100,

            // Timing
            control_loop_interval_ms: 100, // 10 Hz
            safety_loop_interval_ms: 100,  // 10 Hz
            telemetry_interval_secs: 60,   // 1/min
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Rejects rather than clamps so a bad file
    /// can never weaken a safety limit silently.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            self.default_temperature_c,
            self.min_temperature_c,
            self.max_temperature_c,
            self.temperature_gain,
            self.mixer_step,
            self.mixer_deadband_c,
            self.stable_band_c,
            self.initial_water_temperature_c,
            self.default_flow_rate_lpm,
            self.flow_ceiling_lpm,
            self.low_flow_lpm,
            self.pressure_limit_bar,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::ValidationFailed("non-finite value"));
        }
        if self.min_temperature_c >= self.max_temperature_c {
            return Err(ConfigError::ValidationFailed(
                "min_temperature_c must be below max_temperature_c",
            ));
        }
        if !(self.min_temperature_c..=self.max_temperature_c).contains(&self.default_temperature_c) {
            return Err(ConfigError::ValidationFailed(
                "default_temperature_c outside temperature limits",
            ));
        }
        if !(self.temperature_gain > 0.0 && self.temperature_gain <= 1.0) {
            return Err(ConfigError::ValidationFailed("temperature_gain must be in (0, 1]"));
        }
        if !(self.mixer_step > 0.0 && self.mixer_step <= 1.0) {
            return Err(ConfigError::ValidationFailed("mixer_step must be in (0, 1]"));
        }
        if self.mixer_deadband_c < 0.0 || self.stable_band_c < 0.0 {
            return Err(ConfigError::ValidationFailed("bands must not be negative"));
        }
        if self.default_flow_rate_lpm <= 0.0 || self.default_flow_rate_lpm > crate::control::flow::MAX_FLOW_RATE_LPM {
            return Err(ConfigError::ValidationFailed("default_flow_rate_lpm out of range"));
        }
        if self.flow_ceiling_lpm < self.default_flow_rate_lpm {
            return Err(ConfigError::ValidationFailed(
                "flow_ceiling_lpm below default_flow_rate_lpm",
            ));
        }
        if self.low_flow_lpm < 0.0 || self.low_flow_lpm >= self.default_flow_rate_lpm {
            return Err(ConfigError::ValidationFailed(
                "low_flow_lpm must be in [0, default_flow_rate_lpm)",
            ));
        }
        if self.pressure_limit_bar <= 0.0 {
            return Err(ConfigError::ValidationFailed("pressure_limit_bar must be positive"));
        }
        if self.door_timeout_secs == 0 || self.max_session_secs == 0 {
            return Err(ConfigError::ValidationFailed("safety timeouts must be non-zero"));
        }
        if self.control_loop_interval_ms == 0 || self.safety_loop_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("loop intervals must be non-zero"));
        }
        if self.telemetry_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed("telemetry_interval_secs must be non-zero"));
        }
        Ok(())
    }

    // ── Tick conversions (safety loop) ────────────────────────

    /// Door timeout expressed in safety-loop ticks.
    pub fn door_timeout_ticks(&self) -> u32 {
        secs_to_ticks(self.door_timeout_secs, self.safety_loop_interval_ms)
    }

    /// Session duration cap expressed in safety-loop ticks.
    pub fn max_session_ticks(&self) -> u32 {
        secs_to_ticks(self.max_session_secs, self.safety_loop_interval_ms)
    }

    /// Consecutive leak ticks tolerated before escalation.
    pub fn leak_escalation_ticks(&self) -> u32 {
        ms_to_ticks(self.leak_escalation_ms, self.safety_loop_interval_ms)
    }

    /// Seconds represented by one water-loop tick.
    pub fn control_tick_secs(&self) -> f64 {
        f64::from(self.control_loop_interval_ms) / 1000.0
    }

    /// Seconds represented by one safety tick.
    pub fn safety_tick_secs(&self) -> f64 {
        f64::from(self.safety_loop_interval_ms) / 1000.0
    }
}

/// Round up so a timeout never fires early.
fn ms_to_ticks(ms: u32, interval_ms: u32) -> u32 {
    let interval = interval_ms.max(1);
    ms.div_ceil(interval)
}

fn secs_to_ticks(secs: u32, interval_ms: u32) -> u32 {
    ms_to_ticks(secs.saturating_mul(1000), interval_ms)
}
