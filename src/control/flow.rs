//! Flow/valve state machine.
//!
//! Owns the supply valves and the flow rate, and embeds the
//! [`TemperatureController`] that positions the mixer.
//!
//! ```text
//!   CLOSED ──start_flow──▶ ADJUSTING ──|err| ≤ band──▶ FLOWING
//!     ▲                        ▲                          │
//!     │                        └──────|err| > band────────┘
//!     └──────── stop_flow / emergency_stop (any active state)
//! ```
//!
//! ## Safety contract
//!
//! Stops never ramp: valves close, the mixer goes to 0.0 and the rate to
//! 0.0 within the same call.  Fatal faults seen during [`FlowController::tick`]
//! stop the water first and only then queue a [`FlowEvent::Fault`] for the
//! coordinator, so no drain ordering can leave water running.

use log::{error, info, warn};
use serde::Serialize;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::config::SystemConfig;
use crate::control::temperature::{MIXER_BALANCED, TemperatureController};
use crate::error::{FaultKind, FlowError, Reason, reason, reason_fmt};
use crate::events::EventQueue;

/// Hard upper bound for any flow-rate request (L/min).
pub const MAX_FLOW_RATE_LPM: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValveState {
    Closed,
    Open,
    /// Supply throttled below the nominal flow rate.
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowState {
    Stopped,
    Flowing,
    Adjusting,
}

impl FlowState {
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

/// Events queued by the flow controller for the coordinator to drain.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    Started { target_c: f64 },
    /// Exactly one per active→closed transition.
    Stopped { emergency: bool },
    /// A fatal condition already stopped the water.
    Fault { fault: FaultKind, reason: Reason },
    /// Flow dropped below the low-flow threshold while flowing.  Once per
    /// episode; the water keeps running.
    LowFlow { rate_lpm: f64 },
}

/// Snapshot returned by [`FlowController::status`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WaterStatus {
    pub current_temp: f64,
    pub target_temp: f64,
    pub flow_state: FlowState,
    pub valve_state: ValveState,
    pub flow_rate_lpm: f64,
    pub pressure_bar: Option<f64>,
    pub hot_valve_open: bool,
    pub cold_valve_open: bool,
    pub mixer_position: f64,
}

pub struct FlowController {
    temperature: TemperatureController,
    state: FlowState,
    valve: ValveState,
    hot_open: bool,
    cold_open: bool,
    flow_rate_lpm: f64,
    pressure_bar: Option<f64>,
    nominal_rate_lpm: f64,
    flow_ceiling_lpm: f64,
    low_flow_lpm: f64,
    low_flow_warned: bool,
    pressure_limit_bar: f64,
    stable_band_c: f64,
    events: EventQueue<FlowEvent>,
}

impl FlowController {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            temperature: TemperatureController::new(config),
            state: FlowState::Stopped,
            valve: ValveState::Closed,
            hot_open: false,
            cold_open: false,
            flow_rate_lpm: 0.0,
            pressure_bar: None,
            nominal_rate_lpm: config.default_flow_rate_lpm.clamp(0.0, MAX_FLOW_RATE_LPM),
            flow_ceiling_lpm: config.flow_ceiling_lpm,
            low_flow_lpm: config.low_flow_lpm,
            low_flow_warned: false,
            pressure_limit_bar: config.pressure_limit_bar,
            stable_band_c: config.stable_band_c,
            events: EventQueue::new(),
        }
    }

    // ── Commands ──────────────────────────────────────────────

    /// Open both supplies at the nominal rate and start converging on
    /// `target_c`.  Returns the applied (clamped) target.
    pub fn start_flow(&mut self, target_c: f64, hw: &mut impl ActuatorPort) -> Result<f64, FlowError> {
        if !target_c.is_finite() {
            return Err(FlowError::NonFiniteSetpoint);
        }
        if self.state.is_active() {
            return Err(FlowError::AlreadyActive);
        }

        let applied = self.temperature.set_target(target_c);
        self.temperature.set_mixer(MIXER_BALANCED);

        hw.set_hot_valve(true);
        hw.set_cold_valve(true);
        hw.set_mixer_position(MIXER_BALANCED);

        self.hot_open = true;
        self.cold_open = true;
        self.flow_rate_lpm = self.nominal_rate_lpm;
        self.valve = ValveState::Open;
        self.state = FlowState::Adjusting;

        info!("FLOW | started, target {:.1}°C at {:.1} L/min", applied, self.flow_rate_lpm);
        self.events.push(FlowEvent::Started { target_c: applied });
        Ok(applied)
    }

    /// Close the supplies.  Returns `true` if water was running.
    pub fn stop_flow(&mut self, hw: &mut impl ActuatorPort) -> bool {
        if !self.state.is_active() {
            return false;
        }
        info!("FLOW | stopped");
        self.close(hw, false);
        true
    }

    /// Close the supplies immediately.  Returns `true` if water was running.
    pub fn emergency_stop(&mut self, hw: &mut impl ActuatorPort, why: &str) -> bool {
        if !self.state.is_active() {
            return false;
        }
        error!("FLOW EMERGENCY STOP: {why}");
        self.close(hw, true);
        true
    }

    /// Clamp to [0, 15] L/min and apply while water is running.
    /// Returns the rate in effect afterwards.
    pub fn set_flow_rate(&mut self, requested: f64) -> f64 {
        if requested.is_nan() {
            warn!("Ignoring NaN flow rate, keeping {:.1} L/min", self.flow_rate_lpm);
            return self.flow_rate_lpm;
        }
        if !self.state.is_active() {
            info!("Flow rate request ignored while valves are closed");
            return self.flow_rate_lpm;
        }
        let applied = requested.clamp(0.0, MAX_FLOW_RATE_LPM);
        self.flow_rate_lpm = applied;
        self.valve = if applied < self.nominal_rate_lpm {
            ValveState::Partial
        } else {
            ValveState::Open
        };
        info!("FLOW | rate {:.1} L/min ({:?})", applied, self.valve);
        applied
    }

    /// Retarget the mixer.  Returns the applied (clamped) target.
    pub fn set_temperature(&mut self, requested: f64) -> f64 {
        let applied = self.temperature.set_target(requested);
        if self.state == FlowState::Flowing
            && (applied - self.temperature.current()).abs() > self.stable_band_c
        {
            self.state = FlowState::Adjusting;
        }
        applied
    }

    // ── Control loop ──────────────────────────────────────────

    /// One water-loop iteration at logical tick `at`.
    pub fn tick(&mut self, at: u64, hw: &mut (impl SensorPort + ActuatorPort)) {
        if !self.state.is_active() {
            return;
        }

        let measured = hw.read_water_temperature();
        self.pressure_bar = match hw.read_pressure_bar() {
            Some(p) if p.is_finite() => Some(p),
            Some(_) => {
                warn!("Discarding non-finite pressure reading");
                None
            }
            None => None,
        };

        let reading = self.temperature.tick(at, measured);

        // 1. Temperature faults stop immediately.
        if let Some(fault) = reading.fault {
            let why = match fault {
                FaultKind::OverTemperature => reason_fmt(format_args!(
                    "Water temperature {:.1}°C above limit",
                    reading.current_c
                )),
                _ => reason(fault.default_reason()),
            };
            self.emergency_stop(hw, &why);
            self.events.push(FlowEvent::Fault { fault, reason: why });
            return;
        }

        // 2. Supply pressure.
        if let Some(p) = self.pressure_bar.filter(|p| *p > self.pressure_limit_bar) {
            warn!("FLOW | pressure {:.2} bar above {:.2} bar limit", p, self.pressure_limit_bar);
            self.stop_flow(hw);
            let why = reason_fmt(format_args!("Water pressure {p:.1} bar above limit"));
            self.events.push(FlowEvent::Fault {
                fault: FaultKind::OverPressure,
                reason: why,
            });
            return;
        }

        // 3. Flow ceiling while flowing.
        if self.state == FlowState::Flowing && self.flow_rate_lpm > self.flow_ceiling_lpm {
            warn!(
                "FLOW | rate {:.1} L/min above {:.1} L/min ceiling",
                self.flow_rate_lpm, self.flow_ceiling_lpm
            );
            let rate = self.flow_rate_lpm;
            self.stop_flow(hw);
            let why = reason_fmt(format_args!("Flow rate {rate:.1} L/min above ceiling"));
            self.events.push(FlowEvent::Fault {
                fault: FaultKind::FlowCeiling,
                reason: why,
            });
            return;
        }

        // 4. Low flow only warns.
        if self.flow_rate_lpm >= self.low_flow_lpm {
            self.low_flow_warned = false;
        } else if self.state == FlowState::Flowing && !self.low_flow_warned {
            warn!(
                "FLOW | low flow rate {:.1} L/min (threshold {:.1} L/min)",
                self.flow_rate_lpm, self.low_flow_lpm
            );
            self.low_flow_warned = true;
            self.events.push(FlowEvent::LowFlow {
                rate_lpm: self.flow_rate_lpm,
            });
        }

        hw.set_mixer_position(reading.mixer_position);

        let error = (reading.target_c - reading.current_c).abs();
        match self.state {
            FlowState::Adjusting if error <= self.stable_band_c => {
                info!("FLOW | stable at {:.1}°C", reading.current_c);
                self.state = FlowState::Flowing;
            }
            FlowState::Flowing if error > self.stable_band_c => {
                self.state = FlowState::Adjusting;
            }
            _ => {}
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self) -> WaterStatus {
        WaterStatus {
            current_temp: self.temperature.current(),
            target_temp: self.temperature.target(),
            flow_state: self.state,
            valve_state: self.valve,
            flow_rate_lpm: self.flow_rate_lpm,
            pressure_bar: self.pressure_bar,
            hot_valve_open: self.hot_open,
            cold_valve_open: self.cold_open,
            mixer_position: self.temperature.mixer_position(),
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn pop_event(&mut self) -> Option<FlowEvent> {
        self.events.pop()
    }

    // ── Internal ──────────────────────────────────────────────

    fn close(&mut self, hw: &mut impl ActuatorPort, emergency: bool) {
        hw.set_hot_valve(false);
        hw.set_cold_valve(false);
        hw.set_mixer_position(0.0);

        self.temperature.set_mixer(0.0);
        self.hot_open = false;
        self.cold_open = false;
        self.flow_rate_lpm = 0.0;
        self.low_flow_warned = false;
        self.valve = ValveState::Closed;
        self.state = FlowState::Stopped;

        self.events.push(FlowEvent::Stopped { emergency });
    }
}
