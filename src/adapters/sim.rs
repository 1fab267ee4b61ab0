//! Simulated hardware adapter for the host build and tests.
//!
//! Sensor values are whatever the last `simulate_*` call set; actuator
//! commands are stored so callers can inspect the valve state.  Starts
//! with the door unknown, no leak, the button released and no
//! temperature or pressure probe fitted.

use log::debug;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::sensors::DoorState;

#[derive(Debug, Default)]
pub struct SimulatedHardware {
    door: DoorState,
    leak: bool,
    emergency_button: bool,
    water_temperature: Option<f64>,
    pressure_bar: Option<f64>,
    hot_open: bool,
    cold_open: bool,
    mixer: f64,
    writes: u32,
}

impl SimulatedHardware {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Sensor injection ──────────────────────────────────────

    pub fn simulate_door(&mut self, door: DoorState) {
        debug!("SIM | door {:?}", door);
        self.door = door;
    }

    pub fn simulate_leak(&mut self, wet: bool) {
        debug!("SIM | leak {}", wet);
        self.leak = wet;
    }

    pub fn simulate_emergency_button(&mut self, pressed: bool) {
        debug!("SIM | emergency button {}", pressed);
        self.emergency_button = pressed;
    }

    /// `None` removes the probe (model mode).
    pub fn simulate_water_temperature(&mut self, celsius: Option<f64>) {
        self.water_temperature = celsius;
    }

    /// `None` removes the transducer.
    pub fn simulate_pressure(&mut self, bar: Option<f64>) {
        self.pressure_bar = bar;
    }

    // ── Actuator inspection ───────────────────────────────────

    pub fn hot_valve_open(&self) -> bool {
        self.hot_open
    }

    pub fn cold_valve_open(&self) -> bool {
        self.cold_open
    }

    pub fn mixer_position(&self) -> f64 {
        self.mixer
    }

    /// Water reaches the outlet while either supply is open.
    pub fn water_running(&self) -> bool {
        self.hot_open || self.cold_open
    }

    /// Total actuator commands received.
    pub fn actuator_writes(&self) -> u32 {
        self.writes
    }
}

impl SensorPort for SimulatedHardware {
    fn read_door(&mut self) -> DoorState {
        self.door
    }

    fn read_leak(&mut self) -> bool {
        self.leak
    }

    fn read_emergency_button(&mut self) -> bool {
        self.emergency_button
    }

    fn read_water_temperature(&mut self) -> Option<f64> {
        self.water_temperature
    }

    fn read_pressure_bar(&mut self) -> Option<f64> {
        self.pressure_bar
    }
}

impl ActuatorPort for SimulatedHardware {
    fn set_hot_valve(&mut self, open: bool) {
        self.writes += 1;
        self.hot_open = open;
    }

    fn set_cold_valve(&mut self, open: bool) {
        self.writes += 1;
        self.cold_open = open;
    }

    fn set_mixer_position(&mut self, position: f64) {
        self.writes += 1;
        self.mixer = position.clamp(0.0, 1.0);
    }
}
