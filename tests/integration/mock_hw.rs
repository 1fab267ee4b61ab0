//! Mock adapters for integration tests.
//!
//! Records every sensor read and actuator call in one ordered history so
//! tests can assert on *when* a valve closed relative to the inputs,
//! without touching real GPIO/PWM registers.

use smartshower::app::events::ShowerEvent;
use smartshower::app::ports::{ActuatorPort, AudioPort, EventSink, SensorPort};
use smartshower::error::AudioError;
use smartshower::sensors::DoorState;

// ── Hardware call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum HwCall {
    ReadDoor,
    ReadLeak,
    ReadButton,
    SetHotValve(bool),
    SetColdValve(bool),
    SetMixer(f64),
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub door: DoorState,
    pub leak: bool,
    pub button: bool,
    pub water_temperature: Option<f64>,
    pub pressure_bar: Option<f64>,
    pub calls: Vec<HwCall>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            door: DoorState::Unknown,
            leak: false,
            button: false,
            water_temperature: None,
            pressure_bar: None,
            calls: Vec::new(),
        }
    }

    pub fn with_door(door: DoorState) -> Self {
        Self {
            door,
            ..Self::new()
        }
    }

    /// Last commanded state of both supplies.
    pub fn water_running(&self) -> bool {
        self.last_valve(|c| match c {
            HwCall::SetHotValve(open) => Some(*open),
            _ => None,
        }) || self.last_valve(|c| match c {
            HwCall::SetColdValve(open) => Some(*open),
            _ => None,
        })
    }

    fn last_valve(&self, pick: impl Fn(&HwCall) -> Option<bool>) -> bool {
        self.calls.iter().rev().find_map(pick).unwrap_or(false)
    }

    /// How many times a valve was commanded closed.
    pub fn hot_close_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| **c == HwCall::SetHotValve(false))
            .count()
    }

    pub fn position_of(&self, call: &HwCall) -> Option<usize> {
        self.calls.iter().position(|c| c == call)
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_door(&mut self) -> DoorState {
        self.calls.push(HwCall::ReadDoor);
        self.door
    }

    fn read_leak(&mut self) -> bool {
        self.calls.push(HwCall::ReadLeak);
        self.leak
    }

    fn read_emergency_button(&mut self) -> bool {
        self.calls.push(HwCall::ReadButton);
        self.button
    }

    fn read_water_temperature(&mut self) -> Option<f64> {
        self.water_temperature
    }

    fn read_pressure_bar(&mut self) -> Option<f64> {
        self.pressure_bar
    }
}

impl ActuatorPort for MockHardware {
    fn set_hot_valve(&mut self, open: bool) {
        self.calls.push(HwCall::SetHotValve(open));
    }

    fn set_cold_valve(&mut self, open: bool) {
        self.calls.push(HwCall::SetColdValve(open));
    }

    fn set_mixer_position(&mut self, position: f64) {
        self.calls.push(HwCall::SetMixer(position));
    }
}

// ── MockAudio ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockAudio {
    pub fail: bool,
    pub playing: Option<String>,
    pub stops: u32,
}

#[allow(dead_code)]
impl MockAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl AudioPort for MockAudio {
    fn start_playback(&mut self, source: &str) -> Result<(), AudioError> {
        if self.fail {
            return Err(AudioError::PlaybackFailed);
        }
        self.playing = Some(source.to_string());
        Ok(())
    }

    fn stop_playback(&mut self) {
        self.stops += 1;
        self.playing = None;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<ShowerEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&ShowerEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &ShowerEvent) {
        self.events.push(event.clone());
    }
}
