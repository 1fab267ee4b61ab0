//! Hardware adapter bridging real peripherals to domain port traits.
//!
//! Owns the contact inputs and the valve drivers, exposing them through
//! [`SensorPort`] and [`ActuatorPort`].  Generic over `embedded-hal` pins
//! so any HAL with 1.0 traits can drive a real bathroom.
//!
//! Unreadable inputs fail safe:
//!
//! | Input            | Read error means |
//! |------------------|------------------|
//! | door reed        | `Unknown`        |
//! | leak probe       | leak present     |
//! | emergency button | pressed          |

use embedded_hal::digital::{InputPin, OutputPin};
use log::error;
use embedded_hal::pwm::SetDutyCycle;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::mixer::MixerValve;
use crate::drivers::valve::SolenoidValve;
use crate::sensors::DoorState;
use crate::sensors::contact::ContactInput;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HalHardware<Door, Leak, Button, Hot, Cold, Mix> {
    door: ContactInput<Door>,
    leak: ContactInput<Leak>,
    button: ContactInput<Button>,
    hot: SolenoidValve<Hot>,
    cold: SolenoidValve<Cold>,
    mixer: MixerValve<Mix>,
    close_failures: u32,
}

impl<Door, Leak, Button, Hot, Cold, Mix> HalHardware<Door, Leak, Button, Hot, Cold, Mix>
where
    Door: InputPin,
    Leak: InputPin,
    Button: InputPin,
    Hot: OutputPin,
    Cold: OutputPin,
    Mix: SetDutyCycle,
{
    /// `door` must assert when the reed sees the magnet (door closed).
    pub fn new(
        door: ContactInput<Door>,
        leak: ContactInput<Leak>,
        button: ContactInput<Button>,
        hot: SolenoidValve<Hot>,
        cold: SolenoidValve<Cold>,
        mixer: MixerValve<Mix>,
    ) -> Self {
        Self {
            door,
            leak,
            button,
            hot,
            cold,
            mixer,
            close_failures: 0,
        }
    }

    pub fn hot_valve_open(&self) -> bool {
        self.hot.is_open()
    }

    pub fn cold_valve_open(&self) -> bool {
        self.cold.is_open()
    }

    pub fn mixer_position(&self) -> f64 {
        self.mixer.position()
    }

    /// Valve close commands the pin driver rejected since startup.
    pub fn close_failures(&self) -> u32 {
        self.close_failures
    }

    fn valve_result(&mut self, supply: &str, open: bool, ok: bool) {
        if !ok && !open {
            self.close_failures = self.close_failures.saturating_add(1);
            error!("FLOW EMERGENCY: {supply} supply did not close, water may still be running");
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<Door, Leak, Button, Hot, Cold, Mix> SensorPort for HalHardware<Door, Leak, Button, Hot, Cold, Mix>
where
    Door: InputPin,
    Leak: InputPin,
    Button: InputPin,
    Hot: OutputPin,
    Cold: OutputPin,
    Mix: SetDutyCycle,
{
    fn read_door(&mut self) -> DoorState {
        match self.door.read() {
            Some(true) => DoorState::Closed,
            Some(false) => DoorState::Open,
            None => DoorState::Unknown,
        }
    }

    fn read_leak(&mut self) -> bool {
        self.leak.read().unwrap_or(true)
    }

    fn read_emergency_button(&mut self) -> bool {
        self.button.read().unwrap_or(true)
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<Door, Leak, Button, Hot, Cold, Mix> ActuatorPort for HalHardware<Door, Leak, Button, Hot, Cold, Mix>
where
    Door: InputPin,
    Leak: InputPin,
    Button: InputPin,
    Hot: OutputPin,
    Cold: OutputPin,
    Mix: SetDutyCycle,
{
    fn set_hot_valve(&mut self, open: bool) {
        let ok = self.hot.set(open);
        self.valve_result("hot", open, ok);
    }

    fn set_cold_valve(&mut self, open: bool) {
        let ok = self.cold.set(open);
        self.valve_result("cold", open, ok);
    }

    fn set_mixer_position(&mut self, position: f64) {
        self.mixer.set_position(position);
    }
}
