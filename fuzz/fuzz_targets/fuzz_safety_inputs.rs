//! Fuzz target: sensor sequences through the coordinator
//!
//! Each input byte is one safety tick (door in bits 0-1, leak in bit 2,
//! button in bit 3) or, with bit 7 set, a command.  Verifies:
//! - No panics under arbitrary sequences
//! - EMERGENCY never coexists with open valves or a running session
//!
//! cargo fuzz run fuzz_safety_inputs

#![no_main]

use libfuzzer_sys::fuzz_target;
use smartshower::adapters::audio::LogAudioPlayer;
use smartshower::adapters::sim::SimulatedHardware;
use smartshower::app::events::ShowerEvent;
use smartshower::app::ports::EventSink;
use smartshower::app::service::ShowerService;
use smartshower::config::SystemConfig;
use smartshower::safety::SafetyState;
use smartshower::sensors::DoorState;

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &ShowerEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let config = SystemConfig {
        door_timeout_secs: 2,
        max_session_secs: 5,
        ..SystemConfig::default()
    };
    let mut svc = ShowerService::new(config);
    let mut hw = SimulatedHardware::new();
    let mut audio = LogAudioPlayer::new();
    let mut sink = Discard;

    for &b in data {
        if b & 0x80 != 0 {
            match b & 0x07 {
                0 => {
                    let _ = svc.start_shower(f64::from(b & 0x3f), None, &mut hw, &mut audio, &mut sink);
                }
                1 => {
                    let _ = svc.stop_shower(&mut hw, &mut audio, &mut sink);
                }
                2 => {
                    let _ = svc.emergency_stop("fuzz", &mut hw, &mut audio, &mut sink);
                }
                3 => {
                    let _ = svc.clear_emergency(&mut hw, &mut audio, &mut sink);
                }
                4 => {
                    svc.set_flow_rate(f64::from(b & 0x78));
                }
                _ => svc.water_tick(&mut hw, &mut audio, &mut sink),
            }
        } else {
            hw.simulate_door(match b & 0x03 {
                0 => DoorState::Open,
                1 => DoorState::Closed,
                _ => DoorState::Unknown,
            });
            hw.simulate_leak(b & 0x04 != 0);
            hw.simulate_emergency_button(b & 0x08 != 0);
            svc.safety_tick(&mut hw, &mut audio, &mut sink);
        }

        if svc.safety_state() == SafetyState::Emergency {
            assert!(!hw.water_running(), "valves open during EMERGENCY");
            assert!(svc.session().is_none(), "session alive during EMERGENCY");
        }
    }
});
