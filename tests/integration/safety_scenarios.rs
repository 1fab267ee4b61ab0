//! End-to-end safety scenarios: sensors → safety monitor → coordinator →
//! valves, stepped one safety tick at a time at the default 100 ms rate.

use crate::mock_hw::{HwCall, MockAudio, MockHardware, RecordingSink};

use smartshower::app::events::ShowerEvent;
use smartshower::app::service::ShowerService;
use smartshower::config::SystemConfig;
use smartshower::error::{ClearError, Error, FaultKind, SessionError};
use smartshower::safety::SafetyState;
use smartshower::sensors::DoorState;

const DOOR_TIMEOUT_TICKS: u32 = 6_000;
const SESSION_CAP_TICKS: u32 = 18_000;

struct Rig {
    svc: ShowerService,
    hw: MockHardware,
    audio: MockAudio,
    sink: RecordingSink,
}

impl Rig {
    fn new(door: DoorState) -> Self {
        Self {
            svc: ShowerService::new(SystemConfig::default()),
            hw: MockHardware::with_door(door),
            audio: MockAudio::new(),
            sink: RecordingSink::new(),
        }
    }

    fn tick(&mut self) {
        self.svc.safety_tick(&mut self.hw, &mut self.audio, &mut self.sink);
    }

    fn ticks(&mut self, n: u32) {
        for _ in 0..n {
            self.tick();
        }
    }

    fn start(&mut self) -> Result<f64, Error> {
        self.svc
            .start_shower(38.0, None, &mut self.hw, &mut self.audio, &mut self.sink)
    }

    fn notifications(&self, fault: FaultKind) -> usize {
        self.sink.count(|e| {
            matches!(e, ShowerEvent::EmergencyNotification { fault: f, .. } if *f == fault)
        })
    }
}

// ── Door timer ───────────────────────────────────────────────

#[test]
fn door_closed_for_ten_minutes_shuts_off_once() {
    let mut rig = Rig::new(DoorState::Closed);
    rig.tick();
    rig.start().unwrap();

    rig.ticks(DOOR_TIMEOUT_TICKS - 1);
    assert!(rig.hw.water_running(), "must not fire early");
    assert_eq!(rig.svc.safety_state(), SafetyState::Safe);

    rig.tick();
    assert!(!rig.hw.water_running());
    assert_eq!(rig.svc.safety_state(), SafetyState::Emergency);
    assert!(rig.svc.session().is_none());
    assert_eq!(rig.notifications(FaultKind::DoorTimeout), 1);

    rig.ticks(100);
    assert_eq!(rig.notifications(FaultKind::DoorTimeout), 1, "fires exactly once");
}

#[test]
fn door_timeout_reason_text() {
    let mut rig = Rig::new(DoorState::Closed);
    rig.tick();
    rig.start().unwrap();
    rig.ticks(DOOR_TIMEOUT_TICKS);

    let status = rig.svc.safety_status();
    assert_eq!(
        status.emergency_reason.as_deref(),
        Some("Door timeout - Auto-shutoff")
    );
}

#[test]
fn reopening_the_door_restarts_the_full_timeout() {
    let mut rig = Rig::new(DoorState::Closed);
    rig.tick();
    rig.start().unwrap();

    rig.ticks(3_000);
    rig.hw.door = DoorState::Open;
    rig.tick();
    assert_eq!(rig.svc.safety_status().door_time_remaining, None);

    rig.hw.door = DoorState::Closed;
    rig.tick();
    // The closing tick arms a fresh countdown.
    rig.ticks(DOOR_TIMEOUT_TICKS - 1);
    assert!(rig.hw.water_running());

    rig.tick();
    assert!(!rig.hw.water_running());
    assert_eq!(rig.notifications(FaultKind::DoorTimeout), 1);
}

#[test]
fn door_open_at_start_does_not_arm_timer() {
    let mut rig = Rig::new(DoorState::Open);
    rig.tick();
    rig.start().unwrap();
    rig.ticks(DOOR_TIMEOUT_TICKS + 10);
    assert!(rig.hw.water_running());
    assert_eq!(rig.notifications(FaultKind::DoorTimeout), 0);
}

#[test]
fn door_time_remaining_counts_down() {
    let mut rig = Rig::new(DoorState::Closed);
    rig.tick();
    rig.start().unwrap();
    rig.ticks(10);
    let remaining = rig.svc.safety_status().door_time_remaining.unwrap();
    assert!((remaining - 599.0).abs() < 1e-6, "got {remaining}");
}

// ── Session cap ──────────────────────────────────────────────

#[test]
fn session_cap_applies_with_door_open() {
    let mut rig = Rig::new(DoorState::Open);
    rig.tick();
    rig.start().unwrap();

    rig.ticks(SESSION_CAP_TICKS - 1);
    assert!(rig.hw.water_running());

    rig.tick();
    assert!(!rig.hw.water_running());
    assert_eq!(rig.notifications(FaultKind::SessionTimeout), 1);
    assert_eq!(
        rig.svc.safety_status().emergency_reason.as_deref(),
        Some("Maximum shower duration exceeded")
    );
}

// ── Leak ─────────────────────────────────────────────────────

#[test]
fn leak_stops_water_before_next_sensor_read() {
    let mut rig = Rig::new(DoorState::Closed);
    rig.tick();
    rig.start().unwrap();
    rig.hw.clear_calls();

    rig.hw.leak = true;
    rig.tick();
    assert_eq!(rig.svc.safety_state(), SafetyState::Danger);
    assert!(!rig.hw.water_running());

    rig.tick();
    let close = rig.hw.position_of(&HwCall::SetHotValve(false)).unwrap();
    let second_leak_read = rig
        .hw
        .calls
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == HwCall::ReadLeak)
        .nth(1)
        .map(|(i, _)| i)
        .unwrap();
    assert!(close < second_leak_read);
}

#[test]
fn leak_notifies_and_escalates() {
    let mut rig = Rig::new(DoorState::Closed);
    rig.tick();
    rig.start().unwrap();

    rig.hw.leak = true;
    rig.tick();
    assert_eq!(rig.sink.count(|e| matches!(e, ShowerEvent::LeakDetected { .. })), 1);
    assert_eq!(
        rig.sink.count(|e| matches!(e, ShowerEvent::SafetyWarning { .. })),
        1
    );
    assert!(rig.svc.session().is_none());

    rig.tick();
    assert_eq!(rig.svc.safety_state(), SafetyState::Emergency);
    assert_eq!(rig.notifications(FaultKind::Leak), 1);

    rig.ticks(20);
    assert_eq!(rig.sink.count(|e| matches!(e, ShowerEvent::LeakDetected { .. })), 1);
    assert_eq!(rig.hw.hot_close_count(), 1);
}

#[test]
fn leak_without_session_still_latches() {
    let mut rig = Rig::new(DoorState::Closed);
    rig.hw.leak = true;
    rig.ticks(2);
    assert_eq!(rig.svc.safety_state(), SafetyState::Emergency);
    assert_eq!(rig.start(), Err(Error::Session(SessionError::EmergencyActive)));
}

// ── Emergency button ─────────────────────────────────────────

#[test]
fn emergency_button_latches_on_same_tick() {
    let mut rig = Rig::new(DoorState::Closed);
    rig.tick();
    rig.start().unwrap();

    rig.hw.button = true;
    rig.tick();
    assert_eq!(rig.svc.safety_state(), SafetyState::Emergency);
    assert!(!rig.hw.water_running());
    assert_eq!(rig.notifications(FaultKind::EmergencyButton), 1);
}

// ── Clearing ─────────────────────────────────────────────────

#[test]
fn clear_requires_all_clear_bathroom() {
    let mut rig = Rig::new(DoorState::Closed);
    rig.tick();
    rig.start().unwrap();
    rig.hw.leak = true;
    rig.ticks(3);
    assert!(rig.svc.safety_status().emergency_active);

    let RigParts { svc, hw, audio, sink } = rig.parts();
    assert_eq!(
        svc.clear_emergency(hw, audio, sink),
        Err(Error::Clear(ClearError::LeakPresent))
    );

    rig.hw.leak = false;
    rig.hw.door = DoorState::Open;
    rig.tick();
    let RigParts { svc, hw, audio, sink } = rig.parts();
    assert_eq!(
        svc.clear_emergency(hw, audio, sink),
        Err(Error::Clear(ClearError::DoorNotClosed))
    );

    rig.hw.door = DoorState::Closed;
    rig.tick();
    let RigParts { svc, hw, audio, sink } = rig.parts();
    svc.clear_emergency(hw, audio, sink).unwrap();
    assert_eq!(rig.svc.safety_state(), SafetyState::Safe);
    assert_eq!(rig.sink.count(|e| *e == ShowerEvent::EmergencyCleared), 1);

    rig.start().unwrap();
    assert!(rig.hw.water_running());
}

#[test]
fn cleared_door_timeout_does_not_refire() {
    let mut rig = Rig::new(DoorState::Closed);
    rig.tick();
    rig.start().unwrap();
    rig.ticks(DOOR_TIMEOUT_TICKS);
    assert!(rig.svc.safety_status().emergency_active);

    let RigParts { svc, hw, audio, sink } = rig.parts();
    svc.clear_emergency(hw, audio, sink).unwrap();
    rig.ticks(10);
    assert_eq!(rig.svc.safety_state(), SafetyState::Safe);
    assert_eq!(rig.notifications(FaultKind::DoorTimeout), 1);
}

struct RigParts<'a> {
    svc: &'a mut ShowerService,
    hw: &'a mut MockHardware,
    audio: &'a mut MockAudio,
    sink: &'a mut RecordingSink,
}

impl Rig {
    fn parts(&mut self) -> RigParts<'_> {
        RigParts {
            svc: &mut self.svc,
            hw: &mut self.hw,
            audio: &mut self.audio,
            sink: &mut self.sink,
        }
    }
}
