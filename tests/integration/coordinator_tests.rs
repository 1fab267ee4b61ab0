//! Integration tests for the command path: ShowerService → flow
//! controller → valves, plus audio and event fan-out.

use crate::mock_hw::{HwCall, MockAudio, MockHardware, RecordingSink};

use smartshower::app::commands::{CommandReply, ShowerCommand};
use smartshower::app::events::ShowerEvent;
use smartshower::app::service::ShowerService;
use smartshower::config::SystemConfig;
use smartshower::control::flow::{FlowState, ValveState};
use smartshower::diagnostics::{SafetyLog, SafetyLogKind};
use smartshower::error::{Error, FaultKind, SessionError, reason};
use smartshower::safety::SafetyState;
use smartshower::sensors::DoorState;

fn make() -> (ShowerService, MockHardware, MockAudio, RecordingSink) {
    (
        ShowerService::new(SystemConfig::default()),
        MockHardware::with_door(DoorState::Closed),
        MockAudio::new(),
        RecordingSink::new(),
    )
}

fn start(temperature: Option<f64>) -> ShowerCommand {
    ShowerCommand::StartShower {
        temperature,
        audio_source: None,
    }
}

// ── Start / stop ─────────────────────────────────────────────

#[test]
fn start_opens_both_supplies_at_balanced_mix() {
    let (mut svc, mut hw, mut audio, mut sink) = make();
    let reply = svc
        .handle_command(start(None), &mut hw, &mut audio, &mut sink)
        .unwrap();

    assert_eq!(reply, CommandReply::Temperature(38.0));
    assert_eq!(
        hw.calls,
        vec![
            HwCall::SetHotValve(true),
            HwCall::SetColdValve(true),
            HwCall::SetMixer(0.5)
        ]
    );
    assert!(matches!(sink.events[0], ShowerEvent::SessionStarted { .. }));
    assert!(
        sink.events
            .iter()
            .any(|e| *e == ShowerEvent::FlowStarted { target_c: 38.0 })
    );
}

#[test]
fn start_temperature_is_clamped() {
    let (mut svc, mut hw, mut audio, mut sink) = make();
    assert_eq!(
        svc.start_shower(60.0, None, &mut hw, &mut audio, &mut sink),
        Ok(45.0)
    );
    svc.stop_shower(&mut hw, &mut audio, &mut sink).unwrap();
    assert_eq!(
        svc.start_shower(5.0, None, &mut hw, &mut audio, &mut sink),
        Ok(20.0)
    );
}

#[test]
fn second_start_is_rejected_without_side_effects() {
    let (mut svc, mut hw, mut audio, mut sink) = make();
    svc.start_shower(38.0, None, &mut hw, &mut audio, &mut sink)
        .unwrap();
    hw.clear_calls();
    sink.clear();

    assert_eq!(
        svc.start_shower(40.0, None, &mut hw, &mut audio, &mut sink),
        Err(Error::Session(SessionError::SessionAlreadyActive))
    );
    assert!(hw.calls.is_empty());
    assert!(sink.events.is_empty());
    assert!((svc.session().unwrap().target_c - 38.0).abs() < 1e-9);
}

#[test]
fn stop_closes_valves_and_ends_session() {
    let (mut svc, mut hw, mut audio, mut sink) = make();
    svc.start_shower(38.0, None, &mut hw, &mut audio, &mut sink)
        .unwrap();
    svc.stop_shower(&mut hw, &mut audio, &mut sink).unwrap();

    assert!(!hw.water_running());
    assert!(svc.session().is_none());
    assert!(sink.events.contains(&ShowerEvent::SessionEnded));
    assert!(sink.events.contains(&ShowerEvent::FlowStopped { emergency: false }));

    // Idempotent.
    sink.clear();
    svc.stop_shower(&mut hw, &mut audio, &mut sink).unwrap();
    assert!(sink.events.is_empty());
}

// ── Emergency stop ───────────────────────────────────────────

#[test]
fn emergency_stop_is_idempotent() {
    let (mut svc, mut hw, mut audio, mut sink) = make();
    svc.start_shower(38.0, None, &mut hw, &mut audio, &mut sink)
        .unwrap();

    svc.emergency_stop("Emergency stop activated!", &mut hw, &mut audio, &mut sink)
        .unwrap();
    svc.emergency_stop("again", &mut hw, &mut audio, &mut sink)
        .unwrap();

    assert_eq!(hw.hot_close_count(), 1);
    assert_eq!(
        sink.count(|e| matches!(e, ShowerEvent::EmergencyNotification { .. })),
        1
    );
    assert_eq!(sink.count(|e| matches!(e, ShowerEvent::FlowStopped { .. })), 1);
    assert_eq!(sink.count(|e| *e == ShowerEvent::SessionEnded), 1);
    assert_eq!(svc.safety_state(), SafetyState::Emergency);
    assert_eq!(
        svc.safety_status().emergency_reason.as_deref(),
        Some("Emergency stop activated!")
    );
}

#[test]
fn emergency_without_session_latches() {
    let (mut svc, mut hw, mut audio, mut sink) = make();
    svc.handle_command(
        ShowerCommand::EmergencyStop {
            reason: reason("panic button"),
        },
        &mut hw,
        &mut audio,
        &mut sink,
    )
    .unwrap();
    assert!(hw.calls.is_empty());
    assert_eq!(
        svc.handle_command(start(None), &mut hw, &mut audio, &mut sink),
        Err(Error::Session(SessionError::EmergencyActive))
    );
}

// ── Setpoints ────────────────────────────────────────────────

#[test]
fn set_temperature_clamps_and_reports() {
    let (mut svc, mut hw, mut audio, mut sink) = make();
    let reply = svc
        .handle_command(ShowerCommand::SetTemperature(99.0), &mut hw, &mut audio, &mut sink)
        .unwrap();
    assert_eq!(reply, CommandReply::Temperature(45.0));
    assert!(sink.events.contains(&ShowerEvent::TemperatureTargetChanged {
        requested_c: 99.0,
        applied_c: 45.0
    }));
}

#[test]
fn flow_rate_applies_only_while_running() {
    let (mut svc, mut hw, mut audio, mut sink) = make();
    assert_eq!(svc.set_flow_rate(6.0), 0.0);

    svc.start_shower(38.0, None, &mut hw, &mut audio, &mut sink)
        .unwrap();
    assert_eq!(svc.set_flow_rate(20.0), 15.0);
    assert_eq!(svc.set_flow_rate(-3.0), 0.0);
    assert_eq!(svc.set_flow_rate(6.0), 6.0);
    assert_eq!(svc.water_status().valve_state, ValveState::Partial);
}

// ── Water loop ───────────────────────────────────────────────

#[test]
fn model_temperature_converges_and_settles() {
    let (mut svc, mut hw, mut audio, mut sink) = make();
    svc.start_shower(40.0, None, &mut hw, &mut audio, &mut sink)
        .unwrap();

    for _ in 0..200 {
        svc.water_tick(&mut hw, &mut audio, &mut sink);
    }
    let water = svc.water_status();
    assert!((water.current_temp - 40.0).abs() <= 0.5, "got {}", water.current_temp);
    assert!(water.current_temp <= 40.0, "model never overshoots");
    assert_eq!(water.flow_state, FlowState::Flowing);
}

#[test]
fn over_pressure_latches_emergency() {
    let (mut svc, mut hw, mut audio, mut sink) = make();
    svc.start_shower(38.0, None, &mut hw, &mut audio, &mut sink)
        .unwrap();

    hw.pressure_bar = Some(6.5);
    svc.water_tick(&mut hw, &mut audio, &mut sink);

    assert!(!hw.water_running());
    assert!(svc.session().is_none());
    assert_eq!(svc.safety_state(), SafetyState::Emergency);
    assert_eq!(
        sink.count(|e| matches!(
            e,
            ShowerEvent::EmergencyNotification {
                fault: FaultKind::OverPressure,
                ..
            }
        )),
        1
    );
}

#[test]
fn over_temperature_probe_latches_emergency() {
    let (mut svc, mut hw, mut audio, mut sink) = make();
    svc.start_shower(38.0, None, &mut hw, &mut audio, &mut sink)
        .unwrap();

    hw.water_temperature = Some(52.0);
    svc.water_tick(&mut hw, &mut audio, &mut sink);

    assert!(!hw.water_running());
    assert_eq!(
        sink.count(|e| matches!(
            e,
            ShowerEvent::EmergencyNotification {
                fault: FaultKind::OverTemperature,
                ..
            }
        )),
        1
    );
    assert!(sink.events.contains(&ShowerEvent::FlowStopped { emergency: true }));
}

#[test]
fn water_tick_while_stopped_touches_nothing() {
    let (mut svc, mut hw, mut audio, mut sink) = make();
    for _ in 0..5 {
        svc.water_tick(&mut hw, &mut audio, &mut sink);
    }
    assert!(hw.calls.is_empty());
    assert!(sink.events.is_empty());
}

#[test]
fn low_flow_warns_without_stopping() {
    let (mut svc, mut hw, mut audio, mut sink) = make();
    svc.start_shower(38.0, None, &mut hw, &mut audio, &mut sink)
        .unwrap();
    svc.set_flow_rate(0.2);

    for _ in 0..100 {
        svc.water_tick(&mut hw, &mut audio, &mut sink);
    }
    assert!(hw.water_running());
    assert_eq!(svc.water_status().flow_state, FlowState::Flowing);
    assert_eq!(
        sink.count(|e| matches!(e, ShowerEvent::LowFlow { .. })),
        1
    );
    assert_eq!(svc.safety_state(), SafetyState::Safe);
    assert!(
        svc.safety_log()
            .iter()
            .any(|e| e.kind == SafetyLogKind::Warning && e.message.starts_with("Low flow"))
    );
}

// ── Audio ────────────────────────────────────────────────────

#[test]
fn audio_failure_is_not_fatal() {
    let (mut svc, mut hw, _, mut sink) = make();
    let mut audio = MockAudio::failing();
    let applied = svc
        .start_shower(38.0, Some("radio:bbc"), &mut hw, &mut audio, &mut sink)
        .unwrap();

    assert!((applied - 38.0).abs() < 1e-9);
    assert!(hw.water_running());
    assert_eq!(
        sink.count(|e| matches!(e, ShowerEvent::AudioUnavailable { .. })),
        1
    );
}

#[test]
fn audio_follows_session() {
    let (mut svc, mut hw, mut audio, mut sink) = make();
    svc.start_shower(38.0, Some("spotify:abc"), &mut hw, &mut audio, &mut sink)
        .unwrap();
    assert_eq!(audio.playing.as_deref(), Some("spotify:abc"));

    svc.emergency_stop("stop", &mut hw, &mut audio, &mut sink)
        .unwrap();
    assert_eq!(audio.playing, None);
    assert_eq!(audio.stops, 1);
}

// ── Queries ──────────────────────────────────────────────────

#[test]
fn status_queries_reflect_session() {
    let (mut svc, mut hw, mut audio, mut sink) = make();
    svc.safety_tick(&mut hw, &mut audio, &mut sink);
    svc.start_shower(38.0, None, &mut hw, &mut audio, &mut sink)
        .unwrap();
    svc.safety_tick(&mut hw, &mut audio, &mut sink);

    let Ok(CommandReply::Water(water)) =
        svc.handle_command(ShowerCommand::GetWaterStatus, &mut hw, &mut audio, &mut sink)
    else {
        panic!("expected water status");
    };
    assert!(water.hot_valve_open && water.cold_valve_open);
    assert_eq!(water.valve_state, ValveState::Open);

    let Ok(CommandReply::Safety(safety)) =
        svc.handle_command(ShowerCommand::GetSafetyStatus, &mut hw, &mut audio, &mut sink)
    else {
        panic!("expected safety status");
    };
    assert!(safety.session_active);
    assert_eq!(safety.door_state, DoorState::Closed);
    assert!((safety.session_elapsed - 0.1).abs() < 1e-9);
}

#[test]
fn telemetry_is_emitted_through_sink() {
    let (mut svc, mut hw, mut audio, mut sink) = make();
    svc.start_shower(38.0, None, &mut hw, &mut audio, &mut sink)
        .unwrap();
    sink.clear();
    svc.emit_telemetry(&mut sink);

    let [ShowerEvent::Telemetry(t)] = sink.events.as_slice() else {
        panic!("expected a single telemetry event");
    };
    assert!(t.session_active);
    assert_eq!(t.safety_state, SafetyState::Safe);
}

#[test]
fn usage_stats_accumulate_across_sessions() {
    let (mut svc, mut hw, mut audio, mut sink) = make();

    svc.start_shower(38.0, None, &mut hw, &mut audio, &mut sink)
        .unwrap();
    svc.set_flow_rate(6.0);
    for _ in 0..600 {
        svc.tick(&mut hw, &mut audio, &mut sink);
    }
    svc.stop_shower(&mut hw, &mut audio, &mut sink).unwrap();

    // Emergency teardown still counts the session.
    svc.start_shower(42.0, None, &mut hw, &mut audio, &mut sink)
        .unwrap();
    for _ in 0..300 {
        svc.tick(&mut hw, &mut audio, &mut sink);
    }
    svc.emergency_stop("manual", &mut hw, &mut audio, &mut sink)
        .unwrap();

    // Nothing flows while stopped.
    for _ in 0..50 {
        svc.water_tick(&mut hw, &mut audio, &mut sink);
    }

    let Ok(CommandReply::Usage(stats)) =
        svc.handle_command(ShowerCommand::GetUsageStats, &mut hw, &mut audio, &mut sink)
    else {
        panic!("expected usage stats");
    };
    assert_eq!(stats.session_count, 2);
    // 6 L/min for 60 s, then 8 L/min for 30 s.
    assert!((stats.total_flow_litres - 10.0).abs() < 1e-6, "got {}", stats.total_flow_litres);
    assert!((stats.average_temperature_c.unwrap() - 40.0).abs() < 1e-9);
    assert!((stats.average_duration_min.unwrap() - 0.75).abs() < 1e-6);
}

#[test]
fn usage_stats_empty_before_first_session() {
    let (svc, ..) = make();
    let stats = svc.usage_stats();
    assert_eq!(stats.session_count, 0);
    assert_eq!(stats.total_flow_litres, 0.0);
    assert_eq!(stats.average_temperature_c, None);
}

#[test]
fn safety_journal_survives_postcard() {
    let (mut svc, mut hw, mut audio, mut sink) = make();
    svc.start_shower(38.0, None, &mut hw, &mut audio, &mut sink)
        .unwrap();
    svc.emergency_stop("manual", &mut hw, &mut audio, &mut sink)
        .unwrap();

    let blob = svc.safety_log_blob().unwrap();
    let entries = SafetyLog::decode(&blob).unwrap();
    let kinds: Vec<_> = entries.iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&SafetyLogKind::SessionStarted));
    assert!(kinds.contains(&SafetyLogKind::EmergencyStop));
    assert!(kinds.contains(&SafetyLogKind::SessionEnded));
}
