//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade.  A push-notification or WebSocket adapter would
//! implement the same trait and sit next to this one on the
//! [`EventBus`](crate::app::bus::EventBus).

use log::{error, info, warn};

use crate::app::events::ShowerEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`ShowerEvent`].
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ShowerEvent) {
        match event {
            ShowerEvent::Telemetry(t) => {
                info!(
                    "TELEM | safety={:?} flow={:?} valve={:?} | T={:.1}/{:.1}\u{00b0}C | \
                     {:.1} L/min | session={} {:.0}s | door_left={} | emergency={}",
                    t.safety_state,
                    t.flow_state,
                    t.valve_state,
                    t.current_temp,
                    t.target_temp,
                    t.flow_rate_lpm,
                    t.session_active,
                    t.session_elapsed,
                    t.door_time_remaining
                        .map_or_else(|| "-".to_string(), |s| format!("{s:.0}s")),
                    t.emergency_active,
                );
            }
            ShowerEvent::SessionStarted {
                target_c,
                audio_source,
            } => {
                info!(
                    "SESSION | started at {:.1}\u{00b0}C, audio={}",
                    target_c,
                    audio_source.as_deref().unwrap_or("none")
                );
            }
            ShowerEvent::SessionEnded => info!("SESSION | ended"),
            ShowerEvent::FlowStarted { target_c } => {
                info!("WATER | flow started, target {:.1}\u{00b0}C", target_c);
            }
            ShowerEvent::FlowStopped { emergency } => {
                info!("WATER | flow stopped{}", if *emergency { " (emergency)" } else { "" });
            }
            ShowerEvent::TemperatureTargetChanged {
                requested_c,
                applied_c,
            } => {
                info!(
                    "WATER | target {:.1}\u{00b0}C (requested {:.1}\u{00b0}C)",
                    applied_c, requested_c
                );
            }
            ShowerEvent::DoorOpened => info!("DOOR | opened"),
            ShowerEvent::DoorClosed => info!("DOOR | closed"),
            ShowerEvent::LeakDetected { reason } => warn!("LEAK | {}", reason),
            ShowerEvent::SafetyWarning { reason } => warn!("WARN | {}", reason),
            ShowerEvent::SafetyStateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            ShowerEvent::EmergencyNotification { fault, reason } => {
                error!("EMERGENCY | {} ({})", reason, fault);
            }
            ShowerEvent::EmergencyCleared => info!("EMERGENCY | cleared"),
            ShowerEvent::LowFlow { flow_rate_lpm } => {
                warn!("WATER | low flow {:.1} L/min", flow_rate_lpm);
            }
            ShowerEvent::AudioUnavailable { source } => {
                warn!("AUDIO | {} unavailable", source);
            }
        }
    }
}
