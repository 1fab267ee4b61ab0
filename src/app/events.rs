//! Outbound application events.
//!
//! The [`ShowerService`](super::service::ShowerService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log, push a notification to the
//! mobile app, forward over a WebSocket.

use serde::Serialize;

use crate::control::flow::{FlowState, ValveState};
use crate::error::{FaultKind, Reason};
use crate::safety::SafetyState;

pub use crate::control::flow::WaterStatus;
pub use crate::safety::SafetyStatus;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum ShowerEvent {
    /// A session began; carries the applied target.
    SessionStarted { target_c: f64, audio_source: Option<heapless::String<64>> },

    SessionEnded,

    FlowStarted { target_c: f64 },

    FlowStopped { emergency: bool },

    /// A temperature request was clamped and applied.
    TemperatureTargetChanged { requested_c: f64, applied_c: f64 },

    DoorOpened,

    DoorClosed,

    /// Notification for a new leak episode.
    LeakDetected { reason: Reason },

    SafetyWarning { reason: Reason },

    SafetyStateChanged { from: SafetyState, to: SafetyState },

    /// Explicit notification that water was shut off in an emergency.
    EmergencyNotification { fault: FaultKind, reason: Reason },

    EmergencyCleared,

    /// Flow fell below the low-flow threshold; water keeps running.
    LowFlow { flow_rate_lpm: f64 },

    /// Audio could not start; the session carries on without it.
    AudioUnavailable { source: heapless::String<64> },

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryData {
    pub safety_state: SafetyState,
    pub flow_state: FlowState,
    pub valve_state: ValveState,
    pub current_temp: f64,
    pub target_temp: f64,
    pub flow_rate_lpm: f64,
    pub session_active: bool,
    pub session_elapsed: f64,
    pub door_time_remaining: Option<f64>,
    pub emergency_active: bool,
}
