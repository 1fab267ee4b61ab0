//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (mobile app,
//! web UI, local panel) that the
//! [`ShowerService`](super::service::ShowerService) interprets and acts
//! upon.  Replies carry the applied values, not the requested ones.

use crate::diagnostics::{SafetyLogEntry, UsageStats};
use crate::error::Reason;

use super::events::{SafetyStatus, WaterStatus};

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum ShowerCommand {
    /// Start a session.  `None` uses the configured default temperature.
    StartShower {
        temperature: Option<f64>,
        audio_source: Option<heapless::String<64>>,
    },

    StopShower,

    /// Manually triggered emergency stop.
    EmergencyStop { reason: Reason },

    ClearEmergency,

    SetTemperature(f64),

    SetFlowRate(f64),

    GetWaterStatus,

    GetSafetyStatus,

    GetSafetyLog,

    GetUsageStats,
}

/// Successful command outcomes.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandReply {
    /// Command applied, nothing to report.
    Done,
    /// Applied temperature (°C) after clamping.
    Temperature(f64),
    /// Applied flow rate (L/min) after clamping.
    FlowRate(f64),
    Water(WaterStatus),
    Safety(SafetyStatus),
    SafetyLog(Vec<SafetyLogEntry>),
    Usage(UsageStats),
}
