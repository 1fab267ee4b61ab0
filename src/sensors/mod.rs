//! Safety sensor inputs and the per-tick [`SensorSnapshot`].
//!
//! The safety loop reads every safety input once per tick through the
//! [`SensorPort`] and hands the resulting snapshot to the
//! [`SafetyMonitor`](crate::safety::SafetyMonitor).  Nothing in the
//! domain reads a sensor twice in one tick.

pub mod contact;

use serde::Serialize;

use crate::app::ports::SensorPort;

/// Door position as reported by the reed switch.
///
/// `Unknown` covers an unreadable or disconnected sensor and is never
/// treated as closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
    Open,
    Closed,
    #[default]
    Unknown,
}

impl DoorState {
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Unified safety-input reading for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorSnapshot {
    pub door: DoorState,
    pub leak: bool,
    pub emergency_button: bool,
}

impl SensorSnapshot {
    /// Read every safety input once.
    pub fn read(port: &mut impl SensorPort) -> Self {
        Self {
            door: port.read_door(),
            leak: port.read_leak(),
            emergency_button: port.read_emergency_button(),
        }
    }
}
