//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ShowerService (domain)
//! ```
//!
//! Driven adapters (sensors, valves, audio, event sinks, config) implement
//! these traits.  The [`ShowerService`](super::service::ShowerService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! ## Fail-safe notes
//!
//! - **SensorPort** implementations MUST report an unreadable door as
//!   [`DoorState::Unknown`], never as closed.
//! - **ConfigPort** implementations MUST validate before handing out a
//!   config.

use crate::config::SystemConfig;
use crate::error::AudioError;
use crate::sensors::DoorState;

use super::events::ShowerEvent;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain sensor data.
pub trait SensorPort {
    /// Door reed switch position.
    fn read_door(&mut self) -> DoorState;

    /// `true` while the floor leak probe is wet.
    fn read_leak(&mut self) -> bool;

    /// `true` while the emergency button is held.
    fn read_emergency_button(&mut self) -> bool;

    /// Outlet water temperature, when a probe is fitted.
    fn read_water_temperature(&mut self) -> Option<f64> {
        None
    }

    /// Supply pressure in bar, when a transducer is fitted.
    fn read_pressure_bar(&mut self) -> Option<f64> {
        None
    }
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command valves.
pub trait ActuatorPort {
    fn set_hot_valve(&mut self, open: bool);

    fn set_cold_valve(&mut self, open: bool);

    /// Mixer position, 0.0 = full cold, 1.0 = full hot.
    fn set_mixer_position(&mut self, position: f64);
}

// ───────────────────────────────────────────────────────────────
// Audio port (driven adapter: domain → media player)
// ───────────────────────────────────────────────────────────────

/// Media playback collaborator.  Failures never stop the water.
pub trait AudioPort {
    fn start_playback(&mut self, source: &str) -> Result<(), AudioError>;

    fn stop_playback(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / notifications)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`ShowerEvent`]s through this port.
/// Adapters decide where they go (log, push notification, WebSocket).
pub trait EventSink {
    fn emit(&mut self, event: &ShowerEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: file/NVS → domain)
// ───────────────────────────────────────────────────────────────

/// Loads system configuration.
///
/// Implementations MUST call [`SystemConfig::validate`] and reject invalid
/// ranges with [`ConfigError::ValidationFailed`] rather than clamping, so
/// a bad file cannot silently disable a safety limit.
pub trait ConfigPort {
    fn load(&self) -> Result<SystemConfig, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found (first boot).
    NotFound,
    /// Stored config failed to parse.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::NotFound => Self::Config("not found"),
            ConfigError::Corrupted => Self::Config("corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::IoError => Self::Config("I/O error"),
        }
    }
}
