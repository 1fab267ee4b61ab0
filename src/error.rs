//! Unified error types for the SmartShower controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! command surface's error handling uniform.  All variants are `Copy` so
//! they can be passed through the coordinator and the command channel
//! without allocation.
//!
//! [`FaultKind`] is not an error in the `Result` sense: it names the
//! conditions that are fatal to a shower session and always lead to an
//! emergency stop.

use core::fmt;
use core::fmt::Write as _;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible command funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A session lifecycle request was rejected.
    Session(SessionError),
    /// The flow controller refused to start.
    Flow(FlowError),
    /// The emergency latch could not be cleared.
    Clear(ClearError),
    /// The audio collaborator failed.
    Audio(AudioError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(e) => write!(f, "session: {e}"),
            Self::Flow(e) => write!(f, "flow: {e}"),
            Self::Clear(e) => write!(f, "clear emergency: {e}"),
            Self::Audio(e) => write!(f, "audio: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// A shower session is already running.
    SessionAlreadyActive,
    /// The emergency latch is set; clear it first.
    EmergencyActive,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionAlreadyActive => write!(f, "session already active"),
            Self::EmergencyActive => write!(f, "emergency stop is latched"),
        }
    }
}

impl From<SessionError> for Error {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

// ---------------------------------------------------------------------------
// Flow errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowError {
    /// Flow is already running.
    AlreadyActive,
    /// The requested setpoint is NaN or infinite.
    NonFiniteSetpoint,
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyActive => write!(f, "flow already active"),
            Self::NonFiniteSetpoint => write!(f, "setpoint is not a finite number"),
        }
    }
}

impl From<FlowError> for Error {
    fn from(e: FlowError) -> Self {
        Self::Flow(e)
    }
}

// ---------------------------------------------------------------------------
// Clear-emergency errors
// ---------------------------------------------------------------------------

/// Why an emergency latch may not be released yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearError {
    /// The door does not read closed.
    DoorNotClosed,
    /// The leak sensor is still wet.
    LeakPresent,
    /// The emergency button is still held.
    ButtonPressed,
}

impl fmt::Display for ClearError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DoorNotClosed => write!(f, "door not closed"),
            Self::LeakPresent => write!(f, "leak still present"),
            Self::ButtonPressed => write!(f, "emergency button still pressed"),
        }
    }
}

impl From<ClearError> for Error {
    fn from(e: ClearError) -> Self {
        Self::Clear(e)
    }
}

// ---------------------------------------------------------------------------
// Audio errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioError {
    /// The requested source does not exist or cannot be reached.
    SourceUnavailable,
    /// The player accepted the source but failed to start.
    PlaybackFailed,
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceUnavailable => write!(f, "audio source unavailable"),
            Self::PlaybackFailed => write!(f, "playback failed"),
        }
    }
}

impl From<AudioError> for Error {
    fn from(e: AudioError) -> Self {
        Self::Audio(e)
    }
}

// ---------------------------------------------------------------------------
// Session-fatal faults
// ---------------------------------------------------------------------------

/// Conditions that end a session with an emergency stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    EmergencyButton,
    Leak,
    DoorTimeout,
    SessionTimeout,
    OverTemperature,
    TemperatureSensor,
    OverPressure,
    FlowCeiling,
    /// Operator-requested stop through the command surface.
    Manual,
}

impl FaultKind {
    /// Reason string attached to the emergency notification when the
    /// trigger did not supply its own.
    pub const fn default_reason(self) -> &'static str {
        match self {
            Self::EmergencyButton => "Emergency button pressed",
            Self::Leak => "Water leak detected!",
            Self::DoorTimeout => "Door timeout - Auto-shutoff",
            Self::SessionTimeout => "Maximum shower duration exceeded",
            Self::OverTemperature => "Water temperature above limit",
            Self::TemperatureSensor => "Invalid water temperature reading",
            Self::OverPressure => "Water pressure above limit",
            Self::FlowCeiling => "Flow rate above ceiling",
            Self::Manual => "Emergency stop activated!",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmergencyButton => write!(f, "emergency button"),
            Self::Leak => write!(f, "leak"),
            Self::DoorTimeout => write!(f, "door timeout"),
            Self::SessionTimeout => write!(f, "session timeout"),
            Self::OverTemperature => write!(f, "over temperature"),
            Self::TemperatureSensor => write!(f, "temperature sensor"),
            Self::OverPressure => write!(f, "over pressure"),
            Self::FlowCeiling => write!(f, "flow ceiling"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

// ---------------------------------------------------------------------------
// Reason strings
// ---------------------------------------------------------------------------

/// Maximum reason length in bytes.
pub const REASON_CAP: usize = 64;

/// Fixed-capacity human-readable reason attached to stops and log entries.
pub type Reason = heapless::String<REASON_CAP>;

/// Build a [`Reason`], truncating at a char boundary when `text` is too long.
pub fn reason(text: &str) -> Reason {
    let mut out = Reason::new();
    for ch in text.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

/// Format into a [`Reason`], keeping whatever fits.
pub fn reason_fmt(args: fmt::Arguments<'_>) -> Reason {
    struct Truncating(Reason);

    impl fmt::Write for Truncating {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            for ch in s.chars() {
                if self.0.push(ch).is_err() {
                    break;
                }
            }
            Ok(())
        }
    }

    let mut out = Truncating(Reason::new());
    let _ = out.write_fmt(args);
    out.0
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
