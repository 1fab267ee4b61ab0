//! Application service, the hexagonal core.
//!
//! [`ShowerService`] owns the flow controller, the safety monitor, the
//! current [`Session`], the safety journal and the usage meter.  It is the only place a
//! session is created or destroyed and the only place a safety finding
//! turns into a valve command.  All I/O flows through port traits
//! injected at call sites, making the entire service testable with mock
//! adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!                 │        ShowerService        │
//! ActuatorPort ◀──│  Safety · Flow · Session    │ ──▶ AudioPort
//!                 └─────────────────────────────┘
//! ```
//!
//! ## Queue-and-drain
//!
//! Neither state machine calls out while it evaluates.  After every tick
//! or command the service drains both event queues until they are empty:
//! safety emergencies and leaks are answered with the stop path, flow
//! faults are routed back into the safety latch, everything else is
//! forwarded to the sink.

use log::{error, info, warn};

use crate::config::SystemConfig;
use crate::control::flow::{FlowController, FlowEvent};
use crate::diagnostics::{
    SafetyLog, SafetyLogEntry, SafetyLogKind, Severity, UsageMeter, UsageStats,
};
use crate::error::{FaultKind, Result, SessionError, reason, reason_fmt};
use crate::safety::{SafetyEvent, SafetyMonitor, SafetyState};
use crate::sensors::SensorSnapshot;

use super::commands::{CommandReply, ShowerCommand};
use super::events::{SafetyStatus, ShowerEvent, TelemetryData, WaterStatus};
use super::ports::{ActuatorPort, AudioPort, EventSink, SensorPort};

/// Notification text for a leak episode.
pub const LEAK_NOTIFICATION: &str = "Water leak detected!";

// ───────────────────────────────────────────────────────────────
// Session
// ───────────────────────────────────────────────────────────────

/// One running shower.  Exists only between a successful start and the
/// matching stop or emergency stop.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Safety tick at which the session began.
    pub started_tick: u64,
    /// Applied (clamped) target temperature.
    pub target_c: f64,
    pub audio_source: Option<heapless::String<64>>,
}

// ───────────────────────────────────────────────────────────────
// ShowerService
// ───────────────────────────────────────────────────────────────

pub struct ShowerService {
    config: SystemConfig,
    flow: FlowController,
    safety: SafetyMonitor,
    session: Option<Session>,
    journal: SafetyLog,
    usage: UsageMeter,
    safety_ticks: u64,
    water_ticks: u64,
}

impl ShowerService {
    pub fn new(config: SystemConfig) -> Self {
        let flow = FlowController::new(&config);
        let safety = SafetyMonitor::new(&config);
        info!(
            "ShowerService ready: {:.0}-{:.0}°C, door timeout {}s, session cap {}s",
            config.min_temperature_c,
            config.max_temperature_c,
            config.door_timeout_secs,
            config.max_session_secs
        );
        Self {
            config,
            flow,
            safety,
            session: None,
            journal: SafetyLog::new(),
            usage: UsageMeter::new(),
            safety_ticks: 0,
            water_ticks: 0,
        }
    }

    // ── Session lifecycle ─────────────────────────────────────

    /// Start a session.  Returns the applied (clamped) temperature.
    pub fn start_shower(
        &mut self,
        temperature: f64,
        audio_source: Option<&str>,
        hw: &mut impl ActuatorPort,
        audio: &mut impl AudioPort,
        sink: &mut impl EventSink,
    ) -> Result<f64> {
        if self.session.is_some() {
            return Err(SessionError::SessionAlreadyActive.into());
        }
        if self.safety.is_emergency() {
            return Err(SessionError::EmergencyActive.into());
        }

        let applied = self.flow.start_flow(temperature, hw)?;
        let source = audio_source.map(reason);
        self.session = Some(Session {
            started_tick: self.safety_ticks,
            target_c: applied,
            audio_source: source.clone(),
        });

        if let Some(src) = &source {
            match audio.start_playback(src) {
                Ok(()) => info!("Audio playing from {src}"),
                Err(e) => {
                    warn!("Audio unavailable ({e}), continuing without it");
                    sink.emit(&ShowerEvent::AudioUnavailable { source: src.clone() });
                }
            }
        }

        self.safety.start_shower_session();
        self.journal.record(
            self.safety_ticks,
            SafetyLogKind::SessionStarted,
            Severity::Info,
            "Shower session started",
        );
        info!("SESSION | started at {:.1}°C", applied);
        sink.emit(&ShowerEvent::SessionStarted {
            target_c: applied,
            audio_source: source,
        });

        self.drain(hw, audio, sink);
        Ok(applied)
    }

    /// Stop the running session.  A no-op when none is running.
    pub fn stop_shower(
        &mut self,
        hw: &mut impl ActuatorPort,
        audio: &mut impl AudioPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        if self.session.is_none() {
            return Ok(());
        }
        self.flow.stop_flow(hw);
        self.end_session(audio, sink);
        self.drain(hw, audio, sink);
        Ok(())
    }

    /// Manually triggered emergency stop.
    pub fn emergency_stop(
        &mut self,
        why: &str,
        hw: &mut impl ActuatorPort,
        audio: &mut impl AudioPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        if !self.safety.emergency_stop(FaultKind::Manual, why) {
            // Already latched; make sure nothing is left running.
            self.teardown(why, hw, audio, sink);
        }
        self.drain(hw, audio, sink);
        Ok(())
    }

    /// Release the emergency latch once the bathroom is all clear.
    pub fn clear_emergency(
        &mut self,
        hw: &mut impl ActuatorPort,
        audio: &mut impl AudioPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let was_latched = self.safety.is_emergency();
        self.safety.clear_emergency()?;
        if was_latched {
            self.journal.record(
                self.safety_ticks,
                SafetyLogKind::EmergencyCleared,
                Severity::Info,
                "Emergency cleared",
            );
            sink.emit(&ShowerEvent::EmergencyCleared);
        }
        self.drain(hw, audio, sink);
        Ok(())
    }

    // ── Setpoints ─────────────────────────────────────────────

    /// Returns the applied (clamped) target.
    pub fn set_temperature(&mut self, requested: f64, sink: &mut impl EventSink) -> f64 {
        let applied = self.flow.set_temperature(requested);
        if let Some(session) = &mut self.session {
            session.target_c = applied;
        }
        sink.emit(&ShowerEvent::TemperatureTargetChanged {
            requested_c: requested,
            applied_c: applied,
        });
        applied
    }

    /// Returns the flow rate in effect afterwards.
    pub fn set_flow_rate(&mut self, requested: f64) -> f64 {
        self.flow.set_flow_rate(requested)
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One safety-loop iteration: read inputs → evaluate → drain.
    pub fn safety_tick(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        audio: &mut impl AudioPort,
        sink: &mut impl EventSink,
    ) {
        self.safety_ticks += 1;
        let snapshot = SensorSnapshot::read(hw);
        self.safety.tick(&snapshot);
        self.drain(hw, audio, sink);
    }

    /// One water-loop iteration: read probes → control step → drain.
    pub fn water_tick(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        audio: &mut impl AudioPort,
        sink: &mut impl EventSink,
    ) {
        self.water_ticks += 1;
        if self.flow.is_active() {
            let rate = self.flow.status().flow_rate_lpm;
            self.usage.add_flow(rate, self.config.control_tick_secs());
        }
        self.flow.tick(self.water_ticks, hw);
        self.drain(hw, audio, sink);
    }

    /// Both loops, safety first.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        audio: &mut impl AudioPort,
        sink: &mut impl EventSink,
    ) {
        self.safety_tick(hw, audio, sink);
        self.water_tick(hw, audio, sink);
    }

    // ── Command handling ──────────────────────────────────────

    /// Single entry point for external command surfaces.
    pub fn handle_command(
        &mut self,
        cmd: ShowerCommand,
        hw: &mut impl ActuatorPort,
        audio: &mut impl AudioPort,
        sink: &mut impl EventSink,
    ) -> Result<CommandReply> {
        match cmd {
            ShowerCommand::StartShower {
                temperature,
                audio_source,
            } => {
                let target = temperature.unwrap_or(self.config.default_temperature_c);
                let applied =
                    self.start_shower(target, audio_source.as_deref(), hw, audio, sink)?;
                Ok(CommandReply::Temperature(applied))
            }
            ShowerCommand::StopShower => {
                self.stop_shower(hw, audio, sink)?;
                Ok(CommandReply::Done)
            }
            ShowerCommand::EmergencyStop { reason } => {
                self.emergency_stop(&reason, hw, audio, sink)?;
                Ok(CommandReply::Done)
            }
            ShowerCommand::ClearEmergency => {
                self.clear_emergency(hw, audio, sink)?;
                Ok(CommandReply::Done)
            }
            ShowerCommand::SetTemperature(t) => {
                Ok(CommandReply::Temperature(self.set_temperature(t, sink)))
            }
            ShowerCommand::SetFlowRate(r) => Ok(CommandReply::FlowRate(self.set_flow_rate(r))),
            ShowerCommand::GetWaterStatus => Ok(CommandReply::Water(self.water_status())),
            ShowerCommand::GetSafetyStatus => Ok(CommandReply::Safety(self.safety_status())),
            ShowerCommand::GetSafetyLog => Ok(CommandReply::SafetyLog(self.safety_log())),
            ShowerCommand::GetUsageStats => Ok(CommandReply::Usage(self.usage_stats())),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn water_status(&self) -> WaterStatus {
        self.flow.status()
    }

    pub fn safety_status(&self) -> SafetyStatus {
        self.safety.status()
    }

    pub fn build_telemetry(&self) -> TelemetryData {
        let water = self.flow.status();
        let safety = self.safety.status();
        TelemetryData {
            safety_state: safety.safety_state,
            flow_state: water.flow_state,
            valve_state: water.valve_state,
            current_temp: water.current_temp,
            target_temp: water.target_temp,
            flow_rate_lpm: water.flow_rate_lpm,
            session_active: self.session.is_some(),
            session_elapsed: safety.session_elapsed,
            door_time_remaining: safety.door_time_remaining,
            emergency_active: safety.emergency_active,
        }
    }

    /// Emit a telemetry snapshot through the sink.
    pub fn emit_telemetry(&self, sink: &mut impl EventSink) {
        sink.emit(&ShowerEvent::Telemetry(self.build_telemetry()));
    }

    /// Journal entries, oldest first.
    pub fn safety_log(&self) -> Vec<SafetyLogEntry> {
        self.journal.entries().cloned().collect()
    }

    /// Water delivered and completed sessions since startup.
    pub fn usage_stats(&self) -> UsageStats {
        self.usage.stats()
    }

    /// Journal as a postcard blob.
    pub fn safety_log_blob(&self) -> core::result::Result<Vec<u8>, postcard::Error> {
        self.journal.encode()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn safety_state(&self) -> SafetyState {
        self.safety.state()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Safety ticks executed since startup.
    pub fn safety_ticks(&self) -> u64 {
        self.safety_ticks
    }

    // ── Internal ──────────────────────────────────────────────

    /// Drain both queues until neither produces anything new.
    fn drain(
        &mut self,
        hw: &mut impl ActuatorPort,
        audio: &mut impl AudioPort,
        sink: &mut impl EventSink,
    ) {
        loop {
            let mut progressed = false;
            while let Some(event) = self.flow.pop_event() {
                progressed = true;
                self.on_flow_event(event, hw, audio, sink);
            }
            while let Some(event) = self.safety.pop_event() {
                progressed = true;
                self.on_safety_event(event, hw, audio, sink);
            }
            if !progressed {
                break;
            }
        }
    }

    fn on_flow_event(
        &mut self,
        event: FlowEvent,
        hw: &mut impl ActuatorPort,
        audio: &mut impl AudioPort,
        sink: &mut impl EventSink,
    ) {
        match event {
            FlowEvent::Started { target_c } => sink.emit(&ShowerEvent::FlowStarted { target_c }),
            FlowEvent::Stopped { emergency } => sink.emit(&ShowerEvent::FlowStopped { emergency }),
            FlowEvent::LowFlow { rate_lpm } => {
                let msg = reason_fmt(format_args!("Low flow rate {rate_lpm:.1} L/min"));
                self.journal
                    .record(self.safety_ticks, SafetyLogKind::Warning, Severity::Warning, &msg);
                sink.emit(&ShowerEvent::LowFlow {
                    flow_rate_lpm: rate_lpm,
                });
            }
            FlowEvent::Fault { fault, reason } => {
                error!("FLOW FAULT: {fault} ({reason})");
                if !self.safety.emergency_stop(fault, &reason) {
                    self.teardown(&reason, hw, audio, sink);
                }
            }
        }
    }

    fn on_safety_event(
        &mut self,
        event: SafetyEvent,
        hw: &mut impl ActuatorPort,
        audio: &mut impl AudioPort,
        sink: &mut impl EventSink,
    ) {
        let tick = self.safety_ticks;
        match event {
            SafetyEvent::DoorOpened => {
                self.journal
                    .record(tick, SafetyLogKind::DoorOpened, Severity::Info, "Door opened");
                sink.emit(&ShowerEvent::DoorOpened);
            }
            SafetyEvent::DoorClosed => {
                self.journal
                    .record(tick, SafetyLogKind::DoorClosed, Severity::Info, "Door closed");
                sink.emit(&ShowerEvent::DoorClosed);
            }
            SafetyEvent::LeakDetected => {
                self.journal.record(
                    tick,
                    SafetyLogKind::LeakDetected,
                    Severity::Critical,
                    LEAK_NOTIFICATION,
                );
                self.teardown(LEAK_NOTIFICATION, hw, audio, sink);
                sink.emit(&ShowerEvent::LeakDetected {
                    reason: reason(LEAK_NOTIFICATION),
                });
            }
            SafetyEvent::SafetyWarning { reason } => {
                self.journal
                    .record(tick, SafetyLogKind::Warning, Severity::Warning, &reason);
                sink.emit(&ShowerEvent::SafetyWarning { reason });
            }
            SafetyEvent::StateChanged { from, to } => {
                let severity = match to {
                    SafetyState::Safe => Severity::Info,
                    SafetyState::Warning | SafetyState::Danger => Severity::Warning,
                    SafetyState::Emergency => Severity::Critical,
                };
                let msg = reason_fmt(format_args!("{from:?} -> {to:?}"));
                self.journal
                    .record(tick, SafetyLogKind::StateChanged, severity, &msg);
                sink.emit(&ShowerEvent::SafetyStateChanged { from, to });
            }
            SafetyEvent::EmergencyStop { fault, reason } => {
                self.journal
                    .record(tick, SafetyLogKind::EmergencyStop, Severity::Critical, &reason);
                self.teardown(&reason, hw, audio, sink);
                sink.emit(&ShowerEvent::EmergencyNotification { fault, reason });
            }
        }
    }

    /// Stop path shared by every fatal finding: water off first, then the
    /// session.  Idempotent.
    fn teardown(
        &mut self,
        why: &str,
        hw: &mut impl ActuatorPort,
        audio: &mut impl AudioPort,
        sink: &mut impl EventSink,
    ) {
        self.flow.emergency_stop(hw, why);
        if self.session.is_some() {
            self.end_session(audio, sink);
        }
    }

    fn end_session(&mut self, audio: &mut impl AudioPort, sink: &mut impl EventSink) {
        let Some(session) = self.session.take() else {
            return;
        };
        if session.audio_source.is_some() {
            audio.stop_playback();
        }
        self.safety.stop_shower_session();
        let elapsed = self.safety_ticks.saturating_sub(session.started_tick);
        let elapsed_secs = elapsed as f64 * self.config.safety_tick_secs();
        self.usage.record_session(session.target_c, elapsed_secs);
        self.journal.record(
            self.safety_ticks,
            SafetyLogKind::SessionEnded,
            Severity::Info,
            "Shower session ended",
        );
        info!("SESSION | ended after {:.1}s", elapsed_secs);
        sink.emit(&ShowerEvent::SessionEnded);
    }
}
