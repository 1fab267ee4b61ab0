//! Safety interlock state machine.
//!
//! The monitor runs **every safety tick** on a fresh [`SensorSnapshot`]
//! and derives a [`SafetyState`].  It owns the door timer and the session
//! duration timer.  It never touches actuators: every finding is queued as
//! a [`SafetyEvent`] that the coordinator drains after the tick.
//!
//! ## Per-tick order
//!
//! 1. Timers advance.
//! 2. Door edges: closed→not-closed cancels the door timer, not-closed→closed
//!    arms a fresh one (only during a session).
//! 3. Leak tracking: consecutive-tick counter, escalates after
//!    `leak_escalation_ms`.
//! 4. Transition rules, first match wins:
//!    - latched / button / escalated leak / session timer / door timer with
//!      the door closed → `Emergency`
//!    - leak present → `Danger`
//!    - door timer fired with the door closed → `Warning`
//!    - otherwise `Safe`
//!
//! ## Emergency latch
//!
//! `Emergency` is sticky.  Only [`SafetyMonitor::clear_emergency`] releases
//! it, and only when the latest snapshot shows the door closed, no leak and
//! the button released.

use log::{error, info, warn};
use serde::Serialize;

use crate::config::SystemConfig;
use crate::error::{ClearError, FaultKind, Reason, reason};
use crate::events::EventQueue;
use crate::sensors::{DoorState, SensorSnapshot};
use crate::timer::Countdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyState {
    Safe,
    Warning,
    Danger,
    Emergency,
}

/// Events queued by the monitor for the coordinator to drain.
#[derive(Debug, Clone, PartialEq)]
pub enum SafetyEvent {
    DoorOpened,
    DoorClosed,
    /// First tick of a leak episode.
    LeakDetected,
    SafetyWarning { reason: Reason },
    StateChanged { from: SafetyState, to: SafetyState },
    /// Queued exactly once per emergency latch.
    EmergencyStop { fault: FaultKind, reason: Reason },
}

/// Snapshot returned by [`SafetyMonitor::status`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyStatus {
    pub safety_state: SafetyState,
    pub door_state: DoorState,
    pub leak_detected: bool,
    pub emergency_active: bool,
    pub emergency_reason: Option<Reason>,
    /// Seconds until door auto-shutoff, while the door timer runs.
    pub door_time_remaining: Option<f64>,
    /// Seconds since the current session started.
    pub session_elapsed: f64,
    pub session_active: bool,
}

#[derive(Debug, Clone)]
struct Latch {
    fault: FaultKind,
    reason: Reason,
}

pub struct SafetyMonitor {
    state: SafetyState,
    latch: Option<Latch>,
    last: SensorSnapshot,
    session_active: bool,
    session_elapsed_ticks: u64,
    session_timer: Countdown,
    door_timer: Countdown,
    leak_ticks: u32,
    leak_warned: bool,
    door_timeout_ticks: u32,
    max_session_ticks: u32,
    leak_escalation_ticks: u32,
    tick_secs: f64,
    events: EventQueue<SafetyEvent>,
}

impl SafetyMonitor {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            state: SafetyState::Safe,
            latch: None,
            last: SensorSnapshot::default(),
            session_active: false,
            session_elapsed_ticks: 0,
            session_timer: Countdown::new(),
            door_timer: Countdown::new(),
            leak_ticks: 0,
            leak_warned: false,
            door_timeout_ticks: config.door_timeout_ticks(),
            max_session_ticks: config.max_session_ticks(),
            leak_escalation_ticks: config.leak_escalation_ticks(),
            tick_secs: config.safety_tick_secs(),
            events: EventQueue::new(),
        }
    }

    /// Evaluate one safety tick.  Returns the resulting state.
    pub fn tick(&mut self, snap: &SensorSnapshot) -> SafetyState {
        // 1. Timers
        if self.session_active {
            self.session_elapsed_ticks += 1;
            self.session_timer.tick();
            self.door_timer.tick();
        }

        // 2. Door edges
        let was_closed = self.last.door.is_closed();
        let is_closed = snap.door.is_closed();
        if was_closed && !is_closed {
            if self.session_active {
                self.door_timer.cancel();
            }
            info!("SAFETY | door {:?}", snap.door);
            self.events.push(SafetyEvent::DoorOpened);
        } else if !was_closed && is_closed {
            if self.session_active {
                self.door_timer.arm(self.door_timeout_ticks);
            }
            info!("SAFETY | door closed");
            self.events.push(SafetyEvent::DoorClosed);
        }

        // 3. Leak tracking
        if snap.leak {
            self.leak_ticks = self.leak_ticks.saturating_add(1);
            if self.leak_ticks == 1 {
                warn!("SAFETY | leak detected");
                self.events.push(SafetyEvent::LeakDetected);
            }
        } else {
            self.leak_ticks = 0;
            self.leak_warned = false;
        }
        let leak_escalated = self.leak_ticks > self.leak_escalation_ticks;

        self.last = *snap;

        // 4. Transition rules
        let trigger = if self.latch.is_some() {
            None
        } else if snap.emergency_button {
            Some(FaultKind::EmergencyButton)
        } else if leak_escalated {
            Some(FaultKind::Leak)
        } else if self.session_timer.has_fired() {
            Some(FaultKind::SessionTimeout)
        } else if self.door_timer.has_fired() && is_closed {
            Some(FaultKind::DoorTimeout)
        } else {
            None
        };

        if let Some(fault) = trigger {
            self.latch(fault, reason(fault.default_reason()));
        } else if self.latch.is_none() {
            if self.leak_ticks > 0 {
                self.set_state(SafetyState::Danger);
                if !self.leak_warned {
                    self.leak_warned = true;
                    self.events.push(SafetyEvent::SafetyWarning {
                        reason: reason("Water leak detected"),
                    });
                }
            } else if is_closed && self.session_active && self.door_timer.has_fired() {
                self.set_state(SafetyState::Warning);
            } else {
                self.set_state(SafetyState::Safe);
            }
        }

        self.state
    }

    // ── Session lifecycle ─────────────────────────────────────

    pub fn start_shower_session(&mut self) {
        self.session_active = true;
        self.session_elapsed_ticks = 0;
        self.session_timer.arm(self.max_session_ticks);
        if self.last.door.is_closed() {
            self.door_timer.arm(self.door_timeout_ticks);
        } else {
            self.door_timer.cancel();
        }
        info!(
            "SAFETY | session started (door {:?}, cap {} ticks)",
            self.last.door, self.max_session_ticks
        );
    }

    pub fn stop_shower_session(&mut self) {
        self.session_timer.cancel();
        self.door_timer.cancel();
        if self.session_active {
            info!(
                "SAFETY | session ended after {:.1}s",
                self.session_elapsed_ticks as f64 * self.tick_secs
            );
        }
        self.session_active = false;
        // A leak still on the floor keeps DANGER until the next tick re-derives it.
        if self.latch.is_none() && self.leak_ticks == 0 {
            self.set_state(SafetyState::Safe);
        }
    }

    // ── Emergency latch ───────────────────────────────────────

    /// Latch EMERGENCY.  Returns `true` only for the call that set the latch.
    pub fn emergency_stop(&mut self, fault: FaultKind, why: &str) -> bool {
        self.latch(fault, reason(why))
    }

    pub fn clear_emergency(&mut self) -> Result<(), ClearError> {
        if self.latch.is_none() {
            return Ok(());
        }
        if !self.last.door.is_closed() {
            return Err(ClearError::DoorNotClosed);
        }
        if self.last.leak {
            return Err(ClearError::LeakPresent);
        }
        if self.last.emergency_button {
            return Err(ClearError::ButtonPressed);
        }
        self.latch = None;
        if self.session_timer.has_fired() {
            self.session_timer.cancel();
        }
        if self.door_timer.has_fired() {
            self.door_timer.cancel();
        }
        info!("SAFETY EMERGENCY CLEARED");
        self.set_state(SafetyState::Safe);
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self) -> SafetyStatus {
        SafetyStatus {
            safety_state: self.state,
            door_state: self.last.door,
            leak_detected: self.leak_ticks > 0,
            emergency_active: self.latch.is_some(),
            emergency_reason: self.latch.as_ref().map(|l| l.reason.clone()),
            door_time_remaining: self
                .door_timer
                .remaining()
                .map(|t| f64::from(t) * self.tick_secs),
            session_elapsed: self.session_elapsed_ticks as f64 * self.tick_secs,
            session_active: self.session_active,
        }
    }

    pub fn state(&self) -> SafetyState {
        self.state
    }

    pub fn is_emergency(&self) -> bool {
        self.latch.is_some()
    }

    /// Fault that set the current latch.
    pub fn emergency_fault(&self) -> Option<FaultKind> {
        self.latch.as_ref().map(|l| l.fault)
    }

    pub fn session_active(&self) -> bool {
        self.session_active
    }

    pub fn pop_event(&mut self) -> Option<SafetyEvent> {
        self.events.pop()
    }

    // ── Internal ──────────────────────────────────────────────

    fn latch(&mut self, fault: FaultKind, why: Reason) -> bool {
        if self.latch.is_some() {
            return false;
        }
        error!("SAFETY EMERGENCY: {fault} ({why})");
        self.latch = Some(Latch {
            fault,
            reason: why.clone(),
        });
        self.set_state(SafetyState::Emergency);
        self.events.push(SafetyEvent::EmergencyStop { fault, reason: why });
        true
    }

    fn set_state(&mut self, to: SafetyState) {
        if to == self.state {
            return;
        }
        let from = self.state;
        self.state = to;
        match to {
            SafetyState::Safe => info!("SAFETY | {:?} -> {:?}", from, to),
            _ => warn!("SAFETY | {:?} -> {:?}", from, to),
        }
        self.events.push(SafetyEvent::StateChanged { from, to });
    }
}
