//! Safety journal.
//!
//! Keeps the 32 most recent safety-relevant entries (door edges, leaks,
//! state changes, emergency stops and clears) in a fixed-capacity ring.
//! The journal can be exported as a compact postcard blob for the
//! `get_safety_log` command.
//!
//! [`UsageMeter`] accumulates water usage across sessions for the
//! `get_usage_stats` command.

use heapless::Deque;
use serde::{Deserialize, Serialize};

use crate::error::{Reason, reason};

const SAFETY_LOG_SLOTS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLogKind {
    SessionStarted,
    SessionEnded,
    DoorOpened,
    DoorClosed,
    LeakDetected,
    Warning,
    StateChanged,
    EmergencyStop,
    EmergencyCleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyLogEntry {
    /// Safety tick at which the entry was recorded.
    pub tick: u64,
    pub kind: SafetyLogKind,
    pub severity: Severity,
    pub message: Reason,
}

/// Ring of the most recent safety entries; oldest is evicted first.
#[derive(Debug, Default)]
pub struct SafetyLog {
    entries: Deque<SafetyLogEntry, SAFETY_LOG_SLOTS>,
    total: u64,
}

impl SafetyLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, tick: u64, kind: SafetyLogKind, severity: Severity, message: &str) {
        if self.entries.is_full() {
            self.entries.pop_front();
        }
        let _ = self.entries.push_back(SafetyLogEntry {
            tick,
            kind,
            severity,
            message: reason(message),
        });
        self.total = self.total.saturating_add(1);
    }

    /// Entries oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &SafetyLogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries recorded since startup, including evicted ones.
    pub fn total_recorded(&self) -> u64 {
        self.total
    }

    /// Postcard-encoded copy of the retained entries, oldest first.
    pub fn encode(&self) -> Result<Vec<u8>, postcard::Error> {
        let entries: Vec<&SafetyLogEntry> = self.entries.iter().collect();
        postcard::to_allocvec(&entries)
    }

    /// Decode a blob produced by [`SafetyLog::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Vec<SafetyLogEntry>, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

// ── Usage statistics ─────────────────────────────────────────

/// Snapshot returned by [`UsageMeter::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsageStats {
    pub total_flow_litres: f64,
    pub session_count: u32,
    /// Mean final target of completed sessions (°C).
    pub average_temperature_c: Option<f64>,
    /// Mean length of completed sessions (minutes).
    pub average_duration_min: Option<f64>,
}

/// Running totals since startup.
#[derive(Debug, Default)]
pub struct UsageMeter {
    litres: f64,
    sessions: u32,
    temperature_sum_c: f64,
    duration_sum_secs: f64,
}

impl UsageMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the water delivered at `rate_lpm` over `secs`.
    pub fn add_flow(&mut self, rate_lpm: f64, secs: f64) {
        if rate_lpm.is_finite() && rate_lpm > 0.0 && secs > 0.0 {
            self.litres += rate_lpm * secs / 60.0;
        }
    }

    pub fn record_session(&mut self, target_c: f64, duration_secs: f64) {
        self.sessions = self.sessions.saturating_add(1);
        self.temperature_sum_c += target_c;
        self.duration_sum_secs += duration_secs.max(0.0);
    }

    pub fn stats(&self) -> UsageStats {
        let n = f64::from(self.sessions);
        let mean = |sum: f64| (self.sessions > 0).then(|| sum / n);
        UsageStats {
            total_flow_litres: self.litres,
            session_count: self.sessions,
            average_temperature_c: mean(self.temperature_sum_c),
            average_duration_min: mean(self.duration_sum_secs / 60.0),
        }
    }
}
