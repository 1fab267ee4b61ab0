//! Tick-driven countdown timers for the safety loop.
//!
//! A [`Countdown`] carries no clock of its own: the owner calls
//! [`Countdown::tick`] once per loop iteration, so time only advances when
//! the safety loop runs and tests can step it deterministically.
//!
//! ```text
//!   idle ──arm(n)──▶ armed ──n ticks──▶ fired
//!                      │                  │
//!                      └──cancel()──▶ idle ◀──cancel()
//! ```

// ═══════════════════════════════════════════════════════════════
//  Countdown
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Armed { remaining: u32 },
    Fired,
}

/// One-shot countdown measured in loop ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    phase: Phase,
}

impl Countdown {
    pub const fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    /// Start a fresh countdown, discarding any previous one.
    /// A zero duration fires on the next tick.
    pub fn arm(&mut self, ticks: u32) {
        self.phase = Phase::Armed {
            remaining: ticks.max(1),
        };
    }

    /// Stop the countdown and forget that it ever fired.
    pub fn cancel(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Advance one tick.  Returns `true` only on the tick the countdown
    /// reaches zero.
    pub fn tick(&mut self) -> bool {
        if let Phase::Armed { remaining } = self.phase {
            let remaining = remaining.saturating_sub(1);
            if remaining == 0 {
                self.phase = Phase::Fired;
                return true;
            }
            self.phase = Phase::Armed { remaining };
        }
        false
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.phase, Phase::Armed { .. })
    }

    /// Fired and not yet cancelled or re-armed.
    pub fn has_fired(&self) -> bool {
        matches!(self.phase, Phase::Fired)
    }

    /// Ticks left while armed.
    pub fn remaining(&self) -> Option<u32> {
        match self.phase {
            Phase::Armed { remaining } => Some(remaining),
            _ => None,
        }
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}
