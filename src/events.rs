//! Bounded queue-and-drain event buffer.
//!
//! The safety and flow state machines never call out while they evaluate.
//! They push events into their own [`EventQueue`]; the coordinator drains
//! the queues after the tick returns.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ SafetyMonitor│────▶│  EventQueue  │────▶│              │
//! └──────────────┘     └──────────────┘     │ ShowerService│
//! ┌──────────────┐     ┌──────────────┐     │  (drain)     │
//! │FlowController│────▶│  EventQueue  │────▶│              │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```

use heapless::Deque;
use log::error;

/// Default capacity for state-machine event queues.
pub const EVENT_QUEUE_CAP: usize = 16;

/// FIFO of pending events with a fixed capacity.
#[derive(Debug)]
pub struct EventQueue<T, const N: usize = EVENT_QUEUE_CAP> {
    buf: Deque<T, N>,
    dropped: u32,
}

impl<T, const N: usize> EventQueue<T, N> {
    pub const fn new() -> Self {
        Self {
            buf: Deque::new(),
            dropped: 0,
        }
    }

    /// Push an event.  Returns `false` if the queue is full (event dropped).
    pub fn push(&mut self, event: T) -> bool {
        if self.buf.push_back(event).is_err() {
            self.dropped = self.dropped.saturating_add(1);
            error!("event queue full ({} slots), event dropped", N);
            return false;
        }
        true
    }

    /// Pop the oldest pending event.
    pub fn pop(&mut self) -> Option<T> {
        self.buf.pop_front()
    }

    /// Drain all pending events into a callback, in FIFO order.
    pub fn drain(&mut self, mut handler: impl FnMut(T)) {
        while let Some(event) = self.pop() {
            handler(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Events lost to overflow since construction.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl<T, const N: usize> Default for EventQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
