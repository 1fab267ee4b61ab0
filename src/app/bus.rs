//! Fan-out event sink.
//!
//! ```text
//!                   ┌──▶ LogEventSink
//!  ShowerService ──▶│──▶ notification adapter
//!    (EventBus)     └──▶ WebSocket bridge
//! ```
//!
//! Listeners run in registration order on the emitting loop; a listener
//! must not block.

use super::events::ShowerEvent;
use super::ports::EventSink;

#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Box<dyn EventSink>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.  Every later event reaches it.
    pub fn subscribe(&mut self, listener: Box<dyn EventSink>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl EventSink for EventBus {
    fn emit(&mut self, event: &ShowerEvent) {
        for listener in &mut self.listeners {
            listener.emit(event);
        }
    }
}
