//! Digital contact inputs: door reed switch, leak probe, emergency button.
//!
//! Each input wraps an `embedded-hal` [`InputPin`] with its wiring
//! polarity.  A failed pin read yields `None`; callers decide the
//! fail-safe interpretation (door unknown, leak present, button pressed).

use embedded_hal::digital::{Error as _, InputPin};
use log::warn;

/// Electrical level that means "asserted".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

pub struct ContactInput<P> {
    pin: P,
    polarity: Polarity,
    label: &'static str,
    /// Last read failed; suppresses repeated warnings.
    faulted: bool,
}

impl<P: InputPin> ContactInput<P> {
    pub fn new(pin: P, polarity: Polarity, label: &'static str) -> Self {
        Self {
            pin,
            polarity,
            label,
            faulted: false,
        }
    }

    /// `Some(true)` when asserted, `None` when the pin cannot be read.
    pub fn read(&mut self) -> Option<bool> {
        match self.pin.is_high() {
            Ok(high) => {
                self.faulted = false;
                Some(match self.polarity {
                    Polarity::ActiveHigh => high,
                    Polarity::ActiveLow => !high,
                })
            }
            Err(e) => {
                if !self.faulted {
                    warn!("{} input read failed: {:?}", self.label, e.kind());
                }
                self.faulted = true;
                None
            }
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}
