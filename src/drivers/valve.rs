//! Hot/cold supply solenoid valve driver.
//!
//! Normally-closed solenoid driven through a MOSFET from a digital output.
//! The commanded state is remembered even if the pin write fails so the
//! next command retries from a known intent.
//!
//! ## Safety contract
//!
//! Interlocks live in the safety monitor and the flow controller; this
//! driver is a dumb actuator.

use embedded_hal::digital::{Error as _, OutputPin};
use log::error;

pub struct SolenoidValve<P> {
    pin: P,
    label: &'static str,
    open: bool,
}

impl<P: OutputPin> SolenoidValve<P> {
    /// Drives the pin low (closed) immediately.
    pub fn new(mut pin: P, label: &'static str) -> Self {
        if let Err(e) = pin.set_low() {
            error!("{label} valve: initial close failed: {:?}", e.kind());
        }
        Self {
            pin,
            label,
            open: false,
        }
    }

    /// Returns `false` if the pin write failed.
    pub fn set(&mut self, open: bool) -> bool {
        self.open = open;
        let result = if open { self.pin.set_high() } else { self.pin.set_low() };
        match result {
            Ok(()) => true,
            Err(e) => {
                error!(
                    "{} valve: {} failed: {:?}",
                    self.label,
                    if open { "open" } else { "close" },
                    e.kind()
                );
                false
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}
