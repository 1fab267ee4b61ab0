//! Actuator drivers built on `embedded-hal` 1.0 traits.

pub mod mixer;
pub mod valve;
