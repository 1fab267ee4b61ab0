//! SmartShower controller library.
//!
//! Safety interlock and water control core for an unattended shower.
//! Exposes the pure-logic modules for integration testing and the
//! adapters and runtime used by the host binary.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod drivers;
pub mod error;
pub mod events;
pub mod runtime;
pub mod safety;
pub mod sensors;
pub mod timer;
