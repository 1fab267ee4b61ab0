//! Water control: mixing-valve temperature loop and the flow/valve state
//! machine built on top of it.

pub mod flow;
pub mod temperature;
