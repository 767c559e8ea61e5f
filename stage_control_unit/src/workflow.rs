//! Per-mode workflow handlers.
//!
//! Each handler owns its sub-state and runs once per tick while its mode is
//! active. The supervisor rebuilds the handler on every mode entry, so no
//! counter survives a mode change.

pub mod calibration;
pub mod command;
pub mod disable;
pub mod ramp;
pub mod service;
