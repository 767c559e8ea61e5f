//! Stage Common Library
//!
//! Shared constants, state enums, protocol codecs and configuration loading
//! for the positioning-stage motor controller workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Compile-time defaults (tick period, travel limits, timers)
//! - [`config`] - Configuration loading traits and types
//! - [`motor`] - Motor state enums, move errors and motor configuration
//! - [`protocol`] - Host command opcodes, outcomes and status registers
//! - [`prelude`] - Common re-exports for convenience

pub mod config;
pub mod consts;
pub mod motor;
pub mod prelude;
pub mod protocol;
