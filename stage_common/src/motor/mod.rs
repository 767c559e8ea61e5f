//! Motor controller shared types.
//!
//! State enums, move-request errors, status flags and configuration
//! structures shared between the controller and the protocol layer.

pub mod config;
pub mod error;
pub mod state;
