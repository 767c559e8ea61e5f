//! # Stage Control Unit Library
//!
//! Motor workflow controller for the X/Y/Z positioning stage. A 7.8 ms tick
//! samples the three position sensors, dispatches to the active workflow,
//! applies deferred mode changes and publishes the protocol status registers.
//! A separate 1 Hz tick drives the calibration keep-alive.
//!
//! ## Execution Modes
//!
//! 1. **Disable**: Safe park state; long key press arms Calibration
//! 2. **Calibration**: Manual single-axis jogging with brake-on-release
//! 3. **Command**: Host-commanded closed-loop positioning with power ramp
//! 4. **Service**: Six-step automatic test cycle
//!
//! ## Single Writer
//!
//! [`state::supervisor::MotorController`] owns the hardware and all runtime
//! state. Workflows only see a [`state::context::TickContext`] for the
//! duration of their dispatch, and every GPIO write goes through
//! [`io::driver`]. Nothing inside the tick allocates.

#![deny(clippy::disallowed_types)]

pub mod config;
pub mod cycle;
pub mod hal;
pub mod io;
pub mod protocol;
pub mod sim;
pub mod state;
pub mod workflow;
