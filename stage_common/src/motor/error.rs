//! Move-request rejections and status flag bits.
//!
//! `MoveError` variants are listed in the order the preconditions are checked.

use bitflags::bitflags;
use thiserror::Error;

use super::state::{Axis, ExecMode};

/// Synchronous rejection of a host move request.
///
/// No internal state changes when one of these is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    /// Target beyond the axis travel limit [0.1 mm].
    #[error("{axis} target {target} exceeds travel limit {limit}")]
    InvalidPosition { axis: Axis, target: u16, limit: u16 },

    /// Axis already within half a native unit of the target.
    #[error("{axis} already in position ({position})")]
    AlreadyInPosition { axis: Axis, position: u16 },

    /// Move requests are only served in Command mode.
    #[error("move rejected in {0} mode")]
    InvalidMode(ExecMode),

    /// Power switch enable feedback is not asserted.
    #[error("power switch not engaged")]
    DisableCondition,

    /// A move is already executing.
    #[error("{0} move already in progress")]
    Busy(Axis),
}

bitflags! {
    /// Mode status register byte 1.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StatusFlags: u8 {
        /// Power switch engaged (enable feedback line).
        const POWER_SWITCH    = 0x01;
        /// General motor enable requested.
        const GENERAL_ENABLE  = 0x02;
        /// Keyboard jogging enabled.
        const KEYBOARD_ENABLE = 0x04;
        /// Needle-presence disable asserted.
        const NEEDLE_DISABLE  = 0x08;
    }
}
