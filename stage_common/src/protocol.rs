//! Host protocol contract: command opcodes, outcomes and status registers.
//!
//! The CAN register multiplexer itself lives outside the controller. This
//! module fixes the byte layouts both sides agree on.
//!
//! | Register    | Byte 0    | Byte 1     | Byte 2 | Byte 3 |
//! |-------------|-----------|------------|--------|--------|
//! | Mode        | ExecMode  | StatusFlags| 0      | 0      |
//! | Position XY | XL        | XH         | YL     | YH     |
//! | Position Z  | ZL        | ZH         | 0      | 0      |
//!
//! Positions are little-endian 0.1 mm, clamped to `0..=u16::MAX`.

use static_assertions::const_assert_eq;
use thiserror::Error;

use crate::motor::error::StatusFlags;
use crate::motor::state::{Axis, ExecMode};

/// CAN device identifier of the motor board.
pub const DEVICE_CAN_ID: u8 = 0x15;

/// Application revision reported to the host (major, minor, sub).
pub const APP_REVISION: (u8, u8, u8) = (1, 0, 0);

/// Command opcodes.
pub mod opcode {
    pub const ABORT: u8 = 0;
    pub const DISABLE_MODE: u8 = 1;
    pub const COMMAND_MODE: u8 = 2;
    pub const SERVICE_MODE: u8 = 3;
    pub const CALIB_MODE: u8 = 4;
    pub const MOVE_X: u8 = 5;
    pub const MOVE_Y: u8 = 6;
    pub const MOVE_Z: u8 = 7;
    /// Test-cycle opcode of the first protocol revision.
    pub const TEST_CYCLE_REV1: u8 = 8;
    /// Test-cycle opcode of the later protocol revision.
    pub const TEST_CYCLE_REV2: u8 = 9;
}

// ─── Commands ───────────────────────────────────────────────────────

/// Decoded host command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    Abort,
    SetMode(ExecMode),
    /// Move `axis` to `target` [0.1 mm].
    Move { axis: Axis, target: u16 },
    TestCycle,
}

/// Host command decoding failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown command opcode {0}")]
    UnknownOpcode(u8),
    #[error("opcode {opcode} needs {needed} data bytes, got {got}")]
    MissingData { opcode: u8, needed: usize, got: usize },
}

impl HostCommand {
    /// Decode an opcode and its data bytes.
    ///
    /// `test_cycle_opcode` selects which revision's test-cycle code is accepted.
    pub fn decode(opcode: u8, data: &[u8], test_cycle_opcode: u8) -> Result<Self, DecodeError> {
        let axis = match opcode {
            opcode::ABORT => return Ok(Self::Abort),
            opcode::DISABLE_MODE => return Ok(Self::SetMode(ExecMode::Disable)),
            opcode::COMMAND_MODE => return Ok(Self::SetMode(ExecMode::Command)),
            opcode::SERVICE_MODE => return Ok(Self::SetMode(ExecMode::Service)),
            opcode::CALIB_MODE => return Ok(Self::SetMode(ExecMode::Calibration)),
            opcode::MOVE_X => Axis::X,
            opcode::MOVE_Y => Axis::Y,
            opcode::MOVE_Z => Axis::Z,
            op if op == test_cycle_opcode => return Ok(Self::TestCycle),
            op => return Err(DecodeError::UnknownOpcode(op)),
        };

        match data {
            [lo, hi, ..] => Ok(Self::Move {
                axis,
                target: u16::from_le_bytes([*lo, *hi]),
            }),
            _ => Err(DecodeError::MissingData {
                opcode,
                needed: 2,
                got: data.len(),
            }),
        }
    }
}

// ─── Outcomes ───────────────────────────────────────────────────────

/// Error codes returned to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    NotAvailable = 1,
    InvalidData = 2,
    NotEnabled = 3,
    Busy = 4,
    /// Internal state machine returned a result outside its contract.
    WrongReturnCode = 5,
}

/// Synchronous answer to a host command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Done, with two payload bytes.
    Executed(u8, u8),
    /// Accepted; completion follows as a [`ProtocolReport::Executed`].
    Executing,
    Error(ErrorCode),
}

/// Asynchronous completion pushed by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolReport {
    Executed { d0: u8, d1: u8 },
    Aborted,
}

impl ProtocolReport {
    /// Completion carrying a position [0.1 mm].
    pub fn executed_at(position: i32) -> Self {
        let [d0, d1] = position_bytes(position);
        Self::Executed { d0, d1 }
    }
}

// ─── Status Registers ───────────────────────────────────────────────

/// Size of every status register.
pub const STATUS_REGISTER_LEN: usize = 4;

/// Snapshot of the three status registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusRegisters {
    pub mode: [u8; STATUS_REGISTER_LEN],
    pub position_xy: [u8; STATUS_REGISTER_LEN],
    pub position_z: [u8; STATUS_REGISTER_LEN],
}

const_assert_eq!(core::mem::size_of::<StatusRegisters>(), 3 * STATUS_REGISTER_LEN);

impl StatusRegisters {
    /// Pack mode, flags and positions [0.1 mm].
    pub fn encode(mode: ExecMode, flags: StatusFlags, positions: [i32; 3]) -> Self {
        let [xl, xh] = position_bytes(positions[Axis::X.index()]);
        let [yl, yh] = position_bytes(positions[Axis::Y.index()]);
        let [zl, zh] = position_bytes(positions[Axis::Z.index()]);
        Self {
            mode: [mode.code(), flags.bits(), 0, 0],
            position_xy: [xl, xh, yl, yh],
            position_z: [zl, zh, 0, 0],
        }
    }

    /// Execution mode from the Mode register.
    pub fn exec_mode(&self) -> Option<ExecMode> {
        ExecMode::from_u8(self.mode[0])
    }

    /// Flags from the Mode register.
    pub fn flags(&self) -> StatusFlags {
        StatusFlags::from_bits_truncate(self.mode[1])
    }

    /// Reported position of `axis` [0.1 mm].
    pub fn position(&self, axis: Axis) -> u16 {
        match axis {
            Axis::X => u16::from_le_bytes([self.position_xy[0], self.position_xy[1]]),
            Axis::Y => u16::from_le_bytes([self.position_xy[2], self.position_xy[3]]),
            Axis::Z => u16::from_le_bytes([self.position_z[0], self.position_z[1]]),
        }
    }
}

/// Little-endian bytes of a position clamped to the reportable range.
#[inline]
pub fn position_bytes(position: i32) -> [u8; 2] {
    (position.clamp(0, u16::MAX as i32) as u16).to_le_bytes()
}

// ─── Tests ──────────────────────────────────────────────────────────
