//! Host protocol glue: command handling and status publishing.
//!
//! The CAN register multiplexer calls [`ProtocolHandler::handle`] with the
//! received opcode and data bytes, answers with the returned
//! [`CommandOutcome`], and drains [`ProtocolReport`]s after every tick.

use stage_common::motor::config::MotorConfig;
use stage_common::motor::error::MoveError;
use stage_common::motor::state::{Axis, ExecMode};
use stage_common::protocol::{
    CommandOutcome, DecodeError, ErrorCode, HostCommand, StatusRegisters, position_bytes,
};
use tracing::{debug, error, warn};

use crate::config::ProtocolConfig;
use crate::hal::StageHal;
use crate::state::motor::MotorState;
use crate::state::supervisor::MotorController;

/// Pack the three status registers from the current motor state.
pub fn publish_status(state: &MotorState, mode: ExecMode, config: &MotorConfig) -> StatusRegisters {
    StatusRegisters::encode(mode, state.status_flags(), state.positions.to_tenths(config))
}

/// Error code the host sees for a move rejection.
pub const fn move_error_code(err: &MoveError) -> ErrorCode {
    match err {
        MoveError::InvalidPosition { .. } => ErrorCode::InvalidData,
        MoveError::InvalidMode(_) => ErrorCode::NotAvailable,
        MoveError::DisableCondition => ErrorCode::NotEnabled,
        MoveError::Busy(_) => ErrorCode::Busy,
        // Answered with Executed, never as an error.
        MoveError::AlreadyInPosition { .. } => ErrorCode::WrongReturnCode,
    }
}

/// Translates host commands into controller requests.
#[derive(Debug, Clone, Copy)]
pub struct ProtocolHandler {
    test_cycle_opcode: u8,
}

impl ProtocolHandler {
    pub const fn new(config: &ProtocolConfig) -> Self {
        Self {
            test_cycle_opcode: config.test_cycle_opcode,
        }
    }

    /// Decode and execute one raw command.
    pub fn handle<H: StageHal>(
        &self,
        controller: &mut MotorController<H>,
        opcode: u8,
        data: &[u8],
    ) -> CommandOutcome {
        match HostCommand::decode(opcode, data, self.test_cycle_opcode) {
            Ok(command) => self.execute(controller, command),
            Err(err @ DecodeError::UnknownOpcode(_)) => {
                warn!(%err, "host command rejected");
                CommandOutcome::Error(ErrorCode::NotAvailable)
            }
            Err(err @ DecodeError::MissingData { .. }) => {
                warn!(%err, "host command rejected");
                CommandOutcome::Error(ErrorCode::InvalidData)
            }
        }
    }

    /// Execute a decoded command.
    pub fn execute<H: StageHal>(
        &self,
        controller: &mut MotorController<H>,
        command: HostCommand,
    ) -> CommandOutcome {
        debug!(?command, "host command");
        match command {
            HostCommand::Abort => {
                controller.request_abort();
                CommandOutcome::Executed(0, 0)
            }
            HostCommand::SetMode(mode) => {
                controller.request_mode(mode);
                CommandOutcome::Executed(mode.code(), 0)
            }
            HostCommand::Move { axis, target } => Self::execute_move(controller, axis, target),
            HostCommand::TestCycle => {
                if controller.request_test_cycle() {
                    CommandOutcome::Executed(u8::from(controller.service_running()), 0)
                } else {
                    CommandOutcome::Error(ErrorCode::NotAvailable)
                }
            }
        }
    }

    fn execute_move<H: StageHal>(
        controller: &mut MotorController<H>,
        axis: Axis,
        target: u16,
    ) -> CommandOutcome {
        match controller.request_move(axis, target) {
            Ok(()) if controller.move_in_progress() == Some(axis) => CommandOutcome::Executing,
            Ok(()) => {
                error!(%axis, target, "move accepted but not latched");
                CommandOutcome::Error(ErrorCode::WrongReturnCode)
            }
            Err(MoveError::AlreadyInPosition { position, .. }) => {
                let [lo, hi] = position_bytes(i32::from(position));
                CommandOutcome::Executed(lo, hi)
            }
            Err(err) => {
                warn!(%err, "move rejected");
                CommandOutcome::Error(move_error_code(&err))
            }
        }
    }
}
