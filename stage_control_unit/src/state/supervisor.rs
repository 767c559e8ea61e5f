//! Mode supervisor.
//!
//! [`MotorController`] owns the hardware, the motor state and the active
//! mode's workflow. One [`tick`](MotorController::tick):
//!
//! 1. sample positions, interlock feedback and buttons,
//! 2. dispatch to the active workflow,
//! 3. apply a pending mode request (rebuilding the workflow sub-state),
//! 4. write the general-enable and keyboard-enable lines,
//! 5. advance the buzzer,
//! 6. publish the status registers,
//! 7. drop an abort request nobody consumed.
//!
//! Mode requests are deferred: the last one before the tick boundary wins,
//! and the workflow always sees one mode for its whole invocation.

use stage_common::motor::config::MotorConfig;
use stage_common::motor::error::MoveError;
use stage_common::motor::state::{ActivationMode, Axis, ExecMode};
use stage_common::protocol::{ProtocolReport, StatusRegisters};
use tracing::{debug, info};

use crate::hal::{DriverPins, PanelIo, StageHal};
use crate::io::driver;
use crate::io::indicator::Indicator;
use crate::io::sensors::SensorSampler;
use crate::protocol::publish_status;
use crate::state::context::TickContext;
use crate::state::motor::MotorState;
use crate::workflow::calibration::CalibrationWorkflow;
use crate::workflow::command::CommandWorkflow;
use crate::workflow::disable::DisableWorkflow;
use crate::workflow::service::ServiceWorkflow;

// ─── Mode Context ───────────────────────────────────────────────────

/// Active execution mode with its sub-state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeContext {
    Disable(DisableWorkflow),
    Calibration(CalibrationWorkflow),
    Command(CommandWorkflow),
    Service(ServiceWorkflow),
}

impl ModeContext {
    /// Fresh sub-state for `mode`.
    pub fn enter(mode: ExecMode) -> Self {
        match mode {
            ExecMode::Disable => Self::Disable(DisableWorkflow::default()),
            ExecMode::Calibration => Self::Calibration(CalibrationWorkflow::default()),
            ExecMode::Command => Self::Command(CommandWorkflow::default()),
            ExecMode::Service => Self::Service(ServiceWorkflow::default()),
        }
    }

    pub const fn exec_mode(&self) -> ExecMode {
        match self {
            Self::Disable(_) => ExecMode::Disable,
            Self::Calibration(_) => ExecMode::Calibration,
            Self::Command(_) => ExecMode::Command,
            Self::Service(_) => ExecMode::Service,
        }
    }
}

// ─── Controller ─────────────────────────────────────────────────────

pub struct MotorController<H: StageHal> {
    hal: H,
    config: MotorConfig,
    sampler: SensorSampler,
    state: MotorState,
    mode: ModeContext,
    pending: Option<ExecMode>,
    indicator: Indicator,
    status: StatusRegisters,
    tick_count: u64,
}

impl<H: StageHal> MotorController<H> {
    /// Boot into Disable with the driver off and power 0.
    pub fn new(hal: H, config: MotorConfig) -> Self {
        let mut controller = Self {
            hal,
            sampler: SensorSampler::new(config.adc_zero_offset),
            state: MotorState::new(),
            mode: ModeContext::enter(ExecMode::Disable),
            pending: None,
            indicator: Indicator::new(&config),
            status: StatusRegisters::default(),
            tick_count: 0,
            config,
        };
        driver::apply_mode(&mut controller.hal, ActivationMode::Disabled);
        controller.state.power = driver::apply_power(&mut controller.hal, 0);
        controller.write_enables();
        controller.hal.set_buzzer(false);
        controller.sample_inputs();
        controller.publish();
        controller
    }

    /// Main tick. Call once per tick period.
    pub fn tick(&mut self) {
        self.sample_inputs();

        {
            let mut ctx = TickContext::new(
                &mut self.hal,
                &mut self.state,
                &self.config,
                &mut self.indicator,
                &mut self.pending,
            );
            match &mut self.mode {
                ModeContext::Disable(wf) => wf.run(&mut ctx),
                ModeContext::Calibration(wf) => wf.run(&mut ctx),
                ModeContext::Command(wf) => wf.run(&mut ctx),
                ModeContext::Service(wf) => wf.run(&mut ctx),
            }
        }

        if let Some(mode) = self.pending.take() {
            self.enter_mode(mode);
        }

        self.write_enables();
        self.update_indicator();
        self.publish();

        if self.state.abort_request {
            debug!("abort request with nothing to abort, discarded");
            self.state.abort_request = false;
        }
        self.tick_count += 1;
    }

    /// 1 Hz tick: keep-alive countdown.
    pub fn tick_seconds(&mut self) {
        self.state.keep_alive = self.state.keep_alive.saturating_sub(1);
    }

    /// Queue a mode change for the next tick boundary. Clears any abort request.
    pub fn request_mode(&mut self, mode: ExecMode) {
        self.pending = Some(mode);
        self.state.abort_request = false;
    }

    /// Ask the active motion workflow to stop at the next tick.
    pub fn request_abort(&mut self) {
        self.state.abort_request = true;
    }

    /// Validate and latch a move of `axis` to `target` [0.1 mm].
    ///
    /// Checks, in order: travel limit, already in position, Command mode,
    /// power switch engaged, no move in progress.
    pub fn request_move(&mut self, axis: Axis, target: u16) -> Result<(), MoveError> {
        let axis_config = *self.config.axis(axis);
        if target > axis_config.travel_limit {
            return Err(MoveError::InvalidPosition {
                axis,
                target,
                limit: axis_config.travel_limit,
            });
        }

        let position = self.state.position(axis);
        if axis_config.scale.within_half_unit(position, i32::from(target)) {
            let reported = axis_config.scale.to_tenths(position).clamp(0, i32::from(u16::MAX));
            return Err(MoveError::AlreadyInPosition {
                axis,
                position: reported as u16,
            });
        }

        let exec_mode = self.mode.exec_mode();
        let ModeContext::Command(command) = &mut self.mode else {
            return Err(MoveError::InvalidMode(exec_mode));
        };
        if !self.state.enable_feedback {
            return Err(MoveError::DisableCondition);
        }
        if let Some(busy) = command.in_progress() {
            return Err(MoveError::Busy(busy));
        }

        let native = axis_config.scale.to_native(i32::from(target));
        command.latch(axis, native);
        info!(%axis, target, native, position, "move accepted");
        Ok(())
    }

    /// Toggle the service test cycle. `false` outside Service mode.
    pub fn request_test_cycle(&mut self) -> bool {
        match &mut self.mode {
            ModeContext::Service(service) => {
                service.toggle();
                true
            }
            _ => false,
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────

    #[inline]
    pub const fn exec_mode(&self) -> ExecMode {
        self.mode.exec_mode()
    }

    #[inline]
    pub const fn mode(&self) -> &ModeContext {
        &self.mode
    }

    #[inline]
    pub const fn pending_mode(&self) -> Option<ExecMode> {
        self.pending
    }

    #[inline]
    pub const fn state(&self) -> &MotorState {
        &self.state
    }

    #[inline]
    pub const fn config(&self) -> &MotorConfig {
        &self.config
    }

    /// Status registers published by the last tick.
    #[inline]
    pub const fn status(&self) -> &StatusRegisters {
        &self.status
    }

    #[inline]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    #[inline]
    pub const fn hal(&self) -> &H {
        &self.hal
    }

    #[inline]
    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }

    #[inline]
    pub const fn indicator(&self) -> &Indicator {
        &self.indicator
    }

    /// Axis of the Command-mode move in progress.
    pub fn move_in_progress(&self) -> Option<Axis> {
        match &self.mode {
            ModeContext::Command(command) => command.in_progress(),
            _ => None,
        }
    }

    pub fn service_running(&self) -> bool {
        matches!(&self.mode, ModeContext::Service(service) if service.is_running())
    }

    /// Next queued asynchronous report.
    pub fn pop_report(&mut self) -> Option<ProtocolReport> {
        self.state.pop_report()
    }

    // ─── Internals ──────────────────────────────────────────────────

    fn sample_inputs(&mut self) {
        self.state.positions = self.sampler.sample(&mut self.hal);
        self.state.enable_feedback = self.hal.enable_feedback();
        self.state.needle_disable_feedback = self.hal.needle_disable_feedback();
        self.state.keyboard.poll(&mut self.hal);
    }

    fn enter_mode(&mut self, mode: ExecMode) {
        let previous = self.mode.exec_mode();
        if let ModeContext::Command(command) = &self.mode {
            if let Some(axis) = command.in_progress() {
                self.state.push_report(ProtocolReport::Aborted);
                info!(%axis, "move cut short by mode change");
            }
        }

        self.mode = ModeContext::enter(mode);
        self.indicator.reset();
        driver::apply_mode(&mut self.hal, ActivationMode::Disabled);
        self.state.activation = ActivationMode::Disabled;

        match mode {
            ExecMode::Disable | ExecMode::Service => {
                self.state.general_enable = false;
                self.state.keyboard.set_enabled(false);
            }
            ExecMode::Calibration => {
                self.state.general_enable = true;
                self.state.keyboard.set_enabled(true);
                self.state.keep_alive = self.config.keep_alive_s;
            }
            ExecMode::Command => {
                self.state.general_enable = true;
                self.state.keyboard.set_enabled(false);
            }
        }
        info!(%previous, %mode, "execution mode applied");
    }

    fn write_enables(&mut self) {
        self.hal.set_general_enable(self.state.general_enable);
        self.hal.set_keyboard_enable(self.state.keyboard.enabled());
    }

    fn update_indicator(&mut self) {
        if matches!(self.mode, ModeContext::Calibration(_)) {
            let activation = self.state.activation;
            let position = activation.axis().map_or(0, |axis| self.state.position(axis));
            self.indicator.observe_jog(activation, position);
        }
        self.indicator.update(&mut self.hal);
    }

    fn publish(&mut self) {
        self.status = publish_status(&self.state, self.mode.exec_mode(), &self.config);
    }
}
