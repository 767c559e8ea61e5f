//! Per-dispatch view handed to the active workflow.
//!
//! A `TickContext` borrows the hardware and the motor state for one workflow
//! invocation. It is the only path from a workflow to the driver lines, the
//! buzzer and the pending-mode slot.

use stage_common::motor::config::MotorConfig;
use stage_common::motor::state::{ActivationMode, Axis, Direction, ExecMode};
use stage_common::protocol::ProtocolReport;

use crate::hal::StageHal;
use crate::io::driver;
use crate::io::indicator::{BuzzerPattern, Indicator};
use crate::io::keyboard::Keyboard;
use crate::state::motor::MotorState;

pub struct TickContext<'a, H: StageHal> {
    hal: &'a mut H,
    state: &'a mut MotorState,
    config: &'a MotorConfig,
    indicator: &'a mut Indicator,
    pending: &'a mut Option<ExecMode>,
}

impl<'a, H: StageHal> TickContext<'a, H> {
    pub fn new(
        hal: &'a mut H,
        state: &'a mut MotorState,
        config: &'a MotorConfig,
        indicator: &'a mut Indicator,
        pending: &'a mut Option<ExecMode>,
    ) -> Self {
        Self {
            hal,
            state,
            config,
            indicator,
            pending,
        }
    }

    // ─── Reads ──────────────────────────────────────────────────────

    #[inline]
    pub fn state(&self) -> &MotorState {
        self.state
    }

    #[inline]
    pub fn config(&self) -> &MotorConfig {
        self.config
    }

    #[inline]
    pub fn position(&self, axis: Axis) -> i32 {
        self.state.position(axis)
    }

    #[inline]
    pub fn keyboard(&self) -> &Keyboard {
        &self.state.keyboard
    }

    #[inline]
    pub fn abort_requested(&self) -> bool {
        self.state.abort_request
    }

    #[inline]
    pub fn keep_alive(&self) -> u16 {
        self.state.keep_alive
    }

    // ─── Driver ─────────────────────────────────────────────────────

    pub fn set_activation(&mut self, mode: ActivationMode) {
        driver::apply_mode(&mut *self.hal, mode);
        self.state.activation = mode;
    }

    pub fn set_power(&mut self, level: u8) {
        self.state.power = driver::apply_power(&mut *self.hal, level);
    }

    /// Set the power level, then drive `axis` toward `direction`.
    pub fn drive(&mut self, axis: Axis, direction: Direction, power: u8) {
        self.set_power(power);
        self.set_activation(ActivationMode::drive(axis, direction));
    }

    /// Short both terminals of `axis`.
    pub fn brake(&mut self, axis: Axis) {
        self.set_activation(ActivationMode::short(axis));
    }

    pub fn disable_motors(&mut self) {
        self.set_activation(ActivationMode::Disabled);
    }

    // ─── Enables & Timers ───────────────────────────────────────────

    /// Latched here, written to the line once dispatch returns.
    pub fn set_general_enable(&mut self, on: bool) {
        self.state.general_enable = on;
    }

    pub fn set_keyboard_enable(&mut self, on: bool) {
        self.state.keyboard.set_enabled(on);
    }

    pub fn rearm_keep_alive(&mut self) {
        self.state.keep_alive = self.config.keep_alive_s;
    }

    pub fn clear_abort(&mut self) {
        self.state.abort_request = false;
    }

    // ─── Supervisor & Protocol ──────────────────────────────────────

    /// Queue a mode change for the end of this tick. Clears any abort request.
    pub fn request_mode(&mut self, mode: ExecMode) {
        *self.pending = Some(mode);
        self.state.abort_request = false;
    }

    pub fn report(&mut self, report: ProtocolReport) {
        self.state.push_report(report);
    }

    // ─── Indicator ──────────────────────────────────────────────────

    pub fn buzzer_continuous(&mut self, on: bool) {
        self.indicator.set_continuous(on);
    }

    pub fn buzzer_pulse(&mut self, pattern: BuzzerPattern) {
        self.indicator.pulse(pattern);
    }
}
