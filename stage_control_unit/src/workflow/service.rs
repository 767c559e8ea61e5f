//! Service workflow: endless six-step exercise cycle.
//!
//! Z up → X out → Y out → Y home → X home → Z down, then again from the top.
//! A key press or an abort request cancels the cycle, and so does losing the
//! power switch.

use stage_common::motor::state::ServiceCommand;
use tracing::{debug, info, warn};

use crate::hal::StageHal;
use crate::state::context::TickContext;
use crate::workflow::ramp::{Approach, approach};

/// Number of steps in one cycle.
pub const SERVICE_STEPS: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceWorkflow {
    command: ServiceCommand,
    /// Current step, `0..SERVICE_STEPS`.
    sequence: usize,
}

impl ServiceWorkflow {
    /// Start the cycle from step 0, or stop it if running.
    ///
    /// Returns whether the cycle is running afterwards.
    pub fn toggle(&mut self) -> bool {
        match self.command {
            ServiceCommand::CycleTest => {
                self.stop();
                info!("service cycle stopped by host");
                false
            }
            ServiceCommand::NoCommand => {
                self.command = ServiceCommand::CycleTest;
                self.sequence = 0;
                info!("service cycle started");
                true
            }
        }
    }

    fn stop(&mut self) {
        self.command = ServiceCommand::NoCommand;
        self.sequence = 0;
    }

    #[inline]
    pub const fn command(&self) -> ServiceCommand {
        self.command
    }

    #[inline]
    pub const fn is_running(&self) -> bool {
        matches!(self.command, ServiceCommand::CycleTest)
    }

    #[inline]
    pub const fn sequence(&self) -> usize {
        self.sequence
    }

    pub fn run<H: StageHal>(&mut self, ctx: &mut TickContext<'_, H>) {
        ctx.set_keyboard_enable(false);

        if self.is_running() {
            let by_key = ctx.keyboard().any_pressed();
            let switch_lost = !ctx.state().enable_feedback;
            if by_key || switch_lost || ctx.abort_requested() {
                let step = self.sequence;
                ctx.clear_abort();
                self.stop();
                if switch_lost {
                    warn!(step, "service cycle cancelled, power switch lost");
                } else {
                    info!(by_key, "service cycle cancelled");
                }
            }
        }

        if !self.is_running() {
            ctx.set_general_enable(false);
            ctx.disable_motors();
            return;
        }

        ctx.set_general_enable(true);
        let (axis, target) = ctx.config().service.steps()[self.sequence];
        let target = ctx.config().axis(axis).scale.to_native(i32::from(target));
        let position = ctx.position(axis);

        match approach(ctx.config(), axis, position, target) {
            Approach::Arrived => {
                ctx.brake(axis);
                debug!(step = self.sequence, %axis, position, "service step done");
                self.sequence = (self.sequence + 1) % SERVICE_STEPS;
            }
            Approach::Drive { direction, power } => ctx.drive(axis, direction, power),
        }
    }
}
