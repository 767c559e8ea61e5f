//! Command workflow: closed-loop positioning of one axis to a host target.
//!
//! A latched move drives its axis with the ramp power each tick until it is
//! inside the in-position window, then brakes and reports `Executed` with the
//! final position. The brake is held for the brake-release period before the
//! driver is disabled. An abort request, or losing the power switch, ends the
//! move with a single `Aborted` report.

use stage_common::motor::state::Axis;
use stage_common::protocol::ProtocolReport;
use tracing::{debug, info, warn};

use crate::hal::StageHal;
use crate::state::context::TickContext;
use crate::workflow::ramp::{Approach, approach};

/// Latched move target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTarget {
    pub axis: Axis,
    /// Target in native units.
    pub target: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandWorkflow {
    active: Option<MoveTarget>,
    /// Ticks left in the post-move brake hold.
    brake_ticks: u32,
}

impl CommandWorkflow {
    /// Latch a move. Preconditions are checked by the supervisor.
    pub fn latch(&mut self, axis: Axis, target: i32) {
        self.active = Some(MoveTarget { axis, target });
        self.brake_ticks = 0;
    }

    /// Axis of the move in progress.
    #[inline]
    pub const fn in_progress(&self) -> Option<Axis> {
        match self.active {
            Some(mv) => Some(mv.axis),
            None => None,
        }
    }

    #[inline]
    pub const fn target(&self) -> Option<MoveTarget> {
        self.active
    }

    pub fn run<H: StageHal>(&mut self, ctx: &mut TickContext<'_, H>) {
        ctx.set_general_enable(true);
        ctx.set_keyboard_enable(false);

        let Some(mv) = self.active else {
            self.hold_or_disable(ctx);
            return;
        };

        if ctx.abort_requested() || !ctx.state().enable_feedback {
            let switch_lost = !ctx.state().enable_feedback;
            ctx.clear_abort();
            ctx.disable_motors();
            self.active = None;
            self.brake_ticks = 0;
            ctx.report(ProtocolReport::Aborted);
            warn!(axis = %mv.axis, switch_lost, "move aborted");
            return;
        }

        let position = ctx.position(mv.axis);
        match approach(ctx.config(), mv.axis, position, mv.target) {
            Approach::Arrived => {
                let tenths = ctx.config().axis(mv.axis).scale.to_tenths(position);
                let hold = ctx.config().brake_release_ticks();
                ctx.brake(mv.axis);
                ctx.report(ProtocolReport::executed_at(tenths));
                self.active = None;
                self.brake_ticks = hold;
                info!(axis = %mv.axis, position = tenths, "move executed");
            }
            Approach::Drive { direction, power } => {
                if ctx.state().power != power {
                    debug!(axis = %mv.axis, ?direction, power, position, "ramp step");
                }
                ctx.drive(mv.axis, direction, power);
            }
        }
    }

    fn hold_or_disable<H: StageHal>(&mut self, ctx: &mut TickContext<'_, H>) {
        if self.brake_ticks > 0 {
            self.brake_ticks -= 1;
            if self.brake_ticks > 0 {
                return;
            }
        }
        ctx.disable_motors();
    }
}
