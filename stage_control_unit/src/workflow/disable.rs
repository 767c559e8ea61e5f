//! Disable workflow: safe park state and long-press gateway into Calibration.

use stage_common::motor::state::ExecMode;
use tracing::{debug, info};

use crate::hal::StageHal;
use crate::state::context::TickContext;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisableWorkflow {
    /// Ticks the keyboard has been held.
    press_ticks: u32,
    /// Long press reached; waiting for release.
    armed: bool,
}

impl DisableWorkflow {
    pub fn run<H: StageHal>(&mut self, ctx: &mut TickContext<'_, H>) {
        ctx.set_general_enable(false);
        ctx.set_keyboard_enable(false);
        ctx.disable_motors();

        if ctx.keyboard().any_pressed() {
            self.press_ticks = self.press_ticks.saturating_add(1);
            if !self.armed && self.press_ticks > ctx.config().long_press_ticks() {
                self.armed = true;
                ctx.buzzer_continuous(true);
                debug!(ticks = self.press_ticks, "long press armed");
            }
            return;
        }

        self.press_ticks = 0;
        if self.armed {
            self.armed = false;
            ctx.buzzer_continuous(false);
            ctx.request_mode(ExecMode::Calibration);
            info!("keys released after long press, entering calibration");
        }
    }

    #[inline]
    pub const fn is_armed(&self) -> bool {
        self.armed
    }
}
