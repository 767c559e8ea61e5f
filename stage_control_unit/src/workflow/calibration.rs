//! Calibration workflow: manual single-axis jogging.
//!
//! Per tick, first matching rule wins:
//! 1. An axis is jogging: keep the brake-release timer armed while any key is
//!    held. Brake the axis once it reaches its travel bound or its own key is
//!    released.
//! 2. Brake-release timer running: count it down, then disable the driver.
//! 3. No key held: keep the driver disabled. Leave calibration once the
//!    keep-alive has run out.
//! 4. A key is held: re-arm the keep-alive. A fresh single press starts a jog
//!    on that button's axis if it is inside its bound.
//!
//! A press is fresh from the tick a key goes down with none held before until
//! it starts a jog. Any chord voids it, so releasing part of a chord never
//! starts a jog.

use stage_common::motor::state::{Axis, Button, Direction, ExecMode};
use tracing::{debug, info};

use crate::hal::StageHal;
use crate::io::indicator::BuzzerPattern;
use crate::state::context::TickContext;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalibrationWorkflow {
    /// Button driving the current jog.
    jogging: Option<Button>,
    /// Ticks left in the post-jog brake hold.
    brake_ticks: u32,
    /// Unconsumed single press.
    fresh_press: bool,
}

impl CalibrationWorkflow {
    pub fn run<H: StageHal>(&mut self, ctx: &mut TickContext<'_, H>) {
        ctx.set_general_enable(true);
        ctx.set_keyboard_enable(true);
        let keyboard = *ctx.keyboard();
        let any_pressed = keyboard.any_pressed();
        if keyboard.keystep() {
            self.fresh_press = true;
        }
        if keyboard.pressed_count() != 1 {
            self.fresh_press = false;
        }

        if let Some(button) = self.jogging {
            let (axis, direction) = (button.axis(), button.direction());
            if any_pressed {
                self.brake_ticks = ctx.config().brake_release_ticks();
            }
            let at_bound = at_travel_bound(ctx, axis, direction);
            let released = !keyboard.is_pressed(button);
            if at_bound || released {
                ctx.brake(axis);
                self.jogging = None;
                if at_bound {
                    ctx.buzzer_pulse(BuzzerPattern::Single);
                }
                debug!(%axis, position = ctx.position(axis), at_bound, "jog stopped");
            }
            return;
        }

        if self.brake_ticks > 0 {
            self.brake_ticks -= 1;
            if self.brake_ticks == 0 {
                ctx.disable_motors();
            }
            return;
        }

        if !any_pressed {
            ctx.disable_motors();
            if ctx.keep_alive() == 0 {
                ctx.request_mode(ExecMode::Disable);
                info!("calibration keep-alive expired");
            }
            return;
        }

        ctx.rearm_keep_alive();
        if !self.fresh_press {
            return;
        }
        let Some(button) = keyboard.jog_button() else {
            return;
        };
        let axis = button.axis();
        let direction = button.direction();
        if at_travel_bound(ctx, axis, direction) {
            return;
        }

        let config = ctx.config();
        let power = config.jog_power.max(config.axis(axis).min_power(direction));
        let brake_ticks = config.brake_release_ticks();
        ctx.drive(axis, direction, power);
        self.jogging = Some(button);
        self.brake_ticks = brake_ticks;
        self.fresh_press = false;
        debug!(?button, %axis, power, "jog started");
    }

    /// Axis currently jogging, if any.
    #[inline]
    pub const fn jogging(&self) -> Option<Axis> {
        match self.jogging {
            Some(button) => Some(button.axis()),
            None => None,
        }
    }

    #[inline]
    pub const fn brake_ticks(&self) -> u32 {
        self.brake_ticks
    }
}

/// Minus stops at 0, plus stops at the travel limit.
fn at_travel_bound<H: StageHal>(ctx: &TickContext<'_, H>, axis: Axis, direction: Direction) -> bool {
    let position = ctx.position(axis);
    match direction {
        Direction::Minus => position <= 0,
        Direction::Plus => position >= ctx.config().axis(axis).travel_limit_native(),
    }
}
