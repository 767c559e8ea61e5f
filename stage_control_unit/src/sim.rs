//! Simulated stage hardware.
//!
//! `SimulatedStage` implements every HAL trait against an in-memory board:
//! - latched driver, enable and buzzer lines,
//! - three axes that move while their driver is selected and running,
//!   at a speed set by the decoded power level, between hard stops,
//! - an ADC that reports `position + zero_offset`,
//! - scripted buttons, power switch and needle interlock.
//!
//! Physics advances one tick per sampling pass.

use stage_common::motor::config::MotorConfig;
use stage_common::motor::state::{Axis, Button};
use tracing::trace;

use crate::hal::{AdcChannel, DriverPins, PanelIo, SensorAdc};
use crate::io::driver::decode_power_lines;

/// Travel per tick for each power level [native units].
pub const SPEED_PER_LEVEL: [f64; 8] = [0.5, 1.0, 2.0, 3.0, 4.0, 6.0, 8.0, 10.0];

/// Distance the hard stops sit beyond the travel range [native units].
pub const STOP_MARGIN: f64 = 20.0;

/// Largest raw ADC count.
pub const ADC_MAX: u16 = 4095;

/// Snapshot of the driver and panel output lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriverLines {
    pub driver_enable: bool,
    pub enable_a: bool,
    pub enable_b: bool,
    pub run: bool,
    pub direction: bool,
    pub power_select: [bool; 3],
    pub general_enable: bool,
    pub keyboard_enable: bool,
    pub buzzer: bool,
}

impl DriverLines {
    /// Axis selected by the A/B lines.
    pub const fn selected_axis(&self) -> Option<Axis> {
        match (self.enable_a, self.enable_b) {
            (true, true) => Some(Axis::X),
            (false, true) => Some(Axis::Y),
            (true, false) => Some(Axis::Z),
            (false, false) => None,
        }
    }

    pub const fn power_level(&self) -> u8 {
        decode_power_lines(self.power_select)
    }
}

#[derive(Debug, Clone, Copy)]
struct SimAxis {
    position: f64,
    min_stop: f64,
    max_stop: f64,
    blocked: bool,
}

impl SimAxis {
    fn advance(&mut self, delta: f64) {
        if self.blocked {
            return;
        }
        self.position = (self.position + delta).clamp(self.min_stop, self.max_stop);
    }
}

pub struct SimulatedStage {
    lines: DriverLines,
    axes: [SimAxis; 3],
    held: [bool; 6],
    power_switch: bool,
    needle_disable: bool,
    zero_offset: i32,
    ticks: u64,
}

impl SimulatedStage {
    /// Board with all axes at 0, power switch engaged, nothing held.
    pub fn new(config: &MotorConfig) -> Self {
        let axes = Axis::ALL.map(|axis| SimAxis {
            position: 0.0,
            min_stop: -STOP_MARGIN,
            max_stop: f64::from(config.axis(axis).travel_limit_native()) + STOP_MARGIN,
            blocked: false,
        });
        Self {
            lines: DriverLines::default(),
            axes,
            held: [false; 6],
            power_switch: true,
            needle_disable: false,
            zero_offset: config.adc_zero_offset,
            ticks: 0,
        }
    }

    // ─── Scripting ──────────────────────────────────────────────────

    pub fn set_position(&mut self, axis: Axis, native: i32) {
        self.axes[axis.index()].position = f64::from(native);
    }

    /// Rounded native position.
    pub fn position(&self, axis: Axis) -> i32 {
        self.axes[axis.index()].position.round() as i32
    }

    /// Hold an axis against an obstacle: it stops moving while driven.
    pub fn block_axis(&mut self, axis: Axis, blocked: bool) {
        self.axes[axis.index()].blocked = blocked;
    }

    pub fn press(&mut self, button: Button) {
        self.held[button.index()] = true;
    }

    pub fn release(&mut self, button: Button) {
        self.held[button.index()] = false;
    }

    pub fn release_all(&mut self) {
        self.held = [false; 6];
    }

    pub fn set_power_switch(&mut self, engaged: bool) {
        self.power_switch = engaged;
    }

    pub fn set_needle_disable(&mut self, asserted: bool) {
        self.needle_disable = asserted;
    }

    // ─── Observation ────────────────────────────────────────────────

    #[inline]
    pub const fn lines(&self) -> DriverLines {
        self.lines
    }

    #[inline]
    pub const fn buzzer(&self) -> bool {
        self.lines.buzzer
    }

    /// Physics steps taken so far.
    #[inline]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Axis driven by the current lines, with its signed speed.
    pub fn motion(&self) -> Option<(Axis, f64)> {
        let lines = &self.lines;
        if !(lines.driver_enable && lines.run && lines.general_enable && self.power_switch) {
            return None;
        }
        let axis = lines.selected_axis()?;
        let speed = SPEED_PER_LEVEL[usize::from(lines.power_level())];
        // Direction high is XRight (minus), YField (plus), ZDown (plus).
        let plus = match axis {
            Axis::X => !lines.direction,
            Axis::Y | Axis::Z => lines.direction,
        };
        Some((axis, if plus { speed } else { -speed }))
    }

    fn step_physics(&mut self) {
        self.ticks += 1;
        if let Some((axis, velocity)) = self.motion() {
            self.axes[axis.index()].advance(velocity);
            trace!(%axis, position = self.axes[axis.index()].position, "sim step");
        }
    }
}

impl DriverPins for SimulatedStage {
    fn set_driver_enable(&mut self, on: bool) {
        self.lines.driver_enable = on;
    }

    fn set_enable_a(&mut self, on: bool) {
        self.lines.enable_a = on;
    }

    fn set_enable_b(&mut self, on: bool) {
        self.lines.enable_b = on;
    }

    fn set_run(&mut self, on: bool) {
        self.lines.run = on;
    }

    fn set_direction(&mut self, high: bool) {
        self.lines.direction = high;
    }

    fn set_power_select(&mut self, index: usize, on: bool) {
        if let Some(line) = self.lines.power_select.get_mut(index) {
            *line = on;
        }
    }

    fn set_general_enable(&mut self, on: bool) {
        self.lines.general_enable = on;
    }
}

impl PanelIo for SimulatedStage {
    fn button_line(&mut self, button: Button) -> bool {
        !self.held[button.index()]
    }

    fn set_keyboard_enable(&mut self, on: bool) {
        self.lines.keyboard_enable = on;
    }

    fn set_buzzer(&mut self, on: bool) {
        self.lines.buzzer = on;
    }

    fn enable_feedback(&mut self) -> bool {
        self.power_switch
    }

    fn needle_disable_feedback(&mut self) -> bool {
        self.needle_disable
    }
}

impl SensorAdc for SimulatedStage {
    fn begin_sampling(&mut self) {
        self.step_physics();
    }

    fn read_adc(&mut self, channel: AdcChannel) -> u16 {
        let position = self.axes[channel as usize].position.round() as i32;
        (position + self.zero_offset).clamp(0, i32::from(ADC_MAX)) as u16
    }
}
