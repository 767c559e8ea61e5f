//! Driver output: activation mode → pin pattern, power level → select lines.
//!
//! | Mode      | DRIVER_ENA | A | B | MOT_STOP | DIR  |
//! |-----------|------------|---|---|----------|------|
//! | Disabled  | 0          | - | - | -        | -    |
//! | XLeft     | 1          | 1 | 1 | 1        | 0    |
//! | XRight    | 1          | 1 | 1 | 1        | 1    |
//! | XShort    | 1          | 1 | 1 | 0        | -    |
//! | YHome     | 1          | 0 | 1 | 1        | 0    |
//! | YField    | 1          | 0 | 1 | 1        | 1    |
//! | YShort    | 1          | 0 | 1 | 0        | -    |
//! | ZUp       | 1          | 1 | 0 | 1        | 0    |
//! | ZDown     | 1          | 1 | 0 | 1        | 1    |
//! | ZShort    | 1          | 1 | 0 | 0        | -    |
//!
//! `-` lines keep their previous level.

use stage_common::consts::MAX_POWER;
use stage_common::motor::state::{ActivationMode, Axis};
use static_assertions::const_assert_eq;

use crate::hal::DriverPins;

/// Number of power select lines.
pub const POWER_SELECT_LINES: usize = 3;

const_assert_eq!(1 << POWER_SELECT_LINES, MAX_POWER as usize + 1);

/// Lines asserted for one activation mode. `None` leaves a line untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinPattern {
    pub driver_enable: bool,
    /// Axis select lines (A, B).
    pub select: Option<(bool, bool)>,
    pub run: Option<bool>,
    pub direction: Option<bool>,
}

const fn axis_select(axis: Axis) -> (bool, bool) {
    match axis {
        Axis::X => (true, true),
        Axis::Y => (false, true),
        Axis::Z => (true, false),
    }
}

/// Pin pattern of `mode`.
pub const fn pin_pattern(mode: ActivationMode) -> PinPattern {
    let Some(axis) = mode.axis() else {
        return PinPattern {
            driver_enable: false,
            select: None,
            run: None,
            direction: None,
        };
    };

    let direction = match mode {
        ActivationMode::XLeft | ActivationMode::YHome | ActivationMode::ZUp => Some(false),
        ActivationMode::XRight | ActivationMode::YField | ActivationMode::ZDown => Some(true),
        _ => None,
    };

    PinPattern {
        driver_enable: true,
        select: Some(axis_select(axis)),
        run: Some(!mode.is_short()),
        direction,
    }
}

/// Write the pin pattern of `mode`.
pub fn apply_mode<P: DriverPins>(pins: &mut P, mode: ActivationMode) {
    let pattern = pin_pattern(mode);
    pins.set_driver_enable(pattern.driver_enable);
    if let Some((a, b)) = pattern.select {
        pins.set_enable_b(b);
        pins.set_enable_a(a);
    }
    if let Some(run) = pattern.run {
        pins.set_run(run);
    }
    if let Some(high) = pattern.direction {
        pins.set_direction(high);
    }
}

/// Select line levels for a power level. Lines carry `7 - level`.
#[inline]
pub const fn power_select_lines(level: u8) -> [bool; POWER_SELECT_LINES] {
    let code = MAX_POWER - clamp_power(level);
    [code & 0b001 != 0, code & 0b010 != 0, code & 0b100 != 0]
}

/// Power level encoded by a set of select lines.
#[inline]
pub const fn decode_power_lines(lines: [bool; POWER_SELECT_LINES]) -> u8 {
    let code = lines[0] as u8 | (lines[1] as u8) << 1 | (lines[2] as u8) << 2;
    MAX_POWER - code
}

#[inline]
pub const fn clamp_power(level: u8) -> u8 {
    if level > MAX_POWER { MAX_POWER } else { level }
}

/// Write the select lines for `level` and return the clamped level.
pub fn apply_power<P: DriverPins>(pins: &mut P, level: u8) -> u8 {
    let level = clamp_power(level);
    for (index, on) in power_select_lines(level).into_iter().enumerate() {
        pins.set_power_select(index, on);
    }
    level
}
