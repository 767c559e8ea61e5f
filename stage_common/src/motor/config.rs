//! Configuration structures for the motor controller.
//!
//! All config types use `serde::Deserialize` for TOML loading and
//! `#[serde(default)]` so a partial file only overrides what it names.
//! Defaults come from [`crate::consts`]. Positions are in 0.1 mm unless a
//! field says "native".

use serde::{Deserialize, Serialize};

use crate::consts::{
    ADC_ZERO_OFFSET, BRAKE_RELEASE_MS, BUZZER_PULSE_MS, IN_POSITION_NATIVE, JOG_POWER,
    KEEP_ALIVE_S, LONG_PRESS_MS, MAX_POWER, STALL_WINDOW_MS, TICK_PERIOD_US, TICK_PERIOD_US_MAX,
    TICK_PERIOD_US_MIN, TRAVEL_LIMIT_X, TRAVEL_LIMIT_Y, TRAVEL_LIMIT_Z, ticks_for_ms,
};

use super::state::{Axis, Direction};

// ─── Unit Conversion ────────────────────────────────────────────────

/// Ratio between native sensor units and 0.1 mm.
///
/// `native` sensor units correspond to `tenths` × 0.1 mm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitScale {
    pub native: i32,
    pub tenths: i32,
}

impl UnitScale {
    pub const fn new(native: i32, tenths: i32) -> Self {
        Self { native, tenths }
    }

    /// Convert a 0.1 mm value to native units, rounded to nearest.
    #[inline]
    pub const fn to_native(&self, tenths: i32) -> i32 {
        div_round(tenths as i64 * self.native as i64, self.tenths as i64) as i32
    }

    /// Convert a native value to 0.1 mm, rounded to nearest.
    #[inline]
    pub const fn to_tenths(&self, native: i32) -> i32 {
        div_round(native as i64 * self.tenths as i64, self.native as i64) as i32
    }

    /// True when `position` (native) lies within ±0.5 native unit of `target` (0.1 mm).
    #[inline]
    pub const fn within_half_unit(&self, position: i32, target: i32) -> bool {
        let lhs = 2 * position as i64 * self.tenths as i64;
        let rhs = 2 * target as i64 * self.native as i64;
        (lhs - rhs).abs() < self.tenths as i64
    }
}

/// Integer division rounding half away from zero. `d` must be positive.
const fn div_round(n: i64, d: i64) -> i64 {
    if n >= 0 {
        (2 * n + d) / (2 * d)
    } else {
        -((-2 * n + d) / (2 * d))
    }
}

// ─── Per-Axis Config ────────────────────────────────────────────────

/// Per-axis limits, unit conversion and minimum drive power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisConfig {
    /// Maximum allowed position [0.1 mm].
    pub travel_limit: u16,
    /// Native-unit conversion.
    pub scale: UnitScale,
    /// Minimum power level when driving toward increasing position.
    #[serde(default)]
    pub min_power_plus: u8,
    /// Minimum power level when driving toward decreasing position.
    #[serde(default)]
    pub min_power_minus: u8,
}

impl AxisConfig {
    /// Travel limit in native units.
    #[inline]
    pub const fn travel_limit_native(&self) -> i32 {
        self.scale.to_native(self.travel_limit as i32)
    }

    #[inline]
    pub const fn min_power(&self, direction: Direction) -> u8 {
        match direction {
            Direction::Plus => self.min_power_plus,
            Direction::Minus => self.min_power_minus,
        }
    }

    fn validate(&self, axis: Axis) -> Result<(), String> {
        if self.travel_limit == 0 {
            return Err(format!("{axis} travel_limit must be > 0"));
        }
        if self.scale.native <= 0 || self.scale.tenths <= 0 {
            return Err(format!(
                "{axis} scale {}:{} must be positive",
                self.scale.native, self.scale.tenths
            ));
        }
        if self.min_power_plus > MAX_POWER || self.min_power_minus > MAX_POWER {
            return Err(format!("{axis} min_power out of range [0, {MAX_POWER}]"));
        }
        Ok(())
    }
}

// ─── Power Ramp ─────────────────────────────────────────────────────

/// Distance-to-power step table.
///
/// `thresholds[i]` is the distance [0.1 mm] that must be exceeded for power
/// level `7 - i`. Anything at or below the last threshold drives at level 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RampConfig {
    pub thresholds: [u16; 7],
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            thresholds: [1000, 500, 400, 300, 200, 100, 50],
        }
    }
}

impl RampConfig {
    /// Power level for an absolute distance [0.1 mm].
    pub fn power_for(&self, distance: u32) -> u8 {
        self.thresholds
            .iter()
            .position(|&t| distance > t as u32)
            .map_or(0, |i| MAX_POWER - i as u8)
    }

    fn validate(&self) -> Result<(), String> {
        if self.thresholds.windows(2).any(|w| w[0] <= w[1]) {
            return Err("ramp thresholds must be strictly descending".to_string());
        }
        Ok(())
    }
}

// ─── Service Cycle ──────────────────────────────────────────────────

/// Fixed targets of the six service test steps [0.1 mm].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub z_up: u16,
    pub x_out: u16,
    pub y_out: u16,
    pub y_home: u16,
    pub x_home: u16,
    pub z_down: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            z_up: 50,
            x_out: 2400,
            y_out: 550,
            y_home: 50,
            x_home: 100,
            z_down: 900,
        }
    }
}

impl ServiceConfig {
    /// Step table in execution order: Z up, X out, Y out, Y home, X home, Z down.
    pub const fn steps(&self) -> [(Axis, u16); 6] {
        [
            (Axis::Z, self.z_up),
            (Axis::X, self.x_out),
            (Axis::Y, self.y_out),
            (Axis::Y, self.y_home),
            (Axis::X, self.x_home),
            (Axis::Z, self.z_down),
        ]
    }
}

// ─── Indicator ──────────────────────────────────────────────────────

/// Buzzer timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Pulse on/off length [ms].
    pub pulse_ms: u32,
    /// No position change for this long while jogging means blocked [ms].
    pub stall_window_ms: u32,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            pulse_ms: BUZZER_PULSE_MS,
            stall_window_ms: STALL_WINDOW_MS,
        }
    }
}

// ─── Top-Level Motor Config ─────────────────────────────────────────

/// Motor controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    /// Main tick period [µs].
    pub tick_period_us: u32,
    /// Raw ADC count at position zero.
    pub adc_zero_offset: i32,
    pub x: AxisConfig,
    pub y: AxisConfig,
    pub z: AxisConfig,
    /// Calibration keep-alive [s].
    pub keep_alive_s: u16,
    /// Press duration that arms calibration entry [ms].
    pub long_press_ms: u32,
    /// Brake hold before disabling [ms].
    pub brake_release_ms: u32,
    /// Calibration jog power level.
    pub jog_power: u8,
    /// Moving axis is braked when closer than this to target [native].
    pub in_position_native: i32,
    pub ramp: RampConfig,
    pub service: ServiceConfig,
    pub indicator: IndicatorConfig,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            tick_period_us: TICK_PERIOD_US,
            adc_zero_offset: ADC_ZERO_OFFSET,
            x: AxisConfig {
                travel_limit: TRAVEL_LIMIT_X,
                scale: UnitScale::new(1, 1),
                min_power_plus: 0,
                min_power_minus: 0,
            },
            y: AxisConfig {
                travel_limit: TRAVEL_LIMIT_Y,
                scale: UnitScale::new(5, 2),
                min_power_plus: 0,
                min_power_minus: 0,
            },
            z: AxisConfig {
                travel_limit: TRAVEL_LIMIT_Z,
                scale: UnitScale::new(2, 1),
                min_power_plus: 0,
                // Lifting works against the load.
                min_power_minus: 2,
            },
            keep_alive_s: KEEP_ALIVE_S,
            long_press_ms: LONG_PRESS_MS,
            brake_release_ms: BRAKE_RELEASE_MS,
            jog_power: JOG_POWER,
            in_position_native: IN_POSITION_NATIVE,
            ramp: RampConfig::default(),
            service: ServiceConfig::default(),
            indicator: IndicatorConfig::default(),
        }
    }
}

impl MotorConfig {
    #[inline]
    pub const fn axis(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    /// Long-press threshold in ticks.
    #[inline]
    pub const fn long_press_ticks(&self) -> u32 {
        ticks_for_ms(self.long_press_ms, self.tick_period_us)
    }

    /// Brake hold in ticks.
    #[inline]
    pub const fn brake_release_ticks(&self) -> u32 {
        ticks_for_ms(self.brake_release_ms, self.tick_period_us)
    }

    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_period_us < TICK_PERIOD_US_MIN || self.tick_period_us > TICK_PERIOD_US_MAX {
            return Err(format!(
                "tick_period_us {} out of range [{}, {}]",
                self.tick_period_us, TICK_PERIOD_US_MIN, TICK_PERIOD_US_MAX
            ));
        }
        for axis in Axis::ALL {
            self.axis(axis).validate(axis)?;
        }
        if self.keep_alive_s == 0 {
            return Err("keep_alive_s must be > 0".to_string());
        }
        if self.jog_power > MAX_POWER {
            return Err(format!("jog_power {} out of range [0, {MAX_POWER}]", self.jog_power));
        }
        if self.in_position_native < 1 {
            return Err("in_position_native must be >= 1".to_string());
        }
        if self.long_press_ticks() == 0 {
            return Err("long_press_ms shorter than one tick".to_string());
        }
        if self.indicator.pulse_ms == 0 {
            return Err("indicator pulse_ms must be > 0".to_string());
        }
        self.ramp.validate()?;
        for (axis, target) in self.service.steps() {
            let limit = self.axis(axis).travel_limit;
            if target > limit {
                return Err(format!(
                    "service target {target} beyond {axis} travel limit {limit}"
                ));
            }
        }
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
