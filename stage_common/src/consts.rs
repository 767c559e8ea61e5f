//! System-wide constants for the stage workspace.
//!
//! Single source of truth for all timing and travel defaults.
//! Configuration defaults are built from these values.

/// Main control tick period in microseconds (7.8 ms).
pub const TICK_PERIOD_US: u32 = 7_800;

/// Lower bound for a configured tick period [µs].
pub const TICK_PERIOD_US_MIN: u32 = 1_000;

/// Upper bound for a configured tick period [µs].
pub const TICK_PERIOD_US_MAX: u32 = 100_000;

/// Period of the slow timer tick in microseconds (1 Hz).
pub const SECOND_TICK_US: u32 = 1_000_000;

/// Raw ADC count that corresponds to position zero.
pub const ADC_ZERO_OFFSET: i32 = 50;

/// Calibration keep-alive [s].
pub const KEEP_ALIVE_S: u16 = 60;

/// Press duration that arms the calibration entry [ms].
pub const LONG_PRESS_MS: u32 = 1_000;

/// Brake hold after a jog or a completed move [ms].
pub const BRAKE_RELEASE_MS: u32 = 200;

/// Jogging axis with no position change for this long is reported blocked [ms].
pub const STALL_WINDOW_MS: u32 = 500;

/// Buzzer pulse on/off length [ms].
pub const BUZZER_PULSE_MS: u32 = 100;

/// X travel limit [0.1 mm] (250 mm).
pub const TRAVEL_LIMIT_X: u16 = 2_500;

/// Y travel limit [0.1 mm] (60 mm).
pub const TRAVEL_LIMIT_Y: u16 = 600;

/// Z travel limit [0.1 mm] (100 mm).
pub const TRAVEL_LIMIT_Z: u16 = 1_000;

/// A moving axis is braked once closer than this to its target [native units].
pub const IN_POSITION_NATIVE: i32 = 2;

/// Highest driver power level.
pub const MAX_POWER: u8 = 7;

/// Default power level used while jogging in calibration.
pub const JOG_POWER: u8 = 3;

/// Capacity of the outbound protocol report queue.
pub const REPORT_QUEUE_LEN: usize = 8;

/// Number of ticks closest to `ms` at the given tick period.
#[inline]
pub const fn ticks_for_ms(ms: u32, tick_period_us: u32) -> u32 {
    let us = ms as u64 * 1_000;
    let tick = tick_period_us as u64;
    ((us + tick / 2) / tick) as u32
}
