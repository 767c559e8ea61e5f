//! Buzzer pattern generator and jog stall detection.
//!
//! Three signals share one buzzer:
//! - continuous tone while the Disable long press is armed,
//! - single pulse when a calibration jog stops at its travel bound,
//! - double pulse when a jogging axis has not moved for the stall window.
//!
//! Pulses and gaps last `pulse_ms` each. A new pattern replaces a running one.

use stage_common::consts::ticks_for_ms;
use stage_common::motor::config::MotorConfig;
use stage_common::motor::state::ActivationMode;

use crate::hal::PanelIo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuzzerPattern {
    Single,
    Double,
}

impl BuzzerPattern {
    /// Number of on/off segments, starting and ending with "on".
    const fn segments(self) -> u8 {
        match self {
            Self::Single => 1,
            Self::Double => 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Indicator {
    pulse_ticks: u32,
    stall_ticks: u32,
    continuous: bool,
    segments_left: u8,
    segment_ticks_left: u32,
    watched: ActivationMode,
    last_position: i32,
    still_ticks: u32,
    stall_reported: bool,
    output: bool,
}

impl Indicator {
    pub fn new(config: &MotorConfig) -> Self {
        let tick = config.tick_period_us;
        Self {
            pulse_ticks: ticks_for_ms(config.indicator.pulse_ms, tick).max(1),
            stall_ticks: ticks_for_ms(config.indicator.stall_window_ms, tick).max(1),
            continuous: false,
            segments_left: 0,
            segment_ticks_left: 0,
            watched: ActivationMode::Disabled,
            last_position: 0,
            still_ticks: 0,
            stall_reported: false,
            output: false,
        }
    }

    pub fn set_continuous(&mut self, on: bool) {
        self.continuous = on;
    }

    pub fn pulse(&mut self, pattern: BuzzerPattern) {
        self.segments_left = pattern.segments();
        self.segment_ticks_left = self.pulse_ticks;
    }

    /// Silence everything and forget the watched jog.
    pub fn reset(&mut self) {
        self.continuous = false;
        self.segments_left = 0;
        self.segment_ticks_left = 0;
        self.watch_none();
    }

    /// Track a jogging axis. A position unchanged for the stall window
    /// triggers one double pulse per jog.
    pub fn observe_jog(&mut self, mode: ActivationMode, position: i32) {
        if !mode.is_moving() {
            self.watch_none();
            return;
        }
        if mode != self.watched {
            self.watched = mode;
            self.last_position = position;
            self.still_ticks = 0;
            self.stall_reported = false;
            return;
        }
        if position != self.last_position {
            self.last_position = position;
            self.still_ticks = 0;
            return;
        }
        self.still_ticks = self.still_ticks.saturating_add(1);
        if self.still_ticks >= self.stall_ticks && !self.stall_reported {
            self.stall_reported = true;
            tracing::debug!(?mode, position, "jog stalled");
            self.pulse(BuzzerPattern::Double);
        }
    }

    fn watch_none(&mut self) {
        self.watched = ActivationMode::Disabled;
        self.still_ticks = 0;
        self.stall_reported = false;
    }

    /// Advance one tick and drive the buzzer line.
    pub fn update<P: PanelIo>(&mut self, panel: &mut P) {
        let mut pulse_on = false;
        if self.segments_left > 0 {
            pulse_on = self.segments_left % 2 == 1;
            self.segment_ticks_left = self.segment_ticks_left.saturating_sub(1);
            if self.segment_ticks_left == 0 {
                self.segments_left -= 1;
                self.segment_ticks_left = self.pulse_ticks;
            }
        }
        self.output = self.continuous || pulse_on;
        panel.set_buzzer(self.output);
    }

    /// Buzzer level written by the last update.
    #[inline]
    pub const fn is_sounding(&self) -> bool {
        self.output
    }

    #[inline]
    pub const fn is_pulsing(&self) -> bool {
        self.segments_left > 0
    }
}
