//! Process-wide motor state.
//!
//! Initialised once at boot (Disable, motors off, power 0) and mutated only
//! inside the tick. Mode sub-states live in the supervisor's mode context,
//! not here.

use heapless::Deque;
use stage_common::consts::REPORT_QUEUE_LEN;
use stage_common::motor::error::StatusFlags;
use stage_common::motor::state::{ActivationMode, Axis};
use stage_common::protocol::ProtocolReport;

use crate::io::keyboard::Keyboard;
use crate::io::sensors::AxisPositions;

#[derive(Debug, Clone)]
pub struct MotorState {
    /// Request to the safety power switch.
    pub general_enable: bool,
    /// Power switch engaged (sampled).
    pub enable_feedback: bool,
    /// Needle-presence interlock (sampled).
    pub needle_disable_feedback: bool,
    /// Last activation mode written to the driver.
    pub activation: ActivationMode,
    /// Last power level written to the select lines.
    pub power: u8,
    /// Native sensor positions of the current tick.
    pub positions: AxisPositions,
    pub keyboard: Keyboard,
    pub abort_request: bool,
    /// Calibration keep-alive [s].
    pub keep_alive: u16,
    reports: Deque<ProtocolReport, REPORT_QUEUE_LEN>,
}

impl Default for MotorState {
    fn default() -> Self {
        Self::new()
    }
}

impl MotorState {
    pub const fn new() -> Self {
        Self {
            general_enable: false,
            enable_feedback: false,
            needle_disable_feedback: false,
            activation: ActivationMode::Disabled,
            power: 0,
            positions: AxisPositions::new(0, 0, 0),
            keyboard: Keyboard::new(),
            abort_request: false,
            keep_alive: 0,
            reports: Deque::new(),
        }
    }

    #[inline]
    pub const fn position(&self, axis: Axis) -> i32 {
        self.positions.get(axis)
    }

    /// Mode register byte 1.
    pub fn status_flags(&self) -> StatusFlags {
        let mut flags = StatusFlags::empty();
        flags.set(StatusFlags::POWER_SWITCH, self.enable_feedback);
        flags.set(StatusFlags::GENERAL_ENABLE, self.general_enable);
        flags.set(StatusFlags::KEYBOARD_ENABLE, self.keyboard.enabled());
        flags.set(StatusFlags::NEEDLE_DISABLE, self.needle_disable_feedback);
        flags
    }

    /// Queue an asynchronous report. A full queue drops its oldest entry.
    pub fn push_report(&mut self, report: ProtocolReport) {
        if self.reports.is_full() {
            let dropped = self.reports.pop_front();
            tracing::warn!(?dropped, "report queue full, dropping oldest");
        }
        // Cannot fail: a slot was freed above if needed.
        let _ = self.reports.push_back(report);
    }

    pub fn pop_report(&mut self) -> Option<ProtocolReport> {
        self.reports.pop_front()
    }

    pub fn pending_reports(&self) -> usize {
        self.reports.len()
    }
}
