//! Hardware capabilities consumed by the controller.
//!
//! Register programming lives behind these traits. The controller only ever
//! sets or reads individual lines; [`crate::sim::SimulatedStage`] implements
//! all of them for tests and the simulation binary.

use stage_common::motor::state::{Axis, Button};

/// Position sensor ADC channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AdcChannel {
    X = 0,
    Y = 1,
    Z = 2,
}

impl From<Axis> for AdcChannel {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::X => Self::X,
            Axis::Y => Self::Y,
            Axis::Z => Self::Z,
        }
    }
}

/// Motor driver output lines.
pub trait DriverPins {
    /// DRIVER_ENA: powers the selected driver bridge.
    fn set_driver_enable(&mut self, on: bool);
    /// Axis select line A.
    fn set_enable_a(&mut self, on: bool);
    /// Axis select line B.
    fn set_enable_b(&mut self, on: bool);
    /// MOT_STOP: set lets the motor run, clear shorts both terminals.
    fn set_run(&mut self, on: bool);
    /// Direction line level.
    fn set_direction(&mut self, high: bool);
    /// Power select line `index` (0..3, VSEL0..VSEL2).
    fn set_power_select(&mut self, index: usize, on: bool);
    /// Request to the safety power switch.
    fn set_general_enable(&mut self, on: bool);
}

/// Operator panel: buttons, keyboard enable, buzzer and interlock feedback.
pub trait PanelIo {
    /// Raw level of a button line. Buttons are active low.
    fn button_line(&mut self, button: Button) -> bool;
    fn set_keyboard_enable(&mut self, on: bool);
    fn set_buzzer(&mut self, on: bool);
    /// Power switch engaged.
    fn enable_feedback(&mut self) -> bool;
    /// Needle-presence interlock asserted.
    fn needle_disable_feedback(&mut self) -> bool;
}

/// Position sensor converter.
pub trait SensorAdc {
    /// Start of a sampling pass. Called once per tick before the conversions.
    fn begin_sampling(&mut self) {}

    /// Single blocking conversion. Busy-waits a few microseconds at most.
    fn read_adc(&mut self, channel: AdcChannel) -> u16;
}

/// Everything the controller needs from the board.
pub trait StageHal: DriverPins + PanelIo + SensorAdc {}

impl<T: DriverPins + PanelIo + SensorAdc> StageHal for T {}
