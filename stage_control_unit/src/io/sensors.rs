//! Position sensor sampling.
//!
//! One pass per tick converts the three raw ADC counts into signed native
//! positions (`raw - zero_offset`). Working values may be negative; only the
//! reported values are clamped.

use stage_common::motor::config::MotorConfig;
use stage_common::motor::state::Axis;

use crate::hal::{AdcChannel, SensorAdc};

/// Latest native positions of all three axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisPositions([i32; 3]);

impl AxisPositions {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self([x, y, z])
    }

    #[inline]
    pub const fn get(&self, axis: Axis) -> i32 {
        self.0[axis.index()]
    }

    #[inline]
    pub fn set(&mut self, axis: Axis, position: i32) {
        self.0[axis.index()] = position;
    }

    /// Positions converted to 0.1 mm, in X/Y/Z order.
    pub fn to_tenths(&self, config: &MotorConfig) -> [i32; 3] {
        Axis::ALL.map(|axis| config.axis(axis).scale.to_tenths(self.get(axis)))
    }
}

/// Converts raw ADC counts into native positions.
#[derive(Debug, Clone, Copy)]
pub struct SensorSampler {
    zero_offset: i32,
}

impl SensorSampler {
    pub const fn new(zero_offset: i32) -> Self {
        Self { zero_offset }
    }

    #[inline]
    pub const fn convert(&self, raw: u16) -> i32 {
        raw as i32 - self.zero_offset
    }

    /// Read all three channels in X, Y, Z order.
    pub fn sample<A: SensorAdc>(&self, adc: &mut A) -> AxisPositions {
        adc.begin_sampling();
        let mut positions = AxisPositions::default();
        for axis in Axis::ALL {
            let raw = adc.read_adc(AdcChannel::from(axis));
            positions.set(axis, self.convert(raw));
        }
        positions
    }
}
