//! Distance-proportional power ramp shared by Command and Service.

use stage_common::motor::config::MotorConfig;
use stage_common::motor::state::{Axis, Direction};

/// Next control action toward a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approach {
    /// Closer than the in-position window: brake now.
    Arrived,
    Drive { direction: Direction, power: u8 },
}

/// Power for a signed native distance: ramp table on |distance| in 0.1 mm,
/// raised to the axis minimum for `direction`.
pub fn ramp_power(config: &MotorConfig, axis: Axis, direction: Direction, distance: i32) -> u8 {
    let axis_config = config.axis(axis);
    let tenths = axis_config.scale.to_tenths(distance).unsigned_abs();
    config
        .ramp
        .power_for(tenths)
        .max(axis_config.min_power(direction))
}

/// Decide how to move `axis` from `position` to `target` (both native).
pub fn approach(config: &MotorConfig, axis: Axis, position: i32, target: i32) -> Approach {
    let distance = target - position;
    if distance.abs() < config.in_position_native {
        return Approach::Arrived;
    }
    match Direction::toward(distance) {
        Some(direction) => Approach::Drive {
            direction,
            power: ramp_power(config, axis, direction, distance),
        },
        None => Approach::Arrived,
    }
}
