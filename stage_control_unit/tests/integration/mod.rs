//! Shared fixtures for the integration suites.

mod command;
mod config_loading;
mod mode_supervisor;
mod protocol;
mod service;

use stage_common::motor::config::MotorConfig;
use stage_common::motor::state::{Axis, ExecMode};
use stage_control_unit::sim::SimulatedStage;
use stage_control_unit::state::supervisor::MotorController;

/// Controller on a default simulated stage, all axes at 0.
pub fn controller() -> MotorController<SimulatedStage> {
    let config = MotorConfig::default();
    MotorController::new(SimulatedStage::new(&config), config)
}

/// Controller with the stage at the given native positions.
pub fn controller_at(x: i32, y: i32, z: i32) -> MotorController<SimulatedStage> {
    let mut ctl = controller();
    ctl.hal_mut().set_position(Axis::X, x);
    ctl.hal_mut().set_position(Axis::Y, y);
    ctl.hal_mut().set_position(Axis::Z, z);
    ctl.tick();
    ctl
}

/// Request `mode` and tick once so it is applied.
pub fn enter(ctl: &mut MotorController<SimulatedStage>, mode: ExecMode) {
    ctl.request_mode(mode);
    ctl.tick();
    assert_eq!(ctl.exec_mode(), mode);
}

/// Tick until `done` holds or `limit` ticks have passed. Returns ticks used.
pub fn tick_until(
    ctl: &mut MotorController<SimulatedStage>,
    limit: u32,
    mut done: impl FnMut(&MotorController<SimulatedStage>) -> bool,
) -> Option<u32> {
    for n in 1..=limit {
        ctl.tick();
        if done(ctl) {
            return Some(n);
        }
    }
    None
}
