//! Integration test: service test cycle on the simulated stage.

use stage_common::motor::state::{ActivationMode, Axis, Button, ExecMode};
use stage_control_unit::sim::SimulatedStage;
use stage_control_unit::state::supervisor::{ModeContext, MotorController};

use super::{controller_at, enter};

fn servicing() -> MotorController<SimulatedStage> {
    let mut ctl = controller_at(200, 100, 1000);
    enter(&mut ctl, ExecMode::Service);
    assert!(ctl.request_test_cycle());
    ctl
}

fn sequence(ctl: &MotorController<SimulatedStage>) -> usize {
    match ctl.mode() {
        ModeContext::Service(service) => service.sequence(),
        other => panic!("not in service mode: {other:?}"),
    }
}

#[test]
fn cycle_visits_steps_in_order_and_repeats() {
    let mut ctl = servicing();
    let mut visited: Vec<ActivationMode> = Vec::new();

    for _ in 0..30_000 {
        ctl.tick();
        let activation = ctl.state().activation;
        if activation.is_moving() && visited.last() != Some(&activation) {
            visited.push(activation);
        }
        if visited.len() == 7 {
            break;
        }
    }

    assert_eq!(
        visited,
        [
            ActivationMode::ZUp,
            ActivationMode::XLeft,
            ActivationMode::YField,
            ActivationMode::YHome,
            ActivationMode::XRight,
            ActivationMode::ZDown,
            ActivationMode::ZUp,
        ]
    );
    assert!(ctl.service_running());
    assert!(ctl.hal().lines().general_enable);
    assert_eq!(sequence(&ctl), 0);
}

#[test]
fn steps_land_on_configured_targets() {
    let mut ctl = servicing();
    let service = ctl.config().service;
    let mut last = sequence(&ctl);

    for _ in 0..30_000 {
        ctl.tick();
        let now = sequence(&ctl);
        if now != last {
            let (axis, target) = service.steps()[last];
            let reached = ctl.config().axis(axis).scale.to_tenths(ctl.hal().position(axis));
            assert!(
                (reached - i32::from(target)).abs() <= 1,
                "step {last}: {axis} at {reached}, target {target}"
            );
            last = now;
            if now == 0 {
                return;
            }
        }
    }
    panic!("service cycle never wrapped");
}

#[test]
fn key_press_cancels_the_cycle() {
    let mut ctl = servicing();
    for _ in 0..30 {
        ctl.tick();
    }
    assert_eq!(ctl.state().activation, ActivationMode::ZUp);

    ctl.hal_mut().press(Button::XPlus);
    ctl.tick();
    assert!(!ctl.service_running());
    assert_eq!(ctl.state().activation, ActivationMode::Disabled);
    assert!(!ctl.hal().lines().general_enable);
    assert_eq!(ctl.exec_mode(), ExecMode::Service);

    // Releasing does not restart it.
    ctl.hal_mut().release_all();
    let z = ctl.hal().position(Axis::Z);
    for _ in 0..20 {
        ctl.tick();
    }
    assert!(!ctl.service_running());
    assert_eq!(ctl.hal().position(Axis::Z), z);
}

#[test]
fn abort_cancels_and_toggle_restarts() {
    let mut ctl = servicing();
    for _ in 0..10 {
        ctl.tick();
    }
    ctl.request_abort();
    ctl.tick();
    assert!(!ctl.service_running());
    assert!(!ctl.state().abort_request);
    assert_eq!(ctl.state().activation, ActivationMode::Disabled);

    assert!(ctl.request_test_cycle());
    ctl.tick();
    assert!(ctl.service_running());
    assert_eq!(sequence(&ctl), 0);
    assert_eq!(ctl.state().activation, ActivationMode::ZUp);
}

#[test]
fn power_switch_loss_cancels_the_cycle() {
    let mut ctl = servicing();
    for _ in 0..10 {
        ctl.tick();
    }
    assert_eq!(ctl.state().activation, ActivationMode::ZUp);

    ctl.hal_mut().set_power_switch(false);
    ctl.tick();
    assert!(!ctl.service_running());
    assert_eq!(ctl.state().activation, ActivationMode::Disabled);
    assert!(!ctl.hal().lines().general_enable);

    // Switch back on: the cycle stays stopped until toggled again.
    ctl.hal_mut().set_power_switch(true);
    let z = ctl.hal().position(Axis::Z);
    for _ in 0..20 {
        ctl.tick();
    }
    assert!(!ctl.service_running());
    assert_eq!(ctl.hal().position(Axis::Z), z);
}

#[test]
fn host_toggle_stops_the_cycle() {
    let mut ctl = servicing();
    ctl.tick();
    assert!(ctl.service_running());
    assert!(ctl.request_test_cycle());
    ctl.tick();
    assert!(!ctl.service_running());
    assert_eq!(ctl.state().activation, ActivationMode::Disabled);
}

#[test]
fn test_cycle_refused_outside_service() {
    let mut ctl = controller_at(200, 100, 1000);
    for mode in [ExecMode::Disable, ExecMode::Calibration, ExecMode::Command] {
        enter(&mut ctl, mode);
        assert!(!ctl.request_test_cycle(), "{mode}");
        ctl.tick();
        assert!(!ctl.service_running());
    }
}
