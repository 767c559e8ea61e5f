//! Integration test: host-commanded moves on the simulated stage.
//!
//! Validates the ramped approach, completion and abort reports, and the
//! move validation order.

use stage_common::motor::error::MoveError;
use stage_common::motor::state::{ActivationMode, Axis, ExecMode};
use stage_common::protocol::ProtocolReport;
use stage_control_unit::sim::SimulatedStage;
use stage_control_unit::state::supervisor::MotorController;

use super::{controller_at, enter, tick_until};

fn commanding(x: i32, y: i32, z: i32) -> MotorController<SimulatedStage> {
    let mut ctl = controller_at(x, y, z);
    enter(&mut ctl, ExecMode::Command);
    ctl
}

fn reported_position(report: ProtocolReport) -> u16 {
    match report {
        ProtocolReport::Executed { d0, d1 } => u16::from_le_bytes([d0, d1]),
        ProtocolReport::Aborted => panic!("move aborted"),
    }
}

// ── Completion ──────────────────────────────────────────────────────

#[test]
fn x_move_ramps_down_and_reports_arrival() {
    let mut ctl = commanding(100, 100, 100);
    ctl.request_move(Axis::X, 2400).unwrap();
    assert_eq!(ctl.move_in_progress(), Some(Axis::X));

    let mut powers = Vec::new();
    let ticks = tick_until(&mut ctl, 1_000, |c| {
        c.state().activation == ActivationMode::XShort
    });
    assert!(ticks.is_some(), "move never completed");

    let report = ctl.pop_report().expect("completion report");
    let position = reported_position(report);
    assert!(position.abs_diff(2400) <= 1, "arrived at {position}");
    assert_eq!(ctl.move_in_progress(), None);
    assert_eq!(ctl.status().position(Axis::X), position);

    // Restart from a fresh stage and watch the ramp.
    let mut ctl = commanding(100, 100, 100);
    ctl.request_move(Axis::X, 2400).unwrap();
    while ctl.move_in_progress().is_some() {
        ctl.tick();
        if ctl.state().activation.is_moving() {
            powers.push(ctl.state().power);
        }
    }
    assert_eq!(powers.first(), Some(&7));
    assert_eq!(powers.last(), Some(&0));
    assert!(powers.windows(2).all(|w| w[0] >= w[1]), "ramp not monotonic");
}

#[test]
fn brake_hold_then_disable_after_arrival() {
    let mut ctl = commanding(2300, 100, 100);
    ctl.request_move(Axis::X, 2310).unwrap();
    tick_until(&mut ctl, 200, |c| c.move_in_progress().is_none()).unwrap();
    assert_eq!(ctl.state().activation, ActivationMode::XShort);

    let hold = ctl.config().brake_release_ticks();
    let released = tick_until(&mut ctl, hold + 2, |c| {
        c.state().activation == ActivationMode::Disabled
    });
    assert!(released.is_some());
    assert!(!ctl.hal().lines().driver_enable);
    assert!(ctl.hal().lines().general_enable);
}

#[test]
fn y_move_reports_in_tenths() {
    let mut ctl = commanding(100, 100, 100);
    ctl.request_move(Axis::Y, 550).unwrap();
    tick_until(&mut ctl, 1_000, |c| c.move_in_progress().is_none()).unwrap();
    let position = reported_position(ctl.pop_report().unwrap());
    assert!(position.abs_diff(550) <= 1, "arrived at {position}");
    let native = ctl.hal().position(Axis::Y);
    assert!((native - 1375).abs() < 4, "{native}");
}

#[test]
fn z_lift_never_drops_below_minimum_power() {
    let mut ctl = commanding(100, 100, 1000);
    let min = ctl.config().z.min_power_minus;
    ctl.request_move(Axis::Z, 0).unwrap();

    while ctl.move_in_progress().is_some() {
        ctl.tick();
        if ctl.state().activation == ActivationMode::ZUp {
            assert!(ctl.state().power >= min, "power {}", ctl.state().power);
        }
        assert!(ctl.tick_count() < 2_000, "lift never completed");
    }
    assert!(ctl.hal().position(Axis::Z) < 2);
    assert!(matches!(ctl.pop_report(), Some(ProtocolReport::Executed { .. })));
}

// ── Validation ──────────────────────────────────────────────────────

#[test]
fn already_in_position_is_idempotent() {
    let mut ctl = controller_at(1000, 100, 100);
    let lines = ctl.hal().lines();

    // Answered in any mode, before the mode check.
    assert_eq!(
        ctl.request_move(Axis::X, 1000),
        Err(MoveError::AlreadyInPosition {
            axis: Axis::X,
            position: 1000
        })
    );
    enter(&mut ctl, ExecMode::Command);
    let lines_in_command = ctl.hal().lines();
    for _ in 0..3 {
        assert!(matches!(
            ctl.request_move(Axis::X, 1000),
            Err(MoveError::AlreadyInPosition { .. })
        ));
        ctl.tick();
    }
    assert_eq!(ctl.move_in_progress(), None);
    assert_eq!(ctl.hal().lines(), lines_in_command);
    assert_eq!(lines.driver_enable, lines_in_command.driver_enable);
    assert_eq!(ctl.pop_report(), None);
}

#[test]
fn rejection_order() {
    let mut ctl = controller_at(100, 100, 100);

    assert!(matches!(
        ctl.request_move(Axis::Y, 601),
        Err(MoveError::InvalidPosition { limit: 600, .. })
    ));
    assert_eq!(
        ctl.request_move(Axis::Y, 300),
        Err(MoveError::InvalidMode(ExecMode::Disable))
    );

    enter(&mut ctl, ExecMode::Calibration);
    assert_eq!(
        ctl.request_move(Axis::Y, 300),
        Err(MoveError::InvalidMode(ExecMode::Calibration))
    );

    enter(&mut ctl, ExecMode::Command);
    ctl.hal_mut().set_power_switch(false);
    ctl.tick();
    assert_eq!(ctl.request_move(Axis::Y, 300), Err(MoveError::DisableCondition));
    // Limit still checked first.
    assert!(matches!(
        ctl.request_move(Axis::Z, 1001),
        Err(MoveError::InvalidPosition { .. })
    ));

    ctl.hal_mut().set_power_switch(true);
    ctl.tick();
    ctl.request_move(Axis::Y, 300).unwrap();
    for axis in Axis::ALL {
        assert_eq!(ctl.request_move(axis, 500), Err(MoveError::Busy(Axis::Y)));
    }
}

// ── Abort ───────────────────────────────────────────────────────────

#[test]
fn abort_stops_within_one_tick() {
    let mut ctl = commanding(100, 100, 100);
    ctl.request_move(Axis::X, 2000).unwrap();
    for _ in 0..50 {
        ctl.tick();
    }
    assert_eq!(ctl.state().activation, ActivationMode::XLeft);

    ctl.request_abort();
    ctl.tick();
    assert_eq!(ctl.state().activation, ActivationMode::Disabled);
    assert!(!ctl.hal().lines().driver_enable);
    assert!(!ctl.state().abort_request);
    assert_eq!(ctl.move_in_progress(), None);
    assert_eq!(ctl.pop_report(), Some(ProtocolReport::Aborted));
    assert_eq!(ctl.exec_mode(), ExecMode::Command);

    let stopped_at = ctl.hal().position(Axis::X);
    for _ in 0..10 {
        ctl.tick();
    }
    assert_eq!(ctl.hal().position(Axis::X), stopped_at);
}

#[test]
fn power_switch_loss_aborts_the_move() {
    let mut ctl = commanding(100, 100, 100);
    ctl.request_move(Axis::X, 2000).unwrap();
    for _ in 0..10 {
        ctl.tick();
    }
    ctl.hal_mut().set_power_switch(false);
    ctl.tick();
    assert_eq!(ctl.state().activation, ActivationMode::Disabled);
    assert_eq!(ctl.pop_report(), Some(ProtocolReport::Aborted));
}

#[test]
fn mode_change_mid_move_reports_abort() {
    let mut ctl = commanding(100, 100, 100);
    ctl.request_move(Axis::Z, 800).unwrap();
    for _ in 0..10 {
        ctl.tick();
    }
    enter(&mut ctl, ExecMode::Disable);
    assert_eq!(ctl.state().activation, ActivationMode::Disabled);
    assert_eq!(ctl.pop_report(), Some(ProtocolReport::Aborted));
    assert_eq!(ctl.pop_report(), None);
}

#[test]
fn new_move_after_completion() {
    let mut ctl = commanding(500, 100, 100);
    ctl.request_move(Axis::X, 520).unwrap();
    tick_until(&mut ctl, 500, |c| c.move_in_progress().is_none()).unwrap();
    ctl.request_move(Axis::X, 480).unwrap();
    tick_until(&mut ctl, 500, |c| c.move_in_progress().is_none()).unwrap();

    let first = reported_position(ctl.pop_report().unwrap());
    let second = reported_position(ctl.pop_report().unwrap());
    assert!(first.abs_diff(520) <= 1);
    assert!(second.abs_diff(480) <= 1);
}
