//! Integration test: host protocol through the cycle runner.
//!
//! Drives the controller with raw opcodes, the way the register multiplexer
//! would, and reads back status registers and asynchronous reports.

use std::sync::atomic::AtomicBool;

use stage_common::motor::error::StatusFlags;
use stage_common::motor::state::{Axis, ExecMode};
use stage_common::protocol::{CommandOutcome, ErrorCode, opcode};
use stage_control_unit::config::StageConfig;
use stage_control_unit::cycle::CycleRunner;
use stage_control_unit::sim::SimulatedStage;

fn runner() -> CycleRunner<SimulatedStage> {
    runner_with(StageConfig::default())
}

fn runner_with(config: StageConfig) -> CycleRunner<SimulatedStage> {
    CycleRunner::new(SimulatedStage::new(&config.motors), &config)
}

fn step_until(
    runner: &mut CycleRunner<SimulatedStage>,
    limit: u32,
    done: impl Fn(&CycleRunner<SimulatedStage>) -> bool,
) -> bool {
    for _ in 0..limit {
        runner.step();
        if done(runner) {
            return true;
        }
    }
    false
}

#[test]
fn move_round_trip() {
    let mut runner = runner();
    runner.controller_mut().hal_mut().set_position(Axis::X, 500);

    assert_eq!(
        runner.submit(opcode::COMMAND_MODE, &[]),
        CommandOutcome::Executed(ExecMode::Command.code(), 0)
    );
    runner.step();
    let status = *runner.controller().status();
    assert_eq!(status.exec_mode(), Some(ExecMode::Command));
    assert!(status.flags().contains(StatusFlags::GENERAL_ENABLE | StatusFlags::POWER_SWITCH));
    assert_eq!(status.position(Axis::X), 500);

    assert_eq!(
        runner.submit(opcode::MOVE_X, &800u16.to_le_bytes()),
        CommandOutcome::Executing
    );
    assert_eq!(
        runner.submit(opcode::MOVE_Y, &100u16.to_le_bytes()),
        CommandOutcome::Error(ErrorCode::Busy)
    );

    assert!(step_until(&mut runner, 1_000, |r| r.reports_sent() == 1));
    assert_eq!(runner.controller().move_in_progress(), None);
    let x = runner.controller().status().position(Axis::X);
    assert!(x.abs_diff(800) <= 1, "{x}");

    // Same target again: answered at once with the position.
    match runner.submit(opcode::MOVE_X, &x.to_le_bytes()) {
        CommandOutcome::Executed(lo, hi) => assert_eq!(u16::from_le_bytes([lo, hi]), x),
        other => panic!("unexpected outcome {other:?}"),
    }
    runner.step();
    assert_eq!(runner.reports_sent(), 1);
}

#[test]
fn abort_opcode_reports_aborted() {
    let mut runner = runner();
    runner.submit(opcode::COMMAND_MODE, &[]);
    runner.step();
    runner.submit(opcode::MOVE_Z, &900u16.to_le_bytes());
    for _ in 0..20 {
        runner.step();
    }
    assert_eq!(runner.controller().move_in_progress(), Some(Axis::Z));

    assert_eq!(runner.submit(opcode::ABORT, &[]), CommandOutcome::Executed(0, 0));
    runner.step();
    assert_eq!(runner.reports_sent(), 1);
    assert_eq!(runner.controller().move_in_progress(), None);
    assert!(!runner.controller().hal().lines().driver_enable);
}

#[test]
fn scripted_commands_run_on_their_tick() {
    let mut runner = runner();
    runner.schedule(1, opcode::MOVE_Y, &200u16.to_le_bytes());
    runner.schedule(0, opcode::COMMAND_MODE, &[]);

    runner.step();
    assert_eq!(runner.controller().exec_mode(), ExecMode::Command);
    assert_eq!(runner.controller().move_in_progress(), None);

    runner.step();
    assert_eq!(runner.controller().move_in_progress(), Some(Axis::Y));
}

#[test]
fn malformed_commands_are_rejected() {
    let mut runner = runner();
    assert_eq!(
        runner.submit(opcode::MOVE_Y, &[7]),
        CommandOutcome::Error(ErrorCode::InvalidData)
    );
    assert_eq!(
        runner.submit(0x7F, &[]),
        CommandOutcome::Error(ErrorCode::NotAvailable)
    );
    assert_eq!(
        runner.submit(opcode::MOVE_Y, &601u16.to_le_bytes()),
        CommandOutcome::Error(ErrorCode::InvalidData)
    );
    assert_eq!(
        runner.submit(opcode::MOVE_Y, &300u16.to_le_bytes()),
        CommandOutcome::Error(ErrorCode::NotAvailable)
    );
    runner.step();
    assert_eq!(runner.controller().exec_mode(), ExecMode::Disable);
}

#[test]
fn second_revision_test_cycle_opcode() {
    let mut config = StageConfig::default();
    config.protocol.test_cycle_opcode = opcode::TEST_CYCLE_REV2;
    let mut runner = runner_with(config);

    runner.submit(opcode::SERVICE_MODE, &[]);
    runner.step();
    assert_eq!(
        runner.submit(opcode::TEST_CYCLE_REV1, &[]),
        CommandOutcome::Error(ErrorCode::NotAvailable)
    );
    assert_eq!(
        runner.submit(opcode::TEST_CYCLE_REV2, &[]),
        CommandOutcome::Executed(1, 0)
    );
    runner.step();
    assert!(runner.controller().service_running());
}

#[test]
fn second_ticks_drive_keep_alive() {
    let mut runner = runner();
    runner.submit(opcode::CALIB_MODE, &[]);
    runner.step();
    let keep_alive = runner.controller().config().keep_alive_s;
    for _ in 0..keep_alive {
        runner.second_tick();
    }
    assert_eq!(runner.stats().second_ticks, u64::from(keep_alive));
    runner.step();
    assert_eq!(runner.controller().exec_mode(), ExecMode::Disable);
}

#[test]
fn bounded_run_stops_after_max_ticks() {
    let mut runner = runner();
    runner.schedule(0, opcode::COMMAND_MODE, &[]);
    let running = AtomicBool::new(true);
    runner.run(&running, Some(12)).unwrap();
    assert_eq!(runner.stats().cycle_count, 12);
    assert_eq!(runner.controller().tick_count(), 12);
    assert_eq!(runner.controller().exec_mode(), ExecMode::Command);
}

#[test]
fn cleared_flag_stops_immediately() {
    let mut runner = runner();
    let running = AtomicBool::new(false);
    runner.run(&running, None).unwrap();
    assert_eq!(runner.stats().cycle_count, 0);
}
