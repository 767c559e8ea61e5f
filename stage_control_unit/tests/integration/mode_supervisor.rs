//! Integration test: mode supervision.
//!
//! Validates deferred mode changes, per-mode output decision table,
//! Disable long-press entry into Calibration and the keep-alive exit.

use stage_common::motor::error::StatusFlags;
use stage_common::motor::state::{ActivationMode, Button, ExecMode};
use stage_control_unit::state::supervisor::ModeContext;
use stage_control_unit::workflow::service::ServiceWorkflow;

use super::{controller, enter, tick_until};

// ── Decision Table ──────────────────────────────────────────────────

#[test]
fn idle_modes_keep_driver_disabled() {
    let mut ctl = controller();
    for mode in [
        ExecMode::Disable,
        ExecMode::Command,
        ExecMode::Service,
        ExecMode::Calibration,
        ExecMode::Disable,
    ] {
        enter(&mut ctl, mode);
        for _ in 0..5 {
            ctl.tick();
            assert_eq!(ctl.state().activation, ActivationMode::Disabled, "{mode}");
            assert!(!ctl.hal().lines().driver_enable, "{mode}");
        }
        let general_enable = ctl.hal().lines().general_enable;
        match mode {
            ExecMode::Disable | ExecMode::Service => assert!(!general_enable, "{mode}"),
            ExecMode::Command | ExecMode::Calibration => assert!(general_enable, "{mode}"),
        }
        let keyboard_enable = ctl.hal().lines().keyboard_enable;
        assert_eq!(keyboard_enable, mode == ExecMode::Calibration, "{mode}");
    }
}

#[test]
fn status_register_tracks_mode_and_flags() {
    let mut ctl = controller();
    ctl.hal_mut().set_needle_disable(true);
    ctl.tick();
    assert_eq!(ctl.status().exec_mode(), Some(ExecMode::Disable));
    assert_eq!(
        ctl.status().flags(),
        StatusFlags::POWER_SWITCH | StatusFlags::NEEDLE_DISABLE
    );

    enter(&mut ctl, ExecMode::Calibration);
    assert_eq!(ctl.status().exec_mode(), Some(ExecMode::Calibration));
    assert!(ctl.status().flags().contains(StatusFlags::KEYBOARD_ENABLE));
    assert!(ctl.status().flags().contains(StatusFlags::GENERAL_ENABLE));
}

#[test]
fn mode_change_resets_sub_state() {
    let mut ctl = controller();
    enter(&mut ctl, ExecMode::Service);
    assert!(ctl.request_test_cycle());
    ctl.tick();
    assert!(ctl.service_running());

    enter(&mut ctl, ExecMode::Command);
    enter(&mut ctl, ExecMode::Service);
    assert!(!ctl.service_running());
    assert_eq!(
        ctl.mode(),
        &ModeContext::Service(ServiceWorkflow::default())
    );
}

#[test]
fn re_requesting_the_same_mode_resets_it() {
    let mut ctl = controller();
    enter(&mut ctl, ExecMode::Service);
    ctl.request_test_cycle();
    ctl.tick();
    enter(&mut ctl, ExecMode::Service);
    assert!(!ctl.service_running());
}

// ── Disable → Calibration ───────────────────────────────────────────

#[test]
fn long_press_enters_calibration_on_release() {
    let mut ctl = controller();
    let threshold = ctl.config().long_press_ticks();

    ctl.hal_mut().press(Button::ZMinus);
    for _ in 0..threshold {
        ctl.tick();
        assert!(!ctl.hal().buzzer());
    }
    ctl.tick();
    assert!(ctl.hal().buzzer(), "armed long press sounds the buzzer");

    // Holding longer changes nothing.
    for _ in 0..50 {
        ctl.tick();
        assert_eq!(ctl.exec_mode(), ExecMode::Disable);
        assert_eq!(ctl.state().activation, ActivationMode::Disabled);
    }

    ctl.hal_mut().release_all();
    ctl.tick();
    assert_eq!(ctl.exec_mode(), ExecMode::Calibration);
    assert!(!ctl.hal().buzzer());
    assert_eq!(ctl.state().keep_alive, 60);
}

#[test]
fn short_press_stays_in_disable() {
    let mut ctl = controller();
    ctl.hal_mut().press(Button::XPlus);
    for _ in 0..100 {
        ctl.tick();
    }
    ctl.hal_mut().release_all();
    for _ in 0..5 {
        ctl.tick();
    }
    assert_eq!(ctl.exec_mode(), ExecMode::Disable);
}

// ── Keep-Alive ──────────────────────────────────────────────────────

#[test]
fn calibration_times_out_to_disable() {
    let mut ctl = controller();
    enter(&mut ctl, ExecMode::Calibration);
    assert_eq!(ctl.state().keep_alive, 60);

    for second in 1..=60u16 {
        for _ in 0..128 {
            ctl.tick();
        }
        assert_eq!(ctl.exec_mode(), ExecMode::Calibration, "second {second}");
        ctl.tick_seconds();
    }
    assert_eq!(ctl.state().keep_alive, 0);

    let ticks = tick_until(&mut ctl, 2, |c| c.exec_mode() == ExecMode::Disable);
    assert_eq!(ticks, Some(1));
    assert!(!ctl.hal().lines().general_enable);
}

#[test]
fn key_activity_keeps_calibration_alive() {
    let mut ctl = controller();
    enter(&mut ctl, ExecMode::Calibration);
    for _ in 0..59 {
        ctl.tick_seconds();
    }
    ctl.hal_mut().press(Button::YPlus);
    ctl.tick();
    ctl.hal_mut().release_all();
    assert_eq!(ctl.state().keep_alive, 60);
    ctl.tick_seconds();
    for _ in 0..200 {
        ctl.tick();
    }
    assert_eq!(ctl.exec_mode(), ExecMode::Calibration);
}
