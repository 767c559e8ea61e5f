//! Integration test: config files on disk.

use std::io::Write;

use stage_common::config::{ConfigError, LogLevel};
use stage_common::motor::state::Axis;
use stage_control_unit::config::{StageConfig, load_config};
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn loads_full_file() {
    let file = write_config(
        r#"
[shared]
log_level = "debug"
service_name = "stage_bench"

[motors]
tick_period_us = 5000
keep_alive_s = 120
jog_power = 4

[motors.y]
travel_limit = 800
scale = { native = 5, tenths = 2 }

[motors.ramp]
thresholds = [900, 450, 350, 250, 150, 80, 40]

[protocol]
test_cycle_opcode = 9

[cycle]
stats_interval_s = 0
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.shared.log_level, LogLevel::Debug);
    assert_eq!(config.shared.service_name, "stage_bench");
    assert_eq!(config.motors.tick_period_us, 5000);
    assert_eq!(config.motors.keep_alive_s, 120);
    assert_eq!(config.motors.jog_power, 4);
    assert_eq!(config.motors.axis(Axis::Y).travel_limit, 800);
    assert_eq!(config.motors.axis(Axis::Y).travel_limit_native(), 2000);
    assert_eq!(config.motors.ramp.power_for(1000), 7);
    assert_eq!(config.motors.ramp.power_for(40), 0);
    assert_eq!(config.protocol.test_cycle_opcode, 9);
    assert_eq!(config.cycle.stats_interval_s, 0);
    // 1 s / 5 ms
    assert_eq!(config.motors.long_press_ticks(), 200);
}

#[test]
fn missing_file() {
    let err = load_config(std::path::Path::new("/nonexistent/stage_control_unit.toml")).unwrap_err();
    assert_eq!(err, ConfigError::FileNotFound);
}

#[test]
fn invalid_values_are_rejected() {
    let file = write_config("[motors.ramp]\nthresholds = [10, 20, 30, 40, 50, 60, 70]\n");
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::ValidationError(_))
    ));

    let file = write_config("[motors]\ntick_period_us = 500\n");
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn defaults_round_trip_through_toml() {
    let text = toml::to_string(&StageConfig::default()).unwrap();
    let file = write_config(&text);
    let config = load_config(file.path()).unwrap();
    assert_eq!(config.motors, StageConfig::default().motors);
    assert_eq!(config.protocol, StageConfig::default().protocol);
}
