//! Controller configuration: TOML loading and validation.
//!
//! One file with four optional tables:
//!
//! ```toml
//! [shared]
//! log_level = "info"
//!
//! [motors]
//! tick_period_us = 7800
//! [motors.z]
//! travel_limit = 1000
//! scale = { native = 2, tenths = 1 }
//! min_power_minus = 2
//!
//! [protocol]
//! test_cycle_opcode = 8
//!
//! [cycle]
//! stats_interval_s = 10
//! ```
//!
//! Every table falls back to built-in defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use stage_common::config::{ConfigError, ConfigLoader, SharedConfig};
use stage_common::consts::SECOND_TICK_US;
use stage_common::motor::config::MotorConfig;
use stage_common::protocol::opcode;

// ─── Sections ───────────────────────────────────────────────────────

/// Host protocol revision settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Opcode of the service test-cycle command (8 or 9 by revision).
    pub test_cycle_opcode: u8,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            test_cycle_opcode: opcode::TEST_CYCLE_REV1,
        }
    }
}

/// Cycle runner settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Slow tick period [µs].
    pub second_tick_us: u32,
    /// Cycle statistics log interval [s]. 0 disables the log.
    pub stats_interval_s: u32,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            second_tick_us: SECOND_TICK_US,
            stats_interval_s: 10,
        }
    }
}

/// Complete controller configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub shared: SharedConfig,
    pub motors: MotorConfig,
    pub protocol: ProtocolConfig,
    pub cycle: CycleConfig,
}

impl StageConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.motors.validate().map_err(ConfigError::ValidationError)?;

        let op = self.protocol.test_cycle_opcode;
        if op != opcode::TEST_CYCLE_REV1 && op != opcode::TEST_CYCLE_REV2 {
            return Err(ConfigError::ValidationError(format!(
                "test_cycle_opcode {op} must be {} or {}",
                opcode::TEST_CYCLE_REV1,
                opcode::TEST_CYCLE_REV2
            )));
        }

        if self.cycle.second_tick_us <= self.motors.tick_period_us {
            return Err(ConfigError::ValidationError(format!(
                "second_tick_us {} must exceed tick_period_us {}",
                self.cycle.second_tick_us, self.motors.tick_period_us
            )));
        }
        Ok(())
    }
}

// ─── Loading ────────────────────────────────────────────────────────

/// Load and validate a controller config file.
pub fn load_config(path: &Path) -> Result<StageConfig, ConfigError> {
    let config = StageConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Parse and validate a controller config from a TOML string.
pub fn load_config_from_str(content: &str) -> Result<StageConfig, ConfigError> {
    let config = StageConfig::from_toml(content)?;
    config.validate()?;
    Ok(config)
}
