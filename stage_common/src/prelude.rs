//! Prelude module for common re-exports.
//!
//! ```rust
//! use stage_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::motor::config::{AxisConfig, MotorConfig, RampConfig, ServiceConfig, UnitScale};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{SECOND_TICK_US, TICK_PERIOD_US};

// ─── Motor State ────────────────────────────────────────────────────
pub use crate::motor::error::{MoveError, StatusFlags};
pub use crate::motor::state::{
    ActivationMode, Axis, Button, Direction, ExecMode, ServiceCommand,
};

// ─── Protocol ───────────────────────────────────────────────────────
pub use crate::protocol::{
    CommandOutcome, ErrorCode, HostCommand, ProtocolReport, StatusRegisters,
};
