//! Runtime state and the mode supervisor.

pub mod context;
pub mod motor;
pub mod supervisor;
