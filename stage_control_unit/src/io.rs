//! Leaf I/O components.
//!
//! Sensor sampling, driver pin patterns, keyboard snapshot and the buzzer
//! pattern generator. Workflows reach these only through the tick context.

pub mod driver;
pub mod indicator;
pub mod keyboard;
pub mod sensors;
