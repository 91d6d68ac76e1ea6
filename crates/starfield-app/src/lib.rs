//! STARFIELD tick driver.
//!
//! Wires the simulation to a dedicated thread fed by channels, and owns
//! process-level concerns: configuration and tracing.

pub mod config;
pub mod game_loop;
pub mod state;
pub mod telemetry;

pub use starfield_core as core;
pub use starfield_sim as sim;
