//! Simulation engine for STARFIELD.
//!
//! Owns the authoritative world, runs the command, schedule and physics
//! phases at a fixed tick, and produces delta snapshots for replicas.

pub mod engine;
pub mod replication;
pub mod scheduler;
pub mod systems;
pub mod world_setup;

pub use engine::{Game, GameConfig, SpawnError};
pub use starfield_core as core;

#[cfg(test)]
mod tests;
