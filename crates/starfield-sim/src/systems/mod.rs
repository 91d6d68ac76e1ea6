//! Systems run by the simulation each tick.
//!
//! Systems are plain functions over the entity slice and the change sink.
//! They do not own state; all state lives in `Game`.

pub mod boundary;
pub mod cleanup;
pub mod collision;
pub mod commands;
pub mod physics;
