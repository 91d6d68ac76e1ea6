//! Core types and definitions for the STARFIELD simulation.
//!
//! This crate defines the vocabulary shared by the authoritative server and
//! its replicas: vector math, the entity model, commands, the delta tracker,
//! events and the wire snapshot types. It has no dependency on any runtime,
//! thread or transport.

pub mod commands;
pub mod constants;
pub mod delta;
pub mod entity;
pub mod enums;
pub mod events;
pub mod state;
pub mod vector;

pub use entity::{Entity, EntityBase, EntityRegistry};
pub use vector::Vec3;
