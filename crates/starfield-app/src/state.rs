//! Messages exchanged with the game loop thread.

use std::sync::mpsc;

use serde_json::{Map, Value};

use starfield_core::commands::Command;
use starfield_core::state::FullSnapshot;
use starfield_sim::SpawnError;

/// Reply to a join: the world as the new player should first see it.
pub type JoinReply = Result<FullSnapshot, SpawnError>;

/// Commands sent from the transport layer to the game loop thread.
#[derive(Debug)]
pub enum LoopCommand {
    /// Input for a player, applied on the next tick.
    Queue { id: String, commands: Vec<Command> },
    /// Add a human player; optional `data` seeds its fields.
    Join {
        id: String,
        data: Option<Map<String, Value>>,
        reply: mpsc::Sender<JoinReply>,
    },
    /// Remove a player.
    Leave { id: String },
    /// Ask for a full snapshot of the current world.
    RequestState { reply: mpsc::Sender<FullSnapshot> },
    /// Shut down the game loop thread gracefully.
    Shutdown,
}
